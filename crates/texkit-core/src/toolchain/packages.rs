//! Package management inside an installed MiKTeX distribution.
//!
//! Everything here is best-effort: the result of every operation is an
//! [`InstallStatus`], and failures are logged rather than propagated.

use crate::env::Environment;
use crate::process::ProcessRunner;
use log::{info, warn};

/// The state of a package-level operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallState {
    /// The operation completed successfully.
    Complete,
    /// The tool ran and failed (see [`InstallStatus::message`]).
    Failed,
    /// The MiKTeX tool needed for the operation was not found.
    Unknown,
}

/// The result of a package operation.
#[derive(Debug, Clone)]
pub struct InstallStatus {
    /// Package name, or a label such as `auto-install` for configuration steps.
    pub name: String,
    pub state: InstallState,
    /// Diagnostic output, typically set when `state` is not `Complete`.
    pub message: Option<String>,
}

impl InstallStatus {
    pub fn is_complete(&self) -> bool {
        self.state == InstallState::Complete
    }
}

/// Wraps MiKTeX's `initexmf` and `mpm` for the post-install steps.
pub struct MiktexPackages<'a> {
    env: &'a Environment,
    runner: &'a dyn ProcessRunner,
}

impl<'a> MiktexPackages<'a> {
    pub fn new(env: &'a Environment, runner: &'a dyn ProcessRunner) -> Self {
        Self { env, runner }
    }

    /// Lets MiKTeX fetch missing packages on demand without prompting.
    pub fn enable_auto_install(&self) -> InstallStatus {
        self.run_tool(
            "auto-install",
            "initexmf",
            &["--set-config-value=[MPM]AutoInstall=1".to_string()],
        )
    }

    pub fn update_database(&self) -> InstallStatus {
        self.run_tool("package-database", "mpm", &["--update-db".to_string()])
    }

    pub fn install(&self, package: &str) -> InstallStatus {
        // mpm --install=<package>
        self.run_tool(package, "mpm", &[format!("--install={}", package)])
    }

    fn run_tool(&self, name: &str, tool: &str, args: &[String]) -> InstallStatus {
        let Some(program) = self.env.find_executable(tool) else {
            warn!("{} not found, skipping {}", tool, name);
            return InstallStatus {
                name: name.to_string(),
                state: InstallState::Unknown,
                message: Some(format!("{} not found", tool)),
            };
        };

        let invocation = self.env.invocation(program).args(args.iter().cloned());
        match self.runner.run(&invocation) {
            Ok(output) if output.success() => {
                info!("{}: ok", name);
                InstallStatus {
                    name: name.to_string(),
                    state: InstallState::Complete,
                    message: None,
                }
            }
            Ok(output) => {
                warn!("{} failed for {} (exit code {})", tool, name, output.exit_code);
                InstallStatus {
                    name: name.to_string(),
                    state: InstallState::Failed,
                    message: Some(output.stderr),
                }
            }
            Err(e) => {
                warn!("{} failed for {}: {}", tool, name, e);
                InstallStatus {
                    name: name.to_string(),
                    state: InstallState::Failed,
                    message: Some(e.to_string()),
                }
            }
        }
    }
}
