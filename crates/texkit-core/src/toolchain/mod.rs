//! Toolchain resolution: make `pdflatex` and `latexmk` reachable.
//!
//! ## Overview
//!
//! [`ToolchainResolver::ensure_toolchain`] probes the [`Environment`] search
//! path for the two required executables. When either is missing it installs
//! MiKTeX with the first available [`InstallMethod`]:
//!
//! ```text
//! winget present? ──yes──► winget install MiKTeX.MiKTeX
//!       │no
//! choco present?  ──yes──► choco install miktex
//!       │no
//!       └────────────────► download miktexsetup, run download + install
//! ```
//!
//! After installing it prepends the MiKTeX bin directory to the search path
//! and probes again. There is no retry across methods: the first selected
//! method either succeeds or the whole setup fails.
//!
//! Post-install package configuration lives in [`packages`] and never fails
//! the setup.

use crate::config::InstallConfig;
use crate::env::Environment;
use crate::error::InstallError;
use crate::layout::ProjectLayout;
use crate::process::{ProcessRunner, SystemRunner};
use log::{debug, info, warn};
use std::path::PathBuf;
use std::sync::Arc;

pub mod packages;
pub mod standalone;

pub use packages::{InstallState, InstallStatus, MiktexPackages};
pub use standalone::{Fetcher, HttpFetcher, StandaloneInstaller};

pub const BASE_COMPILER: &str = "pdflatex";
pub const DRIVER_TOOL: &str = "latexmk";
pub const REQUIRED_TOOLS: [&str; 2] = [BASE_COMPILER, DRIVER_TOOL];

/// How MiKTeX gets onto the machine, in priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallMethod {
    Winget,
    Chocolatey,
    Standalone,
}

impl InstallMethod {
    pub const PRIORITY: [InstallMethod; 3] = [
        InstallMethod::Winget,
        InstallMethod::Chocolatey,
        InstallMethod::Standalone,
    ];

    /// Executable that must be on the search path for this method to apply.
    /// `None` means the method has no precondition.
    pub fn manager_executable(self) -> Option<&'static str> {
        match self {
            InstallMethod::Winget => Some("winget"),
            InstallMethod::Chocolatey => Some("choco"),
            InstallMethod::Standalone => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            InstallMethod::Winget => "winget",
            InstallMethod::Chocolatey => "chocolatey",
            InstallMethod::Standalone => "standalone download",
        }
    }
}

impl std::fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Picks the first method in [`InstallMethod::PRIORITY`] whose manager is present.
pub fn select_install_method(is_present: impl Fn(&str) -> bool) -> InstallMethod {
    InstallMethod::PRIORITY
        .into_iter()
        .find(|method| method.manager_executable().map_or(true, |exe| is_present(exe)))
        .unwrap_or(InstallMethod::Standalone)
}

/// Which of the required tools are missing right now.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolchainState {
    pub missing: Vec<String>,
}

impl ToolchainState {
    pub fn probe(env: &Environment) -> Self {
        let missing = REQUIRED_TOOLS
            .iter()
            .filter(|tool| !env.has_executable(tool))
            .map(|tool| tool.to_string())
            .collect();
        Self { missing }
    }

    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

/// What [`ToolchainResolver::ensure_toolchain`] had to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolchainOutcome {
    /// Both tools were already reachable; nothing was run.
    AlreadyPresent,
    Installed {
        method: InstallMethod,
        /// Bin directory added to the search path, if one was found.
        bin_dir: Option<PathBuf>,
    },
}

pub struct ToolchainResolver {
    config: InstallConfig,
    layout: ProjectLayout,
    runner: Arc<dyn ProcessRunner>,
    fetcher: Arc<dyn Fetcher>,
}

impl ToolchainResolver {
    pub fn new(config: InstallConfig, layout: ProjectLayout) -> Self {
        Self {
            config,
            layout,
            runner: Arc::new(SystemRunner),
            fetcher: Arc::new(HttpFetcher),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn with_fetcher(mut self, fetcher: Arc<dyn Fetcher>) -> Self {
        self.fetcher = fetcher;
        self
    }

    /// Makes sure `pdflatex` and `latexmk` are on `env`'s search path,
    /// installing MiKTeX if needed.
    ///
    /// # Errors
    ///
    /// - [`InstallError::ManagerFailed`] if winget/choco fail
    /// - [`InstallError::StandaloneFailed`] if the portable setup fails
    /// - [`InstallError::VerificationFailed`] if the tools are still missing afterwards
    pub fn ensure_toolchain(
        &self,
        env: &mut Environment,
    ) -> Result<ToolchainOutcome, InstallError> {
        let state = ToolchainState::probe(env);
        if state.is_complete() {
            info!("LaTeX toolchain already available");
            return Ok(ToolchainOutcome::AlreadyPresent);
        }
        info!("Missing tools: {}", state.missing.join(", "));

        let method = select_install_method(|exe| env.has_executable(exe));
        info!("Installing MiKTeX via {}", method);
        self.install(method, env)?;

        let bin_dir = self.register_bin_dir(env);

        let state = ToolchainState::probe(env);
        if !state.is_complete() {
            return Err(InstallError::VerificationFailed {
                missing: state.missing,
                bin_dir,
            });
        }

        info!("MiKTeX installed via {}", method);
        Ok(ToolchainOutcome::Installed { method, bin_dir })
    }

    /// Best-effort: enable on-the-fly package installs and fetch the
    /// auxiliary packages. Failures are logged and returned, never raised.
    pub fn configure_packages(&self, env: &Environment) -> Vec<InstallStatus> {
        let packages = MiktexPackages::new(env, self.runner.as_ref());
        let mut statuses = vec![packages.enable_auto_install(), packages.update_database()];
        for package in &self.config.auxiliary_packages {
            statuses.push(packages.install(package));
        }
        statuses
    }

    /// First existing MiKTeX bin directory, 64-bit subpath preferred per root.
    pub fn find_bin_dir(&self, env: &Environment) -> Option<PathBuf> {
        let mut roots = env.install_roots.clone();
        roots.push(self.layout.portable_install_root());

        roots.iter().find_map(|root| {
            let bin = root.join("miktex").join("bin");
            [bin.join("x64"), bin].into_iter().find(|dir| dir.is_dir())
        })
    }

    /// Puts an existing MiKTeX bin directory on the search path when the tools
    /// are not reachable yet, e.g. after a `setup` whose PATH change this
    /// process did not inherit. Never installs anything.
    pub fn adopt_existing_install(&self, env: &mut Environment) -> Option<PathBuf> {
        if ToolchainState::probe(env).is_complete() {
            return None;
        }
        let dir = self.find_bin_dir(env)?;
        debug!("Using existing MiKTeX install at {:?}", dir);
        env.prepend_search_path(&dir);
        Some(dir)
    }

    fn register_bin_dir(&self, env: &mut Environment) -> Option<PathBuf> {
        match self.find_bin_dir(env) {
            Some(dir) => {
                info!("Adding {:?} to search path", dir);
                env.prepend_search_path(&dir);
                Some(dir)
            }
            None => {
                warn!("No MiKTeX bin directory found after install");
                None
            }
        }
    }

    fn install(&self, method: InstallMethod, env: &Environment) -> Result<(), InstallError> {
        match method {
            InstallMethod::Winget => self.run_manager(
                env,
                "winget",
                vec![
                    "install".to_string(),
                    "--id".to_string(),
                    self.config.winget_id.clone(),
                    "--exact".to_string(),
                    "--silent".to_string(),
                    "--accept-package-agreements".to_string(),
                    "--accept-source-agreements".to_string(),
                ],
            ),
            InstallMethod::Chocolatey => self.run_manager(
                env,
                "choco",
                vec![
                    "install".to_string(),
                    self.config.choco_package.clone(),
                    "-y".to_string(),
                    "--no-progress".to_string(),
                ],
            ),
            InstallMethod::Standalone => {
                StandaloneInstaller::new(&self.config, self.runner.as_ref(), self.fetcher.as_ref())
                    .install(env, &self.layout.portable)
            }
        }
    }

    fn run_manager(
        &self,
        env: &Environment,
        manager: &'static str,
        args: Vec<String>,
    ) -> Result<(), InstallError> {
        let program = env
            .find_executable(manager)
            .ok_or_else(|| InstallError::ManagerFailed {
                manager,
                reason: "not found on the search path".to_string(),
            })?;

        let invocation = env.invocation(program).args(args);
        let output = self
            .runner
            .run(&invocation)
            .map_err(|e| InstallError::ManagerFailed {
                manager,
                reason: e.to_string(),
            })?;

        if !output.success() {
            return Err(InstallError::ManagerFailed {
                manager,
                reason: format!("exit code {}", output.exit_code),
            });
        }
        Ok(())
    }
}
