use std::path::PathBuf;
use thiserror::Error;

/// The host does not match the platform texkit provisions for.
#[derive(Debug, Error)]
#[error("unsupported environment: running on '{os}', texkit requires '{required}'")]
pub struct EnvironmentUnsupported {
    pub os: String,
    pub required: String,
}

/// Provisioning of the LaTeX toolchain failed.
///
/// All variants are fatal to `texkit setup`. Use [`InstallError::hint`] to get a
/// remediation message suitable for the user.
#[derive(Debug, Error)]
pub enum InstallError {
    /// A system package manager exited non-zero or could not be spawned.
    #[error("{manager} failed to install MiKTeX: {reason}")]
    ManagerFailed { manager: &'static str, reason: String },

    /// The portable download/setup path failed at some stage.
    #[error("standalone MiKTeX setup failed during {stage}: {reason}")]
    StandaloneFailed { stage: &'static str, reason: String },

    /// Installation reported success but the executables are still not reachable.
    #[error(
        "MiKTeX was installed but {} could not be found on the search path",
        .missing.join(", ")
    )]
    VerificationFailed {
        missing: Vec<String>,
        /// Bin directory that was added to the search path, if any was found.
        bin_dir: Option<PathBuf>,
    },
}

pub const MANUAL_INSTALL_URL: &str = "https://miktex.org/download";

impl InstallError {
    /// Human-readable remediation for the failure.
    pub fn hint(&self) -> String {
        match self {
            InstallError::VerificationFailed {
                bin_dir: Some(dir), ..
            } => format!(
                "Add '{}' to your PATH manually and open a new terminal.",
                dir.display()
            ),
            InstallError::VerificationFailed { bin_dir: None, .. } => format!(
                "Add the MiKTeX 'miktex\\bin\\x64' directory to your PATH manually, \
                 or reinstall from {}.",
                MANUAL_INSTALL_URL
            ),
            _ => format!("Install MiKTeX manually from {}.", MANUAL_INSTALL_URL),
        }
    }
}
