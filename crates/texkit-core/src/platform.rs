use crate::env::Environment;
use crate::error::EnvironmentUnsupported;

/// Gate for the whole flow: nothing may be scaffolded, installed or built on
/// a host other than `required_os`.
pub fn check_platform(env: &Environment, required_os: &str) -> Result<(), EnvironmentUnsupported> {
    if env.os.eq_ignore_ascii_case(required_os) {
        Ok(())
    } else {
        Err(EnvironmentUnsupported {
            os: env.os.clone(),
            required: required_os.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn env_on(os: &str) -> Environment {
        Environment {
            os: os.to_string(),
            search_path: Vec::new(),
            temp_dir: PathBuf::from("/tmp"),
            base_dir: PathBuf::from("/proj"),
            install_roots: Vec::new(),
        }
    }

    #[test]
    fn test_matching_platform_passes() {
        assert!(check_platform(&env_on("windows"), "windows").is_ok());
    }

    #[test]
    fn test_other_platform_is_rejected() {
        let err = check_platform(&env_on("linux"), "windows").unwrap_err();
        assert_eq!(err.os, "linux");
        assert_eq!(err.required, "windows");
    }
}
