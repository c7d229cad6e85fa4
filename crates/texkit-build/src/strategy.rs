use crate::BuildStrategy;
use log::{debug, warn};
use texkit_core::process::ProcessRunner;
use texkit_core::toolchain::DRIVER_TOOL;
use texkit_core::Environment;

/// Chooses `latexmk` when it is installed and can find its Perl runtime,
/// otherwise falls back to running `pdflatex` twice.
pub fn select_strategy(
    env: &Environment,
    runner: &dyn ProcessRunner,
    absence_marker: &str,
) -> BuildStrategy {
    let Some(latexmk) = env.find_executable(DRIVER_TOOL) else {
        warn!("latexmk not found; falling back to two pdflatex passes");
        return BuildStrategy::DirectTwoPass;
    };

    let invocation = env.invocation(latexmk).arg("--version");
    match runner.run(&invocation) {
        Ok(output) if !output.success() => {
            warn!(
                "latexmk --version exited with code {}; falling back to two pdflatex passes",
                output.exit_code
            );
            BuildStrategy::DirectTwoPass
        }
        Ok(output) if driver_is_healthy(&output.combined(), absence_marker) => {
            debug!("latexmk healthy: {}", output.stdout.lines().next().unwrap_or_default());
            BuildStrategy::DriverTool
        }
        Ok(_) => {
            warn!("latexmk cannot find its Perl runtime; falling back to two pdflatex passes");
            BuildStrategy::DirectTwoPass
        }
        Err(e) => {
            warn!("latexmk --version failed ({}); falling back to two pdflatex passes", e);
            BuildStrategy::DirectTwoPass
        }
    }
}

/// `false` if the version output contains the marker (case-insensitive).
pub fn driver_is_healthy(version_output: &str, absence_marker: &str) -> bool {
    !version_output
        .to_lowercase()
        .contains(&absence_marker.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use texkit_core::testing::{exit, stdout, touch_executable, ScriptedRunner};

    const MARKER: &str = "could not find the script engine";

    #[test]
    fn test_healthy_version_output() {
        let out = "Latexmk, John Collins, 4 Apr. 2024. Version 4.85";
        assert!(driver_is_healthy(out, MARKER));
    }

    #[test]
    fn test_missing_perl_detected_case_insensitively() {
        let out = "MiKTeX Could Not Find The Script Engine 'perl' \
                   which is required to execute 'latexmk'.";
        assert!(!driver_is_healthy(out, MARKER));
    }

    fn env_with_latexmk(dir: &tempfile::TempDir) -> Environment {
        let bin = dir.path().join("bin");
        touch_executable(&bin, "latexmk");
        Environment {
            os: "windows".to_string(),
            search_path: vec![bin],
            temp_dir: dir.path().join("tmp"),
            base_dir: PathBuf::from(dir.path()),
            install_roots: Vec::new(),
        }
    }

    #[test]
    fn test_healthy_driver_is_selected() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with_latexmk(&dir);
        let runner = ScriptedRunner::new(|_| Ok(stdout("Latexmk, John Collins. Version 4.85\n")));

        assert_eq!(select_strategy(&env, &runner, MARKER), BuildStrategy::DriverTool);
        assert_eq!(runner.calls_to("latexmk")[0].args, vec!["--version"]);
    }

    #[test]
    fn test_nonzero_version_check_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with_latexmk(&dir);
        let runner = ScriptedRunner::new(|_| Ok(exit(1)));

        assert_eq!(select_strategy(&env, &runner, MARKER), BuildStrategy::DirectTwoPass);
    }

    #[test]
    fn test_unrunnable_driver_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        let env = env_with_latexmk(&dir);
        let runner = ScriptedRunner::new(|_| anyhow::bail!("not a valid Win32 application"));

        assert_eq!(select_strategy(&env, &runner, MARKER), BuildStrategy::DirectTwoPass);
        assert_eq!(runner.calls().len(), 1);
    }
}
