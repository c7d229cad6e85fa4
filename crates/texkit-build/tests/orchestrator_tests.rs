use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use texkit_build::{BuildError, BuildRequest, BuildStrategy, Orchestrator};
use texkit_core::config::{BuildConfig, LayoutConfig};
use texkit_core::process::Invocation;
use texkit_core::testing::{exit, stdout, touch_executable, ScriptedRunner};
use texkit_core::{Environment, ProjectLayout};

const HEALTHY: &str = "Latexmk, John Collins, 4 Apr. 2024. Version 4.85\n";
const NO_PERL: &str =
    "MiKTeX could not find the script engine 'perl' which is required to execute 'latexmk'.\n";

struct Project {
    _dir: tempfile::TempDir,
    env: Environment,
    layout: ProjectLayout,
    bin: PathBuf,
    source: PathBuf,
}

impl Project {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("project");
        let bin = dir.path().join("miktex").join("bin").join("x64");
        touch_executable(&bin, "pdflatex");

        let layout = ProjectLayout::new(&root, &LayoutConfig::default());
        fs::create_dir_all(&layout.src).unwrap();
        let source = layout.src.join("doc.tex");
        fs::write(&source, "\\documentclass{article}\\begin{document}x\\end{document}").unwrap();

        let env = Environment {
            os: "windows".to_string(),
            search_path: vec![bin.clone()],
            temp_dir: dir.path().join("tmp"),
            base_dir: root,
            install_roots: Vec::new(),
        };

        Self {
            _dir: dir,
            env,
            layout,
            bin,
            source,
        }
    }

    fn with_latexmk(self) -> Self {
        touch_executable(&self.bin, "latexmk");
        self
    }

    fn orchestrator(&self, runner: Arc<ScriptedRunner>) -> Orchestrator {
        Orchestrator::new(self.layout.clone(), BuildConfig::default()).with_runner(runner)
    }
}

fn is_version_check(inv: &Invocation) -> bool {
    inv.args == ["--version"]
}

/// Simulates an engine run: writes a log and a few intermediates into the build dir.
fn emit_artifacts(build: &Path, log_lines: usize) {
    let log: String = (1..=log_lines).map(|i| format!("log line {}\n", i)).collect();
    fs::write(build.join("doc.log"), log).unwrap();
    fs::write(build.join("doc.aux"), "\\relax").unwrap();
    fs::write(build.join("doc.fls"), "").unwrap();
    fs::write(build.join("doc.pdf"), "%PDF").unwrap();
}

fn build_dir_names(layout: &ProjectLayout) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(&layout.build)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[test]
fn test_missing_source_runs_nothing() {
    let project = Project::new().with_latexmk();
    let runner = Arc::new(ScriptedRunner::succeeding());
    let orchestrator = project.orchestrator(runner.clone());

    let err = orchestrator
        .build(&project.env, &BuildRequest::new("src/missing.tex"))
        .unwrap_err();

    assert!(matches!(err, BuildError::SourceNotFound(ref p) if p.ends_with("src/missing.tex")));
    assert!(runner.calls().is_empty());
    assert!(!project.layout.build.exists());
}

#[test]
fn test_healthy_driver_runs_latexmk_once() {
    let project = Project::new().with_latexmk();
    let build = project.layout.build.clone();
    let runner = Arc::new(ScriptedRunner::new(move |inv| {
        if is_version_check(inv) {
            return Ok(stdout(HEALTHY));
        }
        emit_artifacts(&build, 5);
        Ok(exit(0))
    }));
    let orchestrator = project.orchestrator(runner.clone());

    let report = orchestrator
        .build(&project.env, &BuildRequest::new(&project.source))
        .unwrap();

    assert_eq!(report.strategy, BuildStrategy::DriverTool);
    assert_eq!(report.exit_code, 0);
    assert_eq!(report.output, project.layout.build.join("doc.pdf"));
    assert_eq!(report.log_path, Some(project.layout.logs.join("doc.log")));

    let compiles: Vec<_> = runner
        .calls_to("latexmk")
        .into_iter()
        .filter(|inv| !is_version_check(inv))
        .collect();
    assert_eq!(compiles.len(), 1);
    let outdir = format!("-outdir={}", project.layout.build.display());
    assert!(compiles[0].args.contains(&outdir));
    assert_eq!(compiles[0].args.last().unwrap(), "doc.tex");
    assert_eq!(compiles[0].cwd.as_deref(), Some(project.layout.src.as_path()));
    assert!(runner.calls_to("pdflatex").is_empty());

    assert_eq!(build_dir_names(&project.layout), vec!["doc.pdf"]);
    assert!(project.layout.logs.join("doc.log").is_file());
}

#[test]
fn test_unhealthy_driver_falls_back_to_two_identical_passes() {
    let project = Project::new().with_latexmk();
    let runner = Arc::new(ScriptedRunner::new(|inv| {
        if is_version_check(inv) {
            return Ok(stdout(NO_PERL));
        }
        Ok(exit(0))
    }));
    let orchestrator = project.orchestrator(runner.clone());

    let report = orchestrator
        .build(&project.env, &BuildRequest::new("src/doc.tex"))
        .unwrap();
    assert_eq!(report.strategy, BuildStrategy::DirectTwoPass);

    let passes = runner.calls_to("pdflatex");
    assert_eq!(passes.len(), 2);
    assert_eq!(passes[0], passes[1]);
    let outdir = format!("-output-directory={}", project.layout.build.display());
    assert!(passes[0].args.contains(&outdir));

    // Only the health check touched latexmk.
    assert_eq!(runner.calls_to("latexmk").len(), 1);
}

#[test]
fn test_missing_driver_skips_health_check() {
    let project = Project::new();
    let runner = Arc::new(ScriptedRunner::succeeding());
    let orchestrator = project.orchestrator(runner.clone());

    let report = orchestrator
        .build(&project.env, &BuildRequest::new(&project.source))
        .unwrap();
    assert_eq!(report.strategy, BuildStrategy::DirectTwoPass);
    assert!(runner.calls_to("latexmk").is_empty());
    assert_eq!(runner.calls_to("pdflatex").len(), 2);
    assert!(report.log_path.is_none());
}

#[test]
fn test_failure_reports_last_twenty_log_lines() {
    let project = Project::new();
    let build = project.layout.build.clone();
    let runner = Arc::new(ScriptedRunner::new(move |_| {
        emit_artifacts(&build, 30);
        Ok(exit(1))
    }));
    let orchestrator = project.orchestrator(runner.clone());

    let err = orchestrator
        .build(&project.env, &BuildRequest::new(&project.source))
        .unwrap_err();

    match err {
        BuildError::CompilationFailed {
            exit_code,
            log_path,
            log_tail,
        } => {
            assert_eq!(exit_code, 1);
            assert_eq!(log_path, Some(project.layout.logs.join("doc.log")));
            let expected: Vec<String> = (11..=30).map(|i| format!("log line {}", i)).collect();
            assert_eq!(log_tail, expected);
        }
        other => panic!("expected compilation failure, got {:?}", other),
    }

    // Both passes still ran, and cleanup happened on the failure path too.
    assert_eq!(runner.calls_to("pdflatex").len(), 2);
    assert_eq!(build_dir_names(&project.layout), vec!["doc.pdf"]);
}

#[test]
fn test_failure_without_log_has_empty_tail() {
    let project = Project::new();
    let runner = Arc::new(ScriptedRunner::new(|_| Ok(exit(1))));
    let orchestrator = project.orchestrator(runner);

    let err = orchestrator
        .build(&project.env, &BuildRequest::new(&project.source))
        .unwrap_err();
    assert!(matches!(
        err,
        BuildError::CompilationFailed { log_path: None, ref log_tail, .. } if log_tail.is_empty()
    ));
}

#[test]
fn test_missing_compiler_is_reported_before_any_run() {
    let mut project = Project::new();
    project.env.search_path.clear();
    let runner = Arc::new(ScriptedRunner::succeeding());
    let orchestrator = project.orchestrator(runner.clone());

    let err = orchestrator
        .build(&project.env, &BuildRequest::new(&project.source))
        .unwrap_err();
    assert!(matches!(err, BuildError::ToolchainMissing(ref tool) if tool == "pdflatex"));
    assert!(runner.calls().is_empty());
}

#[test]
fn test_spawn_failure_is_recoverable() {
    let project = Project::new();
    let runner = Arc::new(ScriptedRunner::new(|_| anyhow::bail!("access denied")));
    let orchestrator = project.orchestrator(runner.clone());

    let err = orchestrator
        .build(&project.env, &BuildRequest::new(&project.source))
        .unwrap_err();
    assert!(matches!(err, BuildError::Process(_)));
    assert!(err.to_string().contains("access denied"));

    // The orchestrator is still usable afterwards.
    let runner_ok = Arc::new(ScriptedRunner::succeeding());
    let again = project
        .orchestrator(runner_ok)
        .build(&project.env, &BuildRequest::new(&project.source));
    assert!(again.is_ok());
}

#[test]
fn test_relative_layout_is_anchored_at_base_dir() {
    let project = Project::new();
    let relative = ProjectLayout::new(Path::new(""), &LayoutConfig::default());
    assert!(relative.build.is_relative());

    let build = project.layout.build.clone();
    let runner = Arc::new(ScriptedRunner::new(move |_| {
        emit_artifacts(&build, 5);
        Ok(exit(0))
    }));
    let orchestrator =
        Orchestrator::new(relative, BuildConfig::default()).with_runner(runner.clone());

    let report = orchestrator
        .build(&project.env, &BuildRequest::new("src/doc.tex"))
        .unwrap();

    let passes = runner.calls_to("pdflatex");
    let outdir = passes[0]
        .args
        .iter()
        .find_map(|arg| arg.strip_prefix("-output-directory="))
        .unwrap();
    assert!(Path::new(outdir).is_absolute());
    assert_eq!(Path::new(outdir), project.layout.build);

    // The directory the compiler wrote to is the one reported and tidied.
    assert_eq!(report.output, project.layout.build.join("doc.pdf"));
    assert_eq!(report.log_path, Some(project.layout.logs.join("doc.log")));
    assert_eq!(build_dir_names(&project.layout), vec!["doc.pdf"]);
}
