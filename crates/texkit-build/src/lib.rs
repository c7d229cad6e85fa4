//! # texkit Build
//!
//! Compiles a single LaTeX document with whatever the installed toolchain
//! supports, then tidies the build directory.
//!
//! ## Flow
//!
//! ```text
//! BuildRequest ─► source exists? ─► select_strategy ─► compiler::plan ─► run passes
//!                                     │                                    │
//!                     latexmk healthy? DriverTool                          ▼
//!                     otherwise        DirectTwoPass (pdflatex x2)   artifacts::tidy
//!                                                                          │
//!                                                   BuildReport / BuildError ◄┘
//! ```
//!
//! A failed compilation is an ordinary `Err(BuildError::CompilationFailed)`
//! carrying the tail of the log, so long-running callers such as the watch
//! loop keep going.

use log::{info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use texkit_core::config::BuildConfig;
use texkit_core::process::{ProcessRunner, SystemRunner};
use texkit_core::toolchain::BASE_COMPILER;
use texkit_core::{Environment, ProjectLayout};
use thiserror::Error;

pub mod artifacts;
pub mod compiler;
pub mod strategy;

pub use compiler::CompilePass;
pub use strategy::select_strategy;

/// A document to compile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildRequest {
    /// Absolute, or relative to the environment's base directory.
    pub source: PathBuf,
}

impl BuildRequest {
    pub fn new(source: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
        }
    }
}

/// How the document gets compiled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BuildStrategy {
    /// One `latexmk` run, which reruns the engine itself as needed.
    DriverTool,
    /// `pdflatex` run twice unconditionally.
    DirectTwoPass,
}

impl std::fmt::Display for BuildStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BuildStrategy::DriverTool => f.write_str("latexmk"),
            BuildStrategy::DirectTwoPass => f.write_str("pdflatex (two passes)"),
        }
    }
}

/// A successful build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub strategy: BuildStrategy,
    pub exit_code: i32,
    /// Expected PDF: `<build>/<stem>.pdf`.
    pub output: PathBuf,
    /// Relocated log, if the compiler wrote one.
    pub log_path: Option<PathBuf>,
}

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("source document not found: {}", .0.display())]
    SourceNotFound(PathBuf),

    #[error("{0} not found on the search path; run `texkit setup` first")]
    ToolchainMissing(String),

    #[error("compilation failed with exit code {exit_code}")]
    CompilationFailed {
        exit_code: i32,
        log_path: Option<PathBuf>,
        /// Last lines of the log, oldest first. Empty if there was no log.
        log_tail: Vec<String>,
    },

    #[error("failed to run compiler: {0:#}")]
    Process(anyhow::Error),

    #[error("failed to prepare output directories: {0}")]
    Io(#[from] std::io::Error),
}

pub struct Orchestrator {
    layout: ProjectLayout,
    config: BuildConfig,
    runner: Arc<dyn ProcessRunner>,
}

impl Orchestrator {
    pub fn new(layout: ProjectLayout, config: BuildConfig) -> Self {
        Self {
            layout,
            config,
            runner: Arc::new(SystemRunner),
        }
    }

    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn layout(&self) -> &ProjectLayout {
        &self.layout
    }

    /// Compiles `request.source` into the build directory.
    ///
    /// Relative layout directories are anchored at `env.base_dir`; the
    /// compiler only ever sees absolute output paths.
    ///
    /// Nothing is run and no directory is created when the source is missing.
    pub fn build(
        &self,
        env: &Environment,
        request: &BuildRequest,
    ) -> Result<BuildReport, BuildError> {
        let source = anchor(env, &request.source)?;
        if !source.is_file() {
            return Err(BuildError::SourceNotFound(source));
        }

        // Re-probe instead of trusting an earlier setup run.
        if !env.has_executable(BASE_COMPILER) {
            return Err(BuildError::ToolchainMissing(BASE_COMPILER.to_string()));
        }

        let build_dir = anchor(env, &self.layout.build)?;
        let logs_dir = anchor(env, &self.layout.logs)?;
        std::fs::create_dir_all(&build_dir)?;
        std::fs::create_dir_all(&logs_dir)?;

        let marker = &self.config.driver_absence_marker;
        let strategy = select_strategy(env, self.runner.as_ref(), marker);
        info!("Building {:?} with {}", source, strategy);

        let result = compiler::plan(strategy, env, &source, &build_dir)
            .and_then(|passes| self.run_passes(&passes));

        artifacts::tidy(&build_dir, &logs_dir, &self.config);
        let exit_code = result?;

        let stem = source
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let log_path = logs_dir.join(format!("{}.{}", stem, self.config.log_extension));
        let log_path = log_path.is_file().then_some(log_path);

        if exit_code != 0 {
            let log_tail = match &log_path {
                Some(path) => artifacts::tail_lines(path, self.config.log_tail_lines)
                    .unwrap_or_else(|e| {
                        warn!("Could not read {:?}: {}", path, e);
                        Vec::new()
                    }),
                None => Vec::new(),
            };
            return Err(BuildError::CompilationFailed {
                exit_code,
                log_path,
                log_tail,
            });
        }

        Ok(BuildReport {
            strategy,
            exit_code,
            output: build_dir.join(format!("{}.pdf", stem)),
            log_path,
        })
    }

    /// Runs every pass and returns the exit code of the last one.
    fn run_passes(&self, passes: &[CompilePass]) -> Result<i32, BuildError> {
        let mut exit_code = 0;
        for (index, pass) in passes.iter().enumerate() {
            info!("{} (pass {}/{})", pass.description, index + 1, passes.len());
            let output = pass
                .execute(self.runner.as_ref())
                .map_err(BuildError::Process)?;
            exit_code = output.exit_code;
            if exit_code != 0 && index + 1 < passes.len() {
                warn!("Pass {} exited with code {}; continuing", index + 1, exit_code);
            }
        }
        Ok(exit_code)
    }
}

/// `path` as an absolute path: relative paths hang off `env.base_dir`, and a
/// relative base directory hangs off the process working directory.
fn anchor(env: &Environment, path: &Path) -> std::io::Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env.base_dir.join(path)
    };
    if path.is_absolute() {
        Ok(path)
    } else {
        Ok(std::env::current_dir()?.join(path))
    }
}
