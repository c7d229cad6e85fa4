//! External process invocation.
//!
//! Everything texkit does is delegated to other executables. All of them are
//! started through the [`ProcessRunner`] trait so the resolver and the build
//! orchestrator can be exercised without winget, MiKTeX or a compiler
//! installed:
//!
//! - **Production**: [`SystemRunner`] uses `std::process::Command`
//! - **Testing**: `testing::ScriptedRunner` (feature `test-util`) records
//!   every [`Invocation`] and answers from a closure

use anyhow::{Context, Result};
use log::debug;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// A fully described command line: program, arguments, working directory and
/// the `PATH` the child should see.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub search_path: Option<OsString>,
}

impl Invocation {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            search_path: None,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn current_dir(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }

    /// Lower-cased file stem of the program, e.g. `winget` for `C:\...\winget.exe`.
    pub fn program_name(&self) -> String {
        self.program
            .file_stem()
            .map(|s| s.to_string_lossy().to_lowercase())
            .unwrap_or_default()
    }

    pub fn command_line(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Exit code and captured output of a finished process.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProcessOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// stdout followed by stderr.
    pub fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Runs a command to completion and returns its exit code and output.
pub trait ProcessRunner: Send + Sync + std::fmt::Debug {
    /// Blocks until the process exits.
    ///
    /// # Errors
    ///
    /// Returns an error only if the process could not be started. A non-zero
    /// exit is reported through [`ProcessOutput::exit_code`].
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Default implementation of [`ProcessRunner`] using `std::process::Command`.
#[derive(Debug, Default)]
pub struct SystemRunner;

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        let mut cmd = Command::new(&invocation.program);
        cmd.args(&invocation.args).stdin(Stdio::null());

        if let Some(ref dir) = invocation.cwd {
            cmd.current_dir(dir);
        }
        if let Some(ref path) = invocation.search_path {
            cmd.env("PATH", path);
        }

        debug!("Running {}", invocation.command_line());
        let output = cmd
            .output()
            .with_context(|| format!("Failed to execute {}", invocation.program.display()))?;

        Ok(ProcessOutput {
            // Killed by a signal: no code, treat as a generic failure.
            exit_code: output.status.code().unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}
