use crate::{BuildError, BuildStrategy};
use std::path::Path;
use texkit_core::process::{Invocation, ProcessOutput, ProcessRunner};
use texkit_core::toolchain::{BASE_COMPILER, DRIVER_TOOL};
use texkit_core::Environment;

/// A single run of an external TeX engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilePass {
    pub description: &'static str,
    pub invocation: Invocation,
}

impl CompilePass {
    /// `latexmk -pdf -interaction=nonstopmode -outdir=<build> -auxdir=<build> <file>`
    pub fn latexmk(env: &Environment, program: &Path, source: &Path, build_dir: &Path) -> Self {
        let invocation = env
            .invocation(program)
            .arg("-pdf")
            .arg("-interaction=nonstopmode")
            .arg(format!("-outdir={}", build_dir.display()))
            .arg(format!("-auxdir={}", build_dir.display()))
            .arg(file_name(source));

        Self {
            description: "latexmk compilation",
            invocation: in_source_dir(invocation, source),
        }
    }

    /// `pdflatex -interaction=nonstopmode -output-directory=<build> -aux-directory=<build> <file>`
    pub fn pdflatex(env: &Environment, program: &Path, source: &Path, build_dir: &Path) -> Self {
        let invocation = env
            .invocation(program)
            .arg("-interaction=nonstopmode")
            .arg(format!("-output-directory={}", build_dir.display()))
            .arg(format!("-aux-directory={}", build_dir.display()))
            .arg(file_name(source));

        Self {
            description: "pdflatex compilation",
            invocation: in_source_dir(invocation, source),
        }
    }

    pub fn execute(&self, runner: &dyn ProcessRunner) -> anyhow::Result<ProcessOutput> {
        runner.run(&self.invocation)
    }
}

/// The passes a strategy runs, in order.
///
/// `DirectTwoPass` always yields two identical `pdflatex` passes so that
/// cross-references resolve; the output of the first pass is not inspected.
pub fn plan(
    strategy: BuildStrategy,
    env: &Environment,
    source: &Path,
    build_dir: &Path,
) -> Result<Vec<CompilePass>, BuildError> {
    match strategy {
        BuildStrategy::DriverTool => {
            let program = locate(env, DRIVER_TOOL)?;
            Ok(vec![CompilePass::latexmk(env, &program, source, build_dir)])
        }
        BuildStrategy::DirectTwoPass => {
            let program = locate(env, BASE_COMPILER)?;
            let pass = CompilePass::pdflatex(env, &program, source, build_dir);
            Ok(vec![pass.clone(), pass])
        }
    }
}

fn locate(env: &Environment, tool: &str) -> Result<std::path::PathBuf, BuildError> {
    env.find_executable(tool)
        .ok_or_else(|| BuildError::ToolchainMissing(tool.to_string()))
}

fn file_name(source: &Path) -> String {
    source
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_default()
}

// Relative \input and \include paths resolve against the document's own directory.
fn in_source_dir(invocation: Invocation, source: &Path) -> Invocation {
    match source.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => invocation.current_dir(dir),
        _ => invocation,
    }
}
