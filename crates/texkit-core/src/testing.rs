//! Test doubles shared by the texkit crates (feature `test-util`).

use crate::process::{Invocation, ProcessOutput, ProcessRunner};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

type Handler = Box<dyn Fn(&Invocation) -> Result<ProcessOutput> + Send + Sync>;

/// A [`ProcessRunner`] that never spawns anything.
///
/// Every invocation is recorded, and the response comes from the handler
/// closure, which may also touch the filesystem to simulate side effects
/// (an installer dropping binaries, a compiler writing a log).
pub struct ScriptedRunner {
    handler: Handler,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Invocation) -> Result<ProcessOutput> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Every command exits 0 with empty output.
    pub fn succeeding() -> Self {
        Self::new(|_| Ok(exit(0)))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    /// Recorded invocations whose program stem equals `name`.
    pub fn calls_to(&self, name: &str) -> Vec<Invocation> {
        self.calls()
            .into_iter()
            .filter(|inv| inv.program_name() == name)
            .collect()
    }
}

impl std::fmt::Debug for ScriptedRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScriptedRunner")
            .field("calls", &self.calls.lock().unwrap().len())
            .finish()
    }
}

impl ProcessRunner for ScriptedRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        self.calls.lock().unwrap().push(invocation.clone());
        (self.handler)(invocation)
    }
}

pub fn exit(code: i32) -> ProcessOutput {
    ProcessOutput {
        exit_code: code,
        ..Default::default()
    }
}

pub fn stdout(text: &str) -> ProcessOutput {
    ProcessOutput {
        exit_code: 0,
        stdout: text.to_string(),
        stderr: String::new(),
    }
}

/// Creates a file `which` will accept as the executable `name` inside `dir`.
pub fn touch_executable(dir: &Path, name: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();

    #[cfg(windows)]
    let path = dir.join(format!("{}.exe", name));
    #[cfg(not(windows))]
    let path = dir.join(name);

    std::fs::write(&path, b"").unwrap();

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    }

    path
}
