use crate::process::Invocation;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Explicit view of the host that the resolver and orchestrator work against.
///
/// Captured once from the process at startup; afterwards all probing goes
/// through this value, so tests can hand in a fake search path and temp dir.
#[derive(Debug, Clone)]
pub struct Environment {
    /// Operating system identity, as in `std::env::consts::OS`.
    pub os: String,
    /// Ordered executable search path. The resolver prepends to it after an install.
    pub search_path: Vec<PathBuf>,
    /// Where scratch directories for downloads are created.
    pub temp_dir: PathBuf,
    /// Project base directory all layout paths are relative to.
    pub base_dir: PathBuf,
    /// System-wide roots a MiKTeX install may land in (`<root>/miktex/bin/...`).
    pub install_roots: Vec<PathBuf>,
}

impl Environment {
    /// Snapshot of the current process environment.
    pub fn from_process(base_dir: PathBuf) -> Self {
        let search_path = std::env::var_os("PATH")
            .map(|p| std::env::split_paths(&p).collect())
            .unwrap_or_default();

        let mut install_roots = Vec::new();
        if let Some(local) = dirs::data_local_dir() {
            install_roots.push(local.join("Programs").join("MiKTeX"));
        }
        if let Some(program_files) = std::env::var_os("ProgramFiles") {
            install_roots.push(PathBuf::from(program_files).join("MiKTeX"));
        }

        Self {
            os: std::env::consts::OS.to_string(),
            search_path,
            temp_dir: std::env::temp_dir(),
            base_dir,
            install_roots,
        }
    }

    /// Resolves `name` against the search path (honours `PATHEXT` on Windows).
    pub fn find_executable(&self, name: &str) -> Option<PathBuf> {
        let paths = self.joined_search_path()?;
        which::which_in(name, Some(paths), &self.base_dir).ok()
    }

    pub fn has_executable(&self, name: &str) -> bool {
        self.find_executable(name).is_some()
    }

    /// Puts `dir` at the front of the search path, removing any later duplicate.
    pub fn prepend_search_path(&mut self, dir: &Path) {
        self.search_path.retain(|p| p != dir);
        self.search_path.insert(0, dir.to_path_buf());
    }

    pub fn joined_search_path(&self) -> Option<OsString> {
        if self.search_path.is_empty() {
            return None;
        }
        std::env::join_paths(&self.search_path).ok()
    }

    /// Starts an invocation of `program` whose child sees this search path as `PATH`.
    pub fn invocation(&self, program: impl Into<PathBuf>) -> Invocation {
        let mut invocation = Invocation::new(program);
        invocation.search_path = self.joined_search_path();
        invocation
    }
}
