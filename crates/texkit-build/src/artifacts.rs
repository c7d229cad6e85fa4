//! Post-build artifact hygiene: logs go to the logs directory, auxiliary
//! files are deleted. Nothing here can fail a build.

use log::{debug, warn};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use texkit_core::config::BuildConfig;

/// Moves every `*.<log_extension>` file from `build_dir` into `logs_dir`,
/// replacing files with the same name. Returns the new paths.
pub fn relocate_logs(
    build_dir: &Path,
    logs_dir: &Path,
    log_extension: &str,
) -> io::Result<Vec<PathBuf>> {
    fs::create_dir_all(logs_dir)?;
    let mut moved = Vec::new();

    for path in files_in(build_dir)? {
        if path.extension().map_or(true, |ext| ext != log_extension) {
            continue;
        }
        let Some(name) = path.file_name() else { continue };
        let dest = logs_dir.join(name);
        match move_file(&path, &dest) {
            Ok(()) => {
                debug!("Moved {:?} to {:?}", path, dest);
                moved.push(dest);
            }
            Err(e) => warn!("Failed to move {:?}: {}", path, e),
        }
    }
    Ok(moved)
}

/// Deletes files in `build_dir` whose name ends in `.<ext>` for any of `extensions`.
///
/// Suffix matching so that compound extensions like `synctex.gz` work.
pub fn remove_aux_files(build_dir: &Path, extensions: &[String]) -> io::Result<usize> {
    let mut removed = 0;
    for path in files_in(build_dir)? {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        if !extensions.iter().any(|ext| name.ends_with(&format!(".{}", ext))) {
            continue;
        }
        match fs::remove_file(&path) {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove {:?}: {}", path, e),
        }
    }
    Ok(removed)
}

/// Runs both cleanup steps, logging instead of returning errors.
pub fn tidy(build_dir: &Path, logs_dir: &Path, config: &BuildConfig) {
    if let Err(e) = relocate_logs(build_dir, logs_dir, &config.log_extension) {
        warn!("Log relocation skipped: {}", e);
    }
    match remove_aux_files(build_dir, &config.aux_extensions) {
        Ok(count) => debug!("Removed {} auxiliary files", count),
        Err(e) => warn!("Auxiliary file cleanup skipped: {}", e),
    }
}

/// Last `n` lines of a file. TeX logs are not always valid UTF-8.
pub fn tail_lines(path: &Path, n: usize) -> io::Result<Vec<String>> {
    let bytes = fs::read(path)?;
    let content = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    Ok(lines[start..].iter().map(|l| l.to_string()).collect())
}

fn files_in(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            files.push(entry.path());
        }
    }
    files.sort();
    Ok(files)
}

fn move_file(from: &Path, to: &Path) -> io::Result<()> {
    if to.exists() {
        fs::remove_file(to)?;
    }
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }
    // Cross-device: copy then delete.
    fs::copy(from, to)?;
    fs::remove_file(from)
}
