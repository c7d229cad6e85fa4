//! Portable MiKTeX install without a system package manager.
//!
//! 1. Download the `miktexsetup` archive into a scratch directory
//! 2. Extract it and locate `miktexsetup_standalone.exe`
//! 3. Run it once with `download` to fill a local package repository
//! 4. Run it again with `install --portable=<dir>` from that repository
//!
//! The scratch directory is a [`tempfile::TempDir`], so it is removed on
//! every exit path, including errors.

use crate::config::InstallConfig;
use crate::env::Environment;
use crate::error::InstallError;
use crate::process::ProcessRunner;
use anyhow::{Context, Result};
use log::{info, warn};
use std::fs::File;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Downloads a URL to a local file.
pub trait Fetcher: Send + Sync + std::fmt::Debug {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()>;
}

/// [`Fetcher`] backed by a blocking `reqwest` client.
#[derive(Debug, Default)]
pub struct HttpFetcher;

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, dest: &Path) -> Result<()> {
        info!("Downloading {}", url);
        // No request timeout: the setup archive is large and the flow blocks anyway.
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<std::time::Duration>)
            .build()
            .context("Failed to build HTTP client")?;

        let mut response = client
            .get(url)
            .send()
            .with_context(|| format!("Failed to download {}", url))?
            .error_for_status()?;

        let mut file =
            File::create(dest).with_context(|| format!("Failed to create {}", dest.display()))?;
        let bytes = response.copy_to(&mut file)?;
        info!("Downloaded {} bytes", bytes);
        Ok(())
    }
}

pub struct StandaloneInstaller<'a> {
    config: &'a InstallConfig,
    runner: &'a dyn ProcessRunner,
    fetcher: &'a dyn Fetcher,
}

impl<'a> StandaloneInstaller<'a> {
    pub fn new(
        config: &'a InstallConfig,
        runner: &'a dyn ProcessRunner,
        fetcher: &'a dyn Fetcher,
    ) -> Self {
        Self {
            config,
            runner,
            fetcher,
        }
    }

    /// Installs a portable MiKTeX into `portable_dir`.
    pub fn install(&self, env: &Environment, portable_dir: &Path) -> Result<(), InstallError> {
        std::fs::create_dir_all(&env.temp_dir).map_err(|e| failed("prepare", e))?;
        let scratch = tempfile::Builder::new()
            .prefix("texkit-miktex-")
            .tempdir_in(&env.temp_dir)
            .map_err(|e| failed("prepare", e))?;

        let result = self.install_in(scratch.path(), env, portable_dir);

        if let Err(e) = scratch.close() {
            warn!("Failed to remove scratch directory: {}", e);
        }
        result
    }

    fn install_in(
        &self,
        scratch: &Path,
        env: &Environment,
        portable_dir: &Path,
    ) -> Result<(), InstallError> {
        let archive = scratch.join("miktexsetup.zip");
        self.fetcher
            .fetch(&self.config.standalone_url, &archive)
            .map_err(|e| failed("download", e))?;

        let extract_dir = scratch.join("setup");
        extract_archive(&archive, &extract_dir).map_err(|e| failed("extract", e))?;

        let setup = find_file(&extract_dir, &self.config.setup_executable).ok_or_else(|| {
            failed(
                "extract",
                format!("{} not found in archive", self.config.setup_executable),
            )
        })?;
        info!("Found setup utility at {:?}", setup);

        let common = vec![
            "--verbose".to_string(),
            format!(
                "--local-package-repository={}",
                scratch.join("repository").display()
            ),
            format!("--package-set={}", self.config.package_set),
        ];

        let mut download = common.clone();
        download.push("download".to_string());
        self.run_stage(env, &setup, "package download", download)?;

        let mut install = common;
        install.push(format!("--portable={}", portable_dir.display()));
        install.push("install".to_string());
        self.run_stage(env, &setup, "install", install)
    }

    fn run_stage(
        &self,
        env: &Environment,
        setup: &Path,
        stage: &'static str,
        args: Vec<String>,
    ) -> Result<(), InstallError> {
        info!("Running miktexsetup ({})", stage);
        let invocation = env.invocation(setup).args(args);
        let output = self.runner.run(&invocation).map_err(|e| failed(stage, e))?;
        if !output.success() {
            return Err(failed(stage, format!("exit code {}", output.exit_code)));
        }
        Ok(())
    }
}

fn failed(stage: &'static str, reason: impl std::fmt::Display) -> InstallError {
    InstallError::StandaloneFailed {
        stage,
        reason: reason.to_string(),
    }
}

fn extract_archive(archive: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive)?;
    let mut zip = zip::ZipArchive::new(file).context("Not a valid zip archive")?;
    zip.extract(dest)?;
    Ok(())
}

/// First file named `name` (ASCII case-insensitive) under `root`, in sorted walk order.
fn find_file(root: &Path, name: &str) -> Option<PathBuf> {
    WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| entry.ok())
        .find(|entry| {
            entry.file_type().is_file() && entry.file_name().eq_ignore_ascii_case(name)
        })
        .map(|entry| entry.into_path())
}
