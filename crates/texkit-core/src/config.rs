//! Project configuration loaded from `texkit.json`.
//!
//! Every field has a default, so a missing file (or a file that only sets a
//! couple of keys) is valid.

use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_FILE_NAME: &str = "texkit.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Config {
    /// `std::env::consts::OS` value the whole flow is gated to.
    pub required_os: String,
    pub layout: LayoutConfig,
    pub install: InstallConfig,
    pub build: BuildConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LayoutConfig {
    pub src_dir: String,
    pub build_dir: String,
    pub logs_dir: String,
    pub templates_dir: String,
    pub portable_dir: String,
    pub main_document: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct InstallConfig {
    pub winget_id: String,
    pub choco_package: String,
    pub standalone_url: String,
    pub setup_executable: String,
    pub package_set: String,
    /// Packages installed through `mpm` after the distribution itself.
    pub auxiliary_packages: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BuildConfig {
    /// Substring of `latexmk --version` output meaning Perl is unavailable.
    pub driver_absence_marker: String,
    /// File name suffixes (without the leading dot) removed after a build.
    pub aux_extensions: Vec<String>,
    pub log_extension: String,
    pub log_tail_lines: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            required_os: "windows".to_string(),
            layout: LayoutConfig::default(),
            install: InstallConfig::default(),
            build: BuildConfig::default(),
        }
    }
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            src_dir: "src".to_string(),
            build_dir: "build".to_string(),
            logs_dir: "logs".to_string(),
            templates_dir: "templates".to_string(),
            portable_dir: "miktex-portable".to_string(),
            main_document: "main.tex".to_string(),
        }
    }
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            winget_id: "MiKTeX.MiKTeX".to_string(),
            choco_package: "miktex".to_string(),
            standalone_url: "https://miktex.org/download/win/miktexsetup-x64.zip".to_string(),
            setup_executable: "miktexsetup_standalone.exe".to_string(),
            package_set: "basic".to_string(),
            auxiliary_packages: vec!["latexmk".to_string(), "perl".to_string()],
        }
    }
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            driver_absence_marker: "could not find the script engine".to_string(),
            aux_extensions: [
                "aux",
                "toc",
                "out",
                "lof",
                "lot",
                "fls",
                "fdb_latexmk",
                "bbl",
                "blg",
                "nav",
                "snm",
                "synctex.gz",
                "run.xml",
                "bcf",
                "xdv",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            log_extension: "log".to_string(),
            log_tail_lines: 20,
        }
    }
}

impl Config {
    /// Loads `<base>/texkit.json`, falling back to defaults when it does not exist.
    pub fn load_or_default(base_dir: &Path) -> anyhow::Result<Self> {
        let path = base_dir.join(CONFIG_FILE_NAME);
        if !path.exists() {
            log::debug!("No {} in {:?}, using defaults", CONFIG_FILE_NAME, base_dir);
            return Ok(Self::default());
        }
        Self::load(&path)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
