use crate::config::LayoutConfig;
use log::info;
use std::io;
use std::path::{Path, PathBuf};

const SAMPLE_DOCUMENT: &str = r"\documentclass{article}
\usepackage[utf8]{inputenc}

\title{Sample Document}
\author{texkit}

\begin{document}
\maketitle

\section{Introduction}
\label{sec:intro}
This document was generated by \texttt{texkit setup}.
See Section~\ref{sec:intro}.

\end{document}
";

/// Absolute project directories, resolved against the base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectLayout {
    pub root: PathBuf,
    pub src: PathBuf,
    pub build: PathBuf,
    pub logs: PathBuf,
    pub templates: PathBuf,
    /// Target of a portable (standalone) MiKTeX install.
    pub portable: PathBuf,
    pub main_document: PathBuf,
}

impl ProjectLayout {
    pub fn new(root: &Path, config: &LayoutConfig) -> Self {
        let src = root.join(&config.src_dir);
        Self {
            root: root.to_path_buf(),
            main_document: src.join(&config.main_document),
            src,
            build: root.join(&config.build_dir),
            logs: root.join(&config.logs_dir),
            templates: root.join(&config.templates_dir),
            portable: root.join(&config.portable_dir),
        }
    }

    /// Creates the project directories that do not exist yet.
    ///
    /// Returns only the directories that were actually created; existing ones
    /// are left untouched.
    pub fn ensure(&self) -> io::Result<Vec<PathBuf>> {
        let mut created = Vec::new();
        for dir in [&self.src, &self.build, &self.logs, &self.templates] {
            if dir.is_dir() {
                continue;
            }
            std::fs::create_dir_all(dir)?;
            info!("Created directory {:?}", dir);
            created.push(dir.clone());
        }
        Ok(created)
    }

    /// Writes a starter document at [`Self::main_document`] unless one exists.
    ///
    /// Returns `true` if the file was written.
    pub fn write_sample_document(&self) -> io::Result<bool> {
        if self.main_document.exists() {
            return Ok(false);
        }
        if let Some(parent) = self.main_document.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.main_document, SAMPLE_DOCUMENT)?;
        info!("Wrote sample document {:?}", self.main_document);
        Ok(true)
    }

    /// Bin directory root of a portable install (`<root>/miktex/bin/...`).
    pub fn portable_install_root(&self) -> PathBuf {
        self.portable.join("texmfs").join("install")
    }
}
