//! # texkit Core
//!
//! Environment detection and LaTeX toolchain provisioning for texkit.
//!
//! ## Overview
//!
//! This crate owns everything texkit needs before a document can be built:
//!
//! - [`env`] - The explicit [`Environment`] context (OS, search path, temp dir)
//! - [`platform`] - The OS gate run before any other work
//! - [`layout`] - Project directories and scaffolding
//! - [`config`] - `texkit.json` loading
//! - [`process`] - The [`ProcessRunner`] seam every external tool goes through
//! - [`toolchain`] - Detecting and installing MiKTeX (`pdflatex` + `latexmk`)
//!
//! ## Design Philosophy
//!
//! - **No ambient state**: the process environment is read once into an
//!   [`Environment`]; the resolver amends that value, never the real `PATH`
//! - **Testability**: commands and downloads go through traits, so every
//!   branch of the install chain runs in tests without MiKTeX or a network
//!
//! ## Examples
//!
//! ```no_run
//! use texkit_core::{Config, Environment, ProjectLayout, ToolchainResolver};
//!
//! let base = std::env::current_dir()?;
//! let config = Config::load_or_default(&base)?;
//! let mut env = Environment::from_process(base.clone());
//! let layout = ProjectLayout::new(&base, &config.layout);
//!
//! let resolver = ToolchainResolver::new(config.install.clone(), layout);
//! match resolver.ensure_toolchain(&mut env) {
//!     Ok(outcome) => println!("Toolchain ready: {:?}", outcome),
//!     Err(e) => eprintln!("{}\n{}", e, e.hint()),
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod config;
pub mod env;
pub mod error;
pub mod layout;
pub mod platform;
pub mod process;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;
pub mod toolchain;

pub use config::Config;
pub use env::Environment;
pub use error::{EnvironmentUnsupported, InstallError};
pub use layout::ProjectLayout;
pub use platform::check_platform;
pub use process::{Invocation, ProcessOutput, ProcessRunner, SystemRunner};
pub use toolchain::{InstallMethod, ToolchainOutcome, ToolchainResolver, ToolchainState};
