use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use texkit_build::{BuildError, BuildReport, BuildRequest, Orchestrator};
use texkit_core::config::CONFIG_FILE_NAME;
use texkit_core::toolchain::InstallState;
use texkit_core::{
    check_platform, Config, Environment, ProjectLayout, ToolchainOutcome, ToolchainResolver,
};

mod watch;

#[derive(Parser)]
#[command(name = "texkit", version)]
#[command(about = "Provision MiKTeX and build LaTeX documents", long_about = None)]
struct Cli {
    /// Project directory (defaults to the current directory)
    #[arg(long, global = true, value_name = "DIR")]
    base_dir: Option<PathBuf>,

    /// Show debug output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug, PartialEq)]
enum Commands {
    /// Scaffold the project and install MiKTeX if needed
    Setup,
    /// Compile a document (the default command)
    Build {
        /// Source document [default: src/main.tex]
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
    /// Build, then rebuild whenever a source file changes
    Watch {
        /// Source document [default: src/main.tex]
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,
    },
}

/// Everything a command needs, resolved once per process.
struct Session {
    env: Environment,
    config: Config,
    layout: ProjectLayout,
}

impl Session {
    fn open(base_dir: Option<PathBuf>) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let base_dir = match base_dir {
            Some(dir) if dir.is_absolute() => dir,
            Some(dir) => cwd.join(dir),
            None => cwd,
        };

        let env = Environment::from_process(base_dir.clone());
        let config = match Config::load_or_default(&base_dir) {
            Ok(config) => config,
            Err(e) => {
                // An unreadable config must not mask a platform mismatch.
                check_platform(&env, &Config::default().required_os)?;
                return Err(e.context(format!("Failed to read {}", CONFIG_FILE_NAME)));
            }
        };
        check_platform(&env, &config.required_os)?;

        let layout = ProjectLayout::new(&base_dir, &config.layout);
        Ok(Self {
            env,
            config,
            layout,
        })
    }

    fn resolver(&self) -> ToolchainResolver {
        ToolchainResolver::new(self.config.install.clone(), self.layout.clone())
    }

    fn request(&self, path: Option<PathBuf>) -> anyhow::Result<BuildRequest> {
        let source = match path {
            Some(p) if p.is_absolute() => p,
            Some(p) => std::env::current_dir()?.join(p),
            None => self.layout.main_document.clone(),
        };
        Ok(BuildRequest::new(source))
    }
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let session = Session::open(cli.base_dir)?;
    match cli.command.unwrap_or(Commands::Build { path: None }) {
        Commands::Setup => setup(session),
        Commands::Build { path } => build(session, path),
        Commands::Watch { path } => watch_cmd(session, path),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn setup(mut session: Session) -> anyhow::Result<ExitCode> {
    for dir in session
        .layout
        .ensure()
        .context("Failed to create project directories")?
    {
        println!("Created {}", dir.display());
    }
    if session.layout.write_sample_document()? {
        println!("Wrote {}", session.layout.main_document.display());
    }

    let config_path = session.env.base_dir.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        session.config.save(&config_path)?;
        println!("Wrote {}", config_path.display());
    }

    let resolver = session.resolver();
    match resolver.ensure_toolchain(&mut session.env) {
        Ok(ToolchainOutcome::AlreadyPresent) => println!("LaTeX toolchain already installed."),
        Ok(ToolchainOutcome::Installed { method, bin_dir }) => {
            println!("Installed MiKTeX via {}.", method);
            if let Some(dir) = bin_dir {
                println!(
                    "Added {} to PATH for this session; open a new terminal to pick it up.",
                    dir.display()
                );
            }
        }
        Err(e) => {
            eprintln!("{}", e.hint());
            return Err(e.into());
        }
    }

    for status in resolver.configure_packages(&session.env) {
        if status.state != InstallState::Complete {
            println!("warning: {} was not configured ({:?})", status.name, status.state);
        }
    }

    println!(
        "Setup complete. Run `texkit build` to compile {}.",
        session.layout.main_document.display()
    );
    Ok(ExitCode::SUCCESS)
}

fn build(mut session: Session, path: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    session.resolver().adopt_existing_install(&mut session.env);
    let request = session.request(path)?;
    let orchestrator = Orchestrator::new(session.layout.clone(), session.config.build.clone());

    if report(orchestrator.build(&session.env, &request)) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

fn watch_cmd(mut session: Session, path: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    session.resolver().adopt_existing_install(&mut session.env);
    let request = session.request(path)?;
    let orchestrator = Orchestrator::new(session.layout.clone(), session.config.build.clone());

    watch::run(&session.env, &orchestrator, &request)?;
    Ok(ExitCode::SUCCESS)
}

/// Prints the outcome of a build. Returns `true` on success.
fn report(result: Result<BuildReport, BuildError>) -> bool {
    match result {
        Ok(report) => {
            println!("Build succeeded: {}", report.output.display());
            if let Some(log) = report.log_path {
                println!("Log: {}", log.display());
            }
            true
        }
        Err(BuildError::CompilationFailed {
            exit_code,
            log_path,
            log_tail,
        }) => {
            eprintln!("Build failed with exit code {}.", exit_code);
            if let Some(path) = log_path {
                eprintln!("Last {} lines of {}:", log_tail.len(), path.display());
                for line in log_tail {
                    eprintln!("  {}", line);
                }
            }
            false
        }
        Err(e) => {
            eprintln!("Build error: {}", e);
            false
        }
    }
}
