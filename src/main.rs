use std::collections::HashSet;
use std::io::{self, BufRead, IsTerminal};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use pypkg::check::{
    Availability, DEFAULT_REGISTRY_URL, PyPi, Registry, RegistryConfig, check_name_with_retries,
};
use pypkg::create::{CreateOptions, create_project};
use pypkg::name::sanitize;

#[derive(Parser)]
#[command(
    name = "pypkg",
    version,
    about = "Scaffold new Python packages and check name availability on PyPI",
    after_help = "Names are sanitized before use: letters are lowercased and runs of \
                  spaces, `-`, `_` and `.` become a single `-`.\n\n\
                  A registry that cannot be reached is reported as `unknown`, never \
                  as `available`."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging (PYPKG_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new package project
    New(NewArgs),
    /// Check whether package names are available
    Check(CheckArgs),
}

#[derive(Args)]
struct RegistryArgs {
    /// Package index serving the PyPI JSON API
    #[arg(long, env = "PYPKG_REGISTRY_URL", default_value = DEFAULT_REGISTRY_URL)]
    registry_url: String,

    /// Request timeout in seconds
    #[arg(
        long,
        env = "PYPKG_TIMEOUT",
        default_value_t = 10,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    timeout: u64,

    /// Extra attempts after network failures
    #[arg(long, env = "PYPKG_RETRIES", default_value_t = 0)]
    retries: u32,
}

impl RegistryArgs {
    fn registry(&self) -> PyPi {
        PyPi::with_config(RegistryConfig {
            base_url: self.registry_url.clone(),
            timeout: Duration::from_secs(self.timeout),
        })
    }
}

#[derive(Args)]
struct NewArgs {
    /// Project name (sanitized before use)
    name: String,

    /// Directory to create the project in
    #[arg(short, long, default_value = ".")]
    dir: PathBuf,

    /// One-line project description
    #[arg(long)]
    description: Option<String>,

    /// Do not run `git init`
    #[arg(long)]
    no_git: bool,

    /// Skip the registry check
    #[arg(long)]
    offline: bool,

    /// Create the project even if the name is taken
    #[arg(long)]
    allow_taken: bool,

    /// Fail if availability cannot be determined
    #[arg(long)]
    strict: bool,

    #[command(flatten)]
    registry: RegistryArgs,
}

#[derive(Args)]
struct CheckArgs {
    /// Package names to check (also reads from stdin)
    names: Vec<String>,

    /// Suppress output, exit code only
    #[arg(short, long)]
    quiet: bool,

    /// Only print available names
    #[arg(short, long)]
    available_only: bool,

    #[command(flatten)]
    registry: RegistryArgs,
}

fn init_logging(verbose: bool) {
    let filter = EnvFilter::try_from_env("PYPKG_LOG").unwrap_or_else(|_| {
        if verbose {
            EnvFilter::new("pypkg=debug,warn")
        } else {
            EnvFilter::new("pypkg=warn")
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

// Let `pypkg check ... | head` end quietly instead of panicking on EPIPE.
#[cfg(unix)]
fn reset_sigpipe() {
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }
}

#[cfg(not(unix))]
fn reset_sigpipe() {}

fn main() -> ExitCode {
    reset_sigpipe();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::New(args) => run_new(args),
        Command::Check(args) => run_check(args),
    }
}

fn run_new(args: NewArgs) -> ExitCode {
    let registry = (!args.offline).then(|| args.registry.registry());
    let options = CreateOptions {
        parent: args.dir,
        description: args.description,
        init_git: !args.no_git,
        allow_taken: args.allow_taken,
        strict: args.strict,
        retries: args.registry.retries,
    };

    match create_project(
        registry.as_ref().map(|r| r as &dyn Registry),
        &args.name,
        &options,
    ) {
        Ok(created) => {
            println!("created {} at {}", created.name, created.root.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::from(1)
        }
    }
}

enum Status {
    Checked(Availability),
    Invalid(String),
}

fn run_check(args: CheckArgs) -> ExitCode {
    let mut names = args.names;

    // Read from stdin if not a terminal
    if !io::stdin().is_terminal() {
        for line in io::stdin().lock().lines() {
            match line {
                Ok(l) => {
                    let trimmed = l.trim().to_string();
                    if !trimmed.is_empty() {
                        names.push(trimmed);
                    }
                }
                Err(e) => {
                    eprintln!("error: reading stdin: {e}");
                    return ExitCode::from(2);
                }
            }
        }
    }

    if names.is_empty() {
        eprintln!("error: no package names provided");
        eprintln!("usage: pypkg check [OPTIONS] [NAMES...]");
        return ExitCode::from(2);
    }

    let registry = args.registry.registry();
    let mut seen = HashSet::new();
    let mut all_available = true;

    for raw in &names {
        let status = match sanitize(raw) {
            Ok(name) => {
                // `My_Tool` and `my-tool` are the same project on the index
                if !seen.insert(name.as_str().to_owned()) {
                    continue;
                }
                Status::Checked(check_name_with_retries(
                    &registry,
                    &name,
                    args.registry.retries,
                ))
            }
            Err(e) => {
                if !seen.insert(raw.clone()) {
                    continue;
                }
                Status::Invalid(e.to_string())
            }
        };

        let available = matches!(status, Status::Checked(Availability::Available));
        if !available {
            all_available = false;
        }

        if args.quiet || (args.available_only && !available) {
            continue;
        }

        match status {
            Status::Checked(availability) => println!("{raw}\t{availability}"),
            Status::Invalid(msg) => println!("{raw}\tinvalid: {msg}"),
        }
    }

    if all_available {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    }
}
