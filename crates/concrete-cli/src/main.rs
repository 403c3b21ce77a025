use clap::{CommandFactory, Parser, Subcommand};
use concrete_core::vm::{DEFAULT_STEP_BUDGET, EngineConfig};
use tracing_subscriber::EnvFilter;

mod compile;
mod debug;
mod run;
mod step;
mod utils;

#[cfg(test)]
mod tests;

use compile::handle_compile;
use debug::handle_tape;
use run::handle_run;
use step::handle_step;

/// Get the version string including git revision
fn version() -> &'static str {
    concat!(env!("CARGO_PKG_VERSION"), " (git:", env!("GIT_HASH"), ")")
}

#[derive(Parser)]
#[command(
    author,
    version = version(),
    about = "Concrete tape language",
    long_about = None,
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// The file to run (default if no subcommand)
    file: Option<String>,
    /// Log engine activity at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Abort after this many engine steps
    #[arg(long, global = true, default_value_t = DEFAULT_STEP_BUDGET)]
    step_budget: u64,
}

#[derive(Subcommand)]
enum Commands {
    /// Execute a file and print its results
    Run {
        /// The file to execute, or `-` for stdin
        file: String,
    },
    /// Execute a file one engine step at a time, printing every step
    Step {
        /// The file to execute, or `-` for stdin
        file: String,
    },
    /// Serialize the parsed tape of a file to RON
    Compile {
        /// The file to compile
        file: String,
        /// Output file (defaults to input.concretec)
        #[arg(short, long)]
        output: Option<String>,
    },
    /// Print the parsed tape (debug)
    #[command(hide = true)]
    Tape {
        /// The file to parse
        file: String,
    },
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = EngineConfig {
        step_budget: cli.step_budget,
    };

    match &cli.command {
        Some(Commands::Run { file }) => handle_run(file, config),
        Some(Commands::Step { file }) => handle_step(file, config),
        Some(Commands::Compile { file, output }) => handle_compile(file, output.as_deref()),
        Some(Commands::Tape { file }) => handle_tape(file),
        None => {
            // Default: run the file if provided, otherwise print help
            let Some(file) = &cli.file else {
                let _ = Cli::command().print_help();
                println!();
                std::process::exit(0);
            };
            handle_run(file, config);
        }
    }
}
