//! repro-eval CLI - image and video reproducibility metrics

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

/// Compare generated images and videos against a reference run.
#[derive(Parser)]
#[command(name = "repro-eval")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose output and progress bars
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute metrics between ground-truth and test corpora
    Compare(commands::compare::CompareArgs),

    /// Print ranked summary tables for saved results
    Summary(commands::summary::SummaryArgs),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Compare(args) => commands::compare::run(args, cli.verbose),
        Commands::Summary(args) => commands::summary::run(args),
    }
}

fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
