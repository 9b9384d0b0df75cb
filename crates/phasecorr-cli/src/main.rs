mod commands;
mod fft;
mod imageio;
mod pcm;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "phasecorr", about = "Pairwise tile registration by phase correlation")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Estimate the shift of the second image relative to the first
    Register(commands::register::RegisterArgs),
    /// Print or save the default registration parameters as TOML
    Config(commands::config::ConfigArgs),
    /// List the shift hypotheses a PCM peak stands for
    Expand(commands::expand::ExpandArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match &cli.command {
        Commands::Register(args) => commands::register::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Expand(args) => commands::expand::run(args),
    }
}
