mod commands;
mod progress;
mod summary;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lensless", about = "Lensless camera capture and reconstruction")]
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
    /// Display, capture and reconstruct in one go
    Run(commands::run::RunArgs),
    /// Capture a raw frame and print the camera diagnostics
    Capture(commands::capture::CaptureArgs),
    /// Reconstruct a local raw frame
    Reconstruct(commands::reconstruct::ReconstructArgs),
    /// Print or save the default configuration
    Config(commands::config::ConfigArgs),
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
        Commands::Run(args) => commands::run::run(args),
        Commands::Capture(args) => commands::capture::run(args),
        Commands::Reconstruct(args) => commands::reconstruct::run(args),
        Commands::Config(args) => commands::config::run(args),
    }
}
