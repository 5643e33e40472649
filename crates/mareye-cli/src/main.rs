mod commands;
mod progress;
mod summary;

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mareye", about = "Underwater image and video enhancement")]
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
    /// Enhance a still image
    Image(commands::image::ImageArgs),
    /// Enhance a video frame by frame
    Video(commands::video::VideoArgs),
    /// Compare an original image with an enhanced one
    Metrics(commands::metrics::MetricsArgs),
    /// Print or save the default configuration as TOML
    Config(commands::config::ConfigArgs),
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match &cli.command {
        Commands::Image(args) => commands::image::run(args),
        Commands::Video(args) => commands::video::run(args),
        Commands::Metrics(args) => commands::metrics::run(args),
        Commands::Config(args) => commands::config::run(args),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            println!("{}", serde_json::json!({ "error": format!("{e:#}") }));
            ExitCode::FAILURE
        }
    }
}
