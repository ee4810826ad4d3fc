// src/main.rs — Arbor entry point

use clap::Parser;

use arbor::cli::{Cli, Commands};
use arbor::infra::config::Config;
use arbor::infra::logger;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = match cli.command {
        Commands::Serve { .. } => "info",
        Commands::Solve(_) => "warn",
    };
    logger::init_logging(cli.log_level.as_deref().unwrap_or(default_level));

    // Load config (falls back to defaults if no config.toml)
    let config = if let Some(ref path) = cli.config {
        Config::load_from(std::path::Path::new(path))?
    } else {
        Config::load()?
    };

    match cli.command {
        Commands::Solve(args) => arbor::cli::solve::run_solve(&args, config).await,
        Commands::Serve { port } => arbor::cli::serve::run_serve(port, config).await,
    }
}
