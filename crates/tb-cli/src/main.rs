use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tb_cli::commands::{analyze, colors, events};
use tb_cli::{Cli, Commands, Config};

/// Loads configuration and logs it at debug level.
fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let config = Config::load_from(config_path).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing with verbose flag support
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // Use try_init to avoid panic if tracing is already initialized (e.g., in tests)
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match &cli.command {
        Some(Commands::Analyze(args)) => {
            let config = load_config(cli.config.as_deref())?;
            analyze::run(&mut out, args, &config)?;
        }
        Some(Commands::Events { start, end }) => {
            let config = load_config(cli.config.as_deref())?;
            events::list(&mut out, start, end, &config)?;
        }
        Some(Commands::Event { id }) => {
            let config = load_config(cli.config.as_deref())?;
            events::show(&mut out, id, &config)?;
        }
        Some(Commands::Colors) => {
            let config = load_config(cli.config.as_deref())?;
            colors::run(&mut out, &config)?;
        }
        None => {
            // No subcommand, show help
            use clap::CommandFactory;
            Cli::command().print_help()?;
            println!();
        }
    }

    out.flush()?;
    Ok(())
}
