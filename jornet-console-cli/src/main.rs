//! Jornet Console CLI
//!
//! Interactive terminal front end for the Jornet leaderboard admin console.
//!
//! # Usage
//!
//! ```bash
//! # Start a shell against a local server
//! jornet-console --url http://localhost:8080
//!
//! # Resume an OAuth login from the provider's redirect
//! jornet-console --callback "http://localhost:8080/connect?code=abc123"
//! ```
//!
//! Inside the shell, `help` lists the available commands.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use jornet_console_core::{config::load_config, Console};
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

mod navigator;
mod shell;

use navigator::TerminalNavigator;
use shell::Shell;

#[derive(Parser)]
#[command(name = "jornet-console")]
#[command(about = "Admin console for Jornet leaderboards")]
#[command(version)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Server origin (overrides config and JORNET_CONSOLE_URL)
    #[arg(short, long)]
    url: Option<String>,

    /// Path to a console.toml configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// OAuth callback URL to resume a provider login from
    #[arg(long)]
    callback: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(url) = cli.url {
        config = config.with_base_url(url);
        config.validate().context("Invalid --url")?;
    }

    init_logging(cli.verbose, &config.log_level);
    if let Some(path) = &config.config_path {
        info!("Loaded configuration from {:?}", path);
    }

    let callback = cli
        .callback
        .as_deref()
        .map(url::Url::parse)
        .transpose()
        .context("Invalid --callback URL")?;

    let (navigator, navigations) = TerminalNavigator::new();
    let console = Console::from_config(&config, Arc::new(navigator))
        .context("Failed to set up the console")?;

    Shell::new(console, navigations)
        .run(callback.as_ref())
        .await
}

fn init_logging(verbose: bool, level: &str) {
    let default_level = if verbose { "debug" } else { level };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
