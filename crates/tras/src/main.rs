use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use tras::config::TrasConfig;

#[derive(Parser, Debug)]
#[command(
    name = "tras",
    about = "Trade recommendation alert daemon - runs scheduled multi-model forex analysis and alerts once when a recommended entry is reached"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/tras.toml")]
    config: String,

    /// Emit logs as JSON lines
    #[arg(long)]
    json: bool,

    /// Do not send the per-run analysis digest
    #[arg(long)]
    no_digest: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr);
    if cli.json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }

    let config = TrasConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config))?;

    let mut daemon = tras::build_daemon(&config).with_context(|| "Failed to start daemon")?;
    if cli.no_digest {
        daemon = daemon.without_digest();
    }
    let cancel = daemon.cancel_token();

    // Handle shutdown signals
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        tracing::info!("Received shutdown signal");
        cancel.cancel();
    });

    daemon.run().await;
    Ok(())
}
