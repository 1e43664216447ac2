use std::sync::Arc;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use serde_json::json;
use tracing_subscriber::EnvFilter;

use tras::config::TrasConfig;
use tras::digest::render_digest;
use tras::monitor::Notifier;
use tras::pipeline::CycleOutcome;

#[derive(Parser, Debug)]
#[command(
    name = "tras-analyze",
    about = "Run one analysis cycle now and print the extracted trade signals as JSON"
)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/tras.toml")]
    config: String,

    /// Do not send the analysis digest
    #[arg(long)]
    no_digest: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TrasConfig::load(&cli.config)
        .with_context(|| format!("Failed to load config: {}", cli.config))?;
    config.validate()?;

    let http = tras::http_client()?;
    let pipeline = tras::build_pipeline(&config, &http)?;

    let now = Utc::now();
    let outcome = pipeline.run_cycle(now).await;

    if !cli.no_digest {
        let notifier = Arc::new(Notifier::from_config(
            tras::build_sinks(&config, &http),
            &config.monitor,
        ));
        let timezone: chrono_tz::Tz = config
            .schedule
            .timezone
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid timezone {}: {e}", config.schedule.timezone))?;
        if let Some(digest) = render_digest(&outcome, &now.with_timezone(&timezone)) {
            notifier.deliver(&digest).await;
        }
    }

    let output = match &outcome {
        CycleOutcome::SourceFailed { detail, .. } => bail!("No documents to analyze: {detail}"),
        CycleOutcome::Skipped { responses, skipped } => json!({
            "run_id": skipped.run_id,
            "responses": responses,
            "skipped": skipped,
        }),
        CycleOutcome::Completed {
            responses,
            recommendation,
            parsed,
        } => json!({
            "run_id": recommendation.run_id,
            "responses": responses,
            "recommendation": recommendation,
            "signals": parsed.signals,
            "warnings": parsed.warnings,
        }),
    };

    let text = if cli.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{text}");
    Ok(())
}
