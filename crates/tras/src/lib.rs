//! TRAS - Trade Recommendation Alert System
//!
//! Runs scheduled multi-model forex analysis over local market documents,
//! synthesizes one recommendation, extracts trade signals from it and
//! watches live prices to alert once when an entry is reached.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use tras::config::TrasConfig;
//! use tras::models::{Instrument, TradeSignal};
//! use tras::monitor::{PriceMonitor, SignalBook};
//! ```

pub use tras_agents as agents;
pub use tras_models as models;
pub use tras_monitor as monitor;
pub use tras_store as store;

pub mod config;
pub mod daemon;
pub mod digest;
pub mod error;
pub mod pipeline;
pub mod schedule;
pub mod sinks;
pub mod sources;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tracing::{info, warn};
use tras_monitor::{
    AlertDeduplicator, NotificationSink, Notifier, PriceMonitor, PriceSource, SignalBook,
    Tolerance,
};
use tras_store::{AlertStore, SqliteAlertStore};

use crate::config::TrasConfig;
use crate::daemon::Daemon;
use crate::error::TrasError;
use crate::pipeline::AnalysisPipeline;
use crate::schedule::Schedule;
use crate::sinks::{EmailSink, PushoverSink};
use crate::sources::{DirectorySource, FrankfurterSource};

/// Shared HTTP client for model providers, the price feed and Pushover.
pub fn http_client() -> Result<reqwest::Client, TrasError> {
    Ok(reqwest::Client::builder()
        .user_agent(concat!("tras/", env!("CARGO_PKG_VERSION")))
        .build()?)
}

/// Open the alert history database, creating its directory if needed.
pub fn open_store(path: &str) -> Result<Arc<dyn AlertStore>, TrasError> {
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let store = SqliteAlertStore::open(path)?;
    info!(path, "Alert store opened");
    Ok(Arc::new(store))
}

/// Build the configured notification sinks. A sink whose credentials are
/// missing from the environment is left out with a warning.
pub fn build_sinks(
    config: &TrasConfig,
    http: &reqwest::Client,
) -> Vec<Arc<dyn NotificationSink>> {
    let mut sinks: Vec<Arc<dyn NotificationSink>> = Vec::new();

    if let Some(pushover) = &config.pushover {
        match PushoverSink::from_env(pushover, http.clone()) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => warn!(error = %e, "Pushover notifications disabled"),
        }
    }
    if let Some(email) = &config.email {
        match EmailSink::from_env(email) {
            Ok(sink) => sinks.push(Arc::new(sink)),
            Err(e) => warn!(error = %e, "Email notifications disabled"),
        }
    }

    if sinks.is_empty() {
        warn!("No notification sinks configured, alerts will only be logged");
    }
    sinks
}

/// Build the analysis pipeline from configuration.
pub fn build_pipeline(
    config: &TrasConfig,
    http: &reqwest::Client,
) -> Result<AnalysisPipeline, TrasError> {
    let documents = Arc::new(DirectorySource::new(config.documents.clone()));
    AnalysisPipeline::from_config(&config.agents, documents, http)
}

/// Build a price monitor over an empty signal book.
pub fn build_monitor(
    config: &TrasConfig,
    store: Arc<dyn AlertStore>,
    notifier: Arc<Notifier>,
) -> Result<PriceMonitor, TrasError> {
    let prices: Arc<dyn PriceSource> = Arc::new(FrankfurterSource::new(
        &config.prices,
        Duration::from_secs(config.monitor.price_cache_ttl_seconds),
    )?);
    Ok(PriceMonitor::new(
        Arc::new(Mutex::new(SignalBook::new())),
        prices,
        AlertDeduplicator::new(store),
        notifier,
        Tolerance::from_config(&config.monitor),
    ))
}

/// Wire the full daemon from a validated configuration.
pub fn build_daemon(config: &TrasConfig) -> Result<Daemon, TrasError> {
    config.validate()?;
    let http = http_client()?;
    let store = open_store(&config.store.sqlite_path)?;
    let notifier = Arc::new(Notifier::from_config(
        build_sinks(config, &http),
        &config.monitor,
    ));

    Ok(Daemon::new(
        Schedule::from_config(&config.schedule)?,
        build_pipeline(config, &http)?,
        build_monitor(config, store, Arc::clone(&notifier))?,
        notifier,
        &config.schedule,
        &config.monitor,
    ))
}
