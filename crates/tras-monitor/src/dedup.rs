use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::debug;
use tras_models::{AlertRecord, TradeSignal};
use tras_store::{AlertStore, StoreError};

/// Gate in front of every entry alert: one notification per fingerprint,
/// for as long as the alert history survives.
#[derive(Clone)]
pub struct AlertDeduplicator {
    store: Arc<dyn AlertStore>,
}

impl AlertDeduplicator {
    pub fn new(store: Arc<dyn AlertStore>) -> Self {
        Self { store }
    }

    /// True when no alert has been recorded for this signal's fingerprint.
    pub fn should_notify(&self, signal: &TradeSignal) -> Result<bool, StoreError> {
        let fingerprint = signal.fingerprint();
        let seen = self.store.exists(&fingerprint)?;
        if seen {
            debug!(instrument = %signal.instrument, fingerprint = %fingerprint, "Alert already sent");
        }
        Ok(!seen)
    }

    /// Record that the signal fired. Returns `false` if another caller
    /// recorded the same fingerprint first, in which case nothing should
    /// be sent.
    pub fn record(
        &self,
        signal: &TradeSignal,
        trigger_price: Decimal,
        triggered_at: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        self.store
            .put(&AlertRecord::for_signal(signal, trigger_price, triggered_at))
    }

    pub fn store(&self) -> &Arc<dyn AlertStore> {
        &self.store
    }
}
