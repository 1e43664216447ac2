use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::instrument::Instrument;
use crate::signal::{Direction, TradeSignal};

/// Durable alert history table. One row per fingerprint, never updated or
/// deleted once written.
///
/// ```sql
/// CREATE TABLE IF NOT EXISTS alert_records (
///     fingerprint   TEXT PRIMARY KEY,
///     record_json   TEXT NOT NULL,
///     triggered_at  TEXT NOT NULL
/// );
/// ```
pub const ALERT_TABLE_DDL: &str = "\
CREATE TABLE IF NOT EXISTS alert_records (
    fingerprint   TEXT PRIMARY KEY,
    record_json   TEXT NOT NULL,
    triggered_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_alert_triggered ON alert_records(triggered_at);
";

/// Persisted fact that a signal fired.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertRecord {
    pub signal_fingerprint: String,
    pub triggered_at: DateTime<Utc>,
    pub instrument: Instrument,
    pub direction: Direction,
    pub entry_price: Decimal,
    /// Price observed when the signal matched.
    pub trigger_price: Decimal,
}

impl AlertRecord {
    pub fn for_signal(
        signal: &TradeSignal,
        trigger_price: Decimal,
        triggered_at: DateTime<Utc>,
    ) -> Self {
        Self {
            signal_fingerprint: signal.fingerprint(),
            triggered_at,
            instrument: signal.instrument.clone(),
            direction: signal.direction,
            entry_price: signal.entry_price,
            trigger_price,
        }
    }
}
