use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};
use tras_models::{Instrument, PriceTick, TradeSignal};

use crate::book::SignalBook;
use crate::dedup::AlertDeduplicator;
use crate::notify::{Notification, Notifier};
use crate::price::PriceSource;
use crate::tolerance::Tolerance;

/// Signal book shared by the analysis pipeline and the monitor.
pub type SharedBook = Arc<Mutex<SignalBook>>;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggeredSignal {
    pub instrument: Instrument,
    pub fingerprint: String,
    pub price: Decimal,
    /// False when the alert history already had this fingerprint.
    pub notified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceUnavailable {
    pub instrument: Instrument,
    pub detail: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationFailed {
    pub instrument: Instrument,
    pub fingerprint: String,
    pub detail: String,
}

/// Everything one poll did. Nothing in here is fatal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PollReport {
    pub checked: usize,
    pub triggered: Vec<TriggeredSignal>,
    pub unavailable: Vec<PriceUnavailable>,
    pub notification_failures: Vec<NotificationFailed>,
    /// Alert store failures; affected signals stay pending.
    pub store_errors: Vec<String>,
}

/// Evaluates pending signals against live prices.
pub struct PriceMonitor {
    book: SharedBook,
    prices: Arc<dyn PriceSource>,
    dedup: AlertDeduplicator,
    notifier: Arc<Notifier>,
    tolerance: Tolerance,
}

impl PriceMonitor {
    pub fn new(
        book: SharedBook,
        prices: Arc<dyn PriceSource>,
        dedup: AlertDeduplicator,
        notifier: Arc<Notifier>,
        tolerance: Tolerance,
    ) -> Self {
        Self {
            book,
            prices,
            dedup,
            notifier,
            tolerance,
        }
    }

    pub fn book(&self) -> &SharedBook {
        &self.book
    }

    /// Check every pending signal once.
    ///
    /// Each instrument is quoted at most once per poll. A signal is marked
    /// triggered under the book lock, so one expired by a newer run between
    /// the snapshot and the match is left alone. The alert is recorded
    /// before it is sent; a failed send is reported and not retried.
    pub async fn poll(&self, now: DateTime<Utc>) -> PollReport {
        let pending = self.book.lock().await.pending();
        let mut report = PollReport {
            checked: pending.len(),
            ..PollReport::default()
        };
        if pending.is_empty() {
            return report;
        }

        let ticks = self.fetch_ticks(&pending, &mut report).await;

        for signal in &pending {
            let Some(tick) = ticks.get(&signal.instrument) else {
                continue;
            };
            let price = tick.price_for(signal.direction);
            if !self.tolerance.matches(signal, price) {
                debug!(
                    instrument = %signal.instrument,
                    entry = %signal.entry_price,
                    price = %price,
                    "Entry not reached"
                );
                continue;
            }
            self.fire(signal, price, now, &mut report).await;
        }

        if !report.triggered.is_empty() || !report.notification_failures.is_empty() {
            info!(
                checked = report.checked,
                triggered = report.triggered.len(),
                unavailable = report.unavailable.len(),
                failed_notifications = report.notification_failures.len(),
                "Price poll complete"
            );
        }
        report
    }

    async fn fetch_ticks(
        &self,
        pending: &[TradeSignal],
        report: &mut PollReport,
    ) -> BTreeMap<Instrument, PriceTick> {
        let instruments: BTreeSet<&Instrument> = pending.iter().map(|s| &s.instrument).collect();
        let mut ticks = BTreeMap::new();
        for instrument in instruments {
            match self.prices.get_price(instrument).await {
                Ok(tick) => {
                    ticks.insert(instrument.clone(), tick);
                }
                Err(e) => {
                    warn!(
                        instrument = %instrument,
                        source = self.prices.name(),
                        error = %e,
                        "Price unavailable, skipping this poll"
                    );
                    report.unavailable.push(PriceUnavailable {
                        instrument: instrument.clone(),
                        detail: e.to_string(),
                    });
                }
            }
        }
        ticks
    }

    async fn fire(
        &self,
        signal: &TradeSignal,
        price: Decimal,
        now: DateTime<Utc>,
        report: &mut PollReport,
    ) {
        let fingerprint = signal.fingerprint();

        // Check history before touching the book so a store outage leaves
        // the signal pending for the next poll.
        let should_notify = match self.dedup.should_notify(signal) {
            Ok(v) => v,
            Err(e) => {
                error!(instrument = %signal.instrument, error = %e, "Alert history unavailable");
                report.store_errors.push(e.to_string());
                return;
            }
        };

        if !self
            .book
            .lock()
            .await
            .mark_triggered(signal.source_run_id, &fingerprint)
        {
            debug!(instrument = %signal.instrument, "Signal superseded before it fired");
            return;
        }

        let notified = should_notify && self.claim(signal, price, now, report);
        report.triggered.push(TriggeredSignal {
            instrument: signal.instrument.clone(),
            fingerprint: fingerprint.clone(),
            price,
            notified,
        });
        if !notified {
            info!(instrument = %signal.instrument, fingerprint = %fingerprint, "Signal triggered, alert suppressed");
            return;
        }

        info!(
            instrument = %signal.instrument,
            direction = %signal.direction,
            entry = %signal.entry_price,
            price = %price,
            "Entry point hit"
        );
        let delivery = self
            .notifier
            .deliver(&Notification::entry_alert(signal, price))
            .await;
        if delivery.is_failure() {
            let detail = delivery
                .failed
                .iter()
                .map(|(sink, e)| format!("{sink}: {e}"))
                .collect::<Vec<_>>()
                .join("; ");
            error!(instrument = %signal.instrument, error = %detail, "Entry alert not delivered");
            report.notification_failures.push(NotificationFailed {
                instrument: signal.instrument.clone(),
                fingerprint,
                detail,
            });
        }
    }

    /// Record the alert. False when someone else recorded it first or the
    /// store failed; either way nothing is sent.
    fn claim(
        &self,
        signal: &TradeSignal,
        price: Decimal,
        now: DateTime<Utc>,
        report: &mut PollReport,
    ) -> bool {
        match self.dedup.record(signal, price, now) {
            Ok(inserted) => inserted,
            Err(e) => {
                error!(instrument = %signal.instrument, error = %e, "Failed to record alert");
                report.store_errors.push(e.to_string());
                false
            }
        }
    }
}
