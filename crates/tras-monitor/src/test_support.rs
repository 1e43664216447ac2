//! In-memory price feeds and notification sinks for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tras_models::{Instrument, PriceTick};

use crate::error::{NotifyError, PriceError};
use crate::notify::{Notification, NotificationKind, NotificationSink};
use crate::price::PriceSource;

/// Quotes set by the test. Unknown instruments are `Unsupported`.
#[derive(Default)]
pub struct StaticPriceSource {
    quotes: Mutex<HashMap<Instrument, Result<Decimal, PriceError>>>,
    calls: Mutex<Vec<Instrument>>,
}

impl StaticPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, pair: &str, mid: Decimal) {
        if let (Ok(instrument), Ok(mut quotes)) = (pair.parse::<Instrument>(), self.quotes.lock()) {
            quotes.insert(instrument, Ok(mid));
        }
    }

    pub fn fail(&self, pair: &str, error: PriceError) {
        if let (Ok(instrument), Ok(mut quotes)) = (pair.parse::<Instrument>(), self.quotes.lock()) {
            quotes.insert(instrument, Err(error));
        }
    }

    /// Instruments requested so far, in order.
    pub fn calls(&self) -> Vec<Instrument> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PriceSource for StaticPriceSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn get_price(&self, instrument: &Instrument) -> Result<PriceTick, PriceError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(instrument.clone());
        }
        let quote = self
            .quotes
            .lock()
            .map_err(|e| PriceError::Feed(e.to_string()))?
            .get(instrument)
            .cloned()
            .unwrap_or_else(|| Err(PriceError::Unsupported(instrument.clone())));
        quote.map(|mid| PriceTick::mid(instrument.clone(), mid, Utc::now()))
    }
}

/// Records what it is asked to send. Can fail the first N attempts.
pub struct RecordingSink {
    name: String,
    fail_first: u32,
    only: Option<NotificationKind>,
    attempts: AtomicU32,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new(name: &str) -> Self {
        Self::failing_first(name, 0)
    }

    pub fn failing_first(name: &str, failures: u32) -> Self {
        Self {
            name: name.to_string(),
            fail_first: failures,
            only: None,
            attempts: AtomicU32::new(0),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Accept only notifications of `kind`.
    pub fn only(mut self, kind: NotificationKind) -> Self {
        self.only = Some(kind);
        self
    }

    pub fn attempts(&self) -> u32 {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().map(|s| s.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, kind: NotificationKind) -> bool {
        self.only.map_or(true, |only| only == kind)
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst);
        if attempt < self.fail_first {
            return Err(NotifyError::Transport(format!("{} unreachable", self.name)));
        }
        if let Ok(mut sent) = self.sent.lock() {
            sent.push(notification.clone());
        }
        Ok(())
    }
}
