use std::collections::BTreeSet;

use serde::Serialize;
use tracing::info;
use tras_models::signal::{SignalStatus, TradeSignal};
use tras_models::Instrument;
use uuid::Uuid;

/// What `replace_run` changed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Supersession {
    pub added: usize,
    pub expired: usize,
}

/// Every signal the monitor has seen, with its lifecycle status.
///
/// Statuses only move forward: `pending` to `triggered` or `expired`.
/// Only the latest run's view of an instrument stays actionable.
#[derive(Debug, Default)]
pub struct SignalBook {
    signals: Vec<TradeSignal>,
}

impl SignalBook {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the signals of a new run.
    ///
    /// Pending signals for any instrument the run covers are expired first.
    /// Instruments the run does not mention keep their pending signals, and
    /// a run with no signals changes nothing.
    pub fn replace_run(&mut self, run_id: Uuid, signals: Vec<TradeSignal>) -> Supersession {
        let covered: BTreeSet<&Instrument> = signals.iter().map(|s| &s.instrument).collect();

        let mut expired = 0;
        for existing in &mut self.signals {
            if existing.status == SignalStatus::Pending && covered.contains(&existing.instrument) {
                existing.status = SignalStatus::Expired;
                expired += 1;
            }
        }

        let added = signals.len();
        self.signals.extend(signals.into_iter().map(|mut s| {
            s.status = SignalStatus::Pending;
            s
        }));

        if added > 0 {
            info!(run_id = %run_id, added, expired, "Signal book updated");
        }
        Supersession { added, expired }
    }

    /// Snapshot of the signals still eligible to trigger.
    pub fn pending(&self) -> Vec<TradeSignal> {
        self.signals.iter().filter(|s| s.is_pending()).cloned().collect()
    }

    pub fn pending_count(&self) -> usize {
        self.signals.iter().filter(|s| s.is_pending()).count()
    }

    pub fn pending_instruments(&self) -> BTreeSet<Instrument> {
        self.signals
            .iter()
            .filter(|s| s.is_pending())
            .map(|s| s.instrument.clone())
            .collect()
    }

    /// Move the matching signal from `pending` to `triggered`.
    ///
    /// Returns `false` when it is no longer pending, for instance because a
    /// newer run expired it after the caller took its snapshot.
    pub fn mark_triggered(&mut self, run_id: Uuid, fingerprint: &str) -> bool {
        match self.signals.iter_mut().find(|s| {
            s.is_pending() && s.source_run_id == run_id && s.fingerprint() == fingerprint
        }) {
            Some(signal) => {
                signal.status = SignalStatus::Triggered;
                true
            }
            None => false,
        }
    }

    /// Forget settled signals, keeping pending ones.
    pub fn prune_settled(&mut self) -> usize {
        let before = self.signals.len();
        self.signals.retain(|s| s.is_pending());
        before - self.signals.len()
    }

    pub fn signals(&self) -> &[TradeSignal] {
        &self.signals
    }

    pub fn len(&self) -> usize {
        self.signals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.is_empty()
    }
}
