use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

use crate::instrument::Instrument;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => f.write_str("long"),
            Direction::Short => f.write_str("short"),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SignalStatus {
    Pending,
    Triggered,
    Expired,
}

#[derive(Debug, Error, PartialEq)]
pub enum SignalError {
    #[error("entry price must be positive, got {0}")]
    NonPositiveEntry(Decimal),

    #[error("stop loss {stop} is on the wrong side of entry {entry} for a {direction} signal")]
    StopWrongSide {
        direction: Direction,
        entry: Decimal,
        stop: Decimal,
    },

    #[error("take profit {target} is on the wrong side of entry {entry} for a {direction} signal")]
    TargetWrongSide {
        direction: Direction,
        entry: Decimal,
        target: Decimal,
    },
}

/// A structured trade idea extracted from a synthesized recommendation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeSignal {
    pub instrument: Instrument,
    pub direction: Direction,
    pub entry_price: Decimal,
    pub stop_loss: Option<Decimal>,
    pub take_profit: Option<Decimal>,
    /// Run that produced this signal. Not an ownership link.
    pub source_run_id: Uuid,
    pub status: SignalStatus,
    pub created_at: DateTime<Utc>,
    /// Short excerpt of the recommendation text the signal came from.
    pub rationale: String,
}

impl TradeSignal {
    /// Build a pending signal, enforcing price invariants.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        instrument: Instrument,
        direction: Direction,
        entry_price: Decimal,
        stop_loss: Option<Decimal>,
        take_profit: Option<Decimal>,
        source_run_id: Uuid,
        created_at: DateTime<Utc>,
        rationale: String,
    ) -> Result<Self, SignalError> {
        if entry_price <= Decimal::ZERO {
            return Err(SignalError::NonPositiveEntry(entry_price));
        }
        if let Some(stop) = stop_loss {
            let ok = match direction {
                Direction::Long => stop < entry_price,
                Direction::Short => stop > entry_price,
            };
            if !ok {
                return Err(SignalError::StopWrongSide {
                    direction,
                    entry: entry_price,
                    stop,
                });
            }
        }
        if let Some(target) = take_profit {
            let ok = match direction {
                Direction::Long => target > entry_price,
                Direction::Short => target < entry_price,
            };
            if !ok {
                return Err(SignalError::TargetWrongSide {
                    direction,
                    entry: entry_price,
                    target,
                });
            }
        }
        Ok(Self {
            instrument,
            direction,
            entry_price,
            stop_loss,
            take_profit,
            source_run_id,
            status: SignalStatus::Pending,
            created_at,
            rationale,
        })
    }

    pub fn is_pending(&self) -> bool {
        self.status == SignalStatus::Pending
    }

    /// Deterministic identity used for alert deduplication.
    ///
    /// SHA-256 over instrument, direction, entry, target and stop, each price
    /// rounded to a tenth of a pip so formatting noise does not split one idea
    /// into two fingerprints.
    pub fn fingerprint(&self) -> String {
        let scale = self.instrument.price_scale();
        let price = |p: Option<Decimal>| match p {
            Some(v) => v.round_dp(scale).normalize().to_string(),
            None => "-".to_string(),
        };
        let material = format!(
            "{}|{}|{}|{}|{}",
            self.instrument,
            self.direction,
            price(Some(self.entry_price)),
            price(self.take_profit),
            price(self.stop_loss),
        );
        let mut hasher = Sha256::new();
        hasher.update(material.as_bytes());
        hex::encode(hasher.finalize())
    }
}

/// A live quote. Never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PriceTick {
    pub instrument: Instrument,
    pub bid: Option<Decimal>,
    pub ask: Option<Decimal>,
    pub mid: Decimal,
    pub observed_at: DateTime<Utc>,
}

impl PriceTick {
    pub fn mid(instrument: Instrument, mid: Decimal, observed_at: DateTime<Utc>) -> Self {
        Self {
            instrument,
            bid: None,
            ask: None,
            mid,
            observed_at,
        }
    }

    /// Price a position in `direction` would transact at: ask for longs, bid
    /// for shorts, mid when the side is unknown.
    pub fn price_for(&self, direction: Direction) -> Decimal {
        match direction {
            Direction::Long => self.ask.unwrap_or(self.mid),
            Direction::Short => self.bid.unwrap_or(self.mid),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn eurusd() -> Instrument {
        "EURUSD".parse().unwrap()
    }

    fn long(entry: Decimal, stop: Option<Decimal>, target: Option<Decimal>) -> TradeSignal {
        TradeSignal::new(
            eurusd(),
            Direction::Long,
            entry,
            stop,
            target,
            Uuid::nil(),
            Utc::now(),
            String::new(),
        )
        .unwrap()
    }

    #[test]
    fn rejects_non_positive_entry() {
        let err = TradeSignal::new(
            eurusd(),
            Direction::Long,
            dec!(0),
            None,
            None,
            Uuid::nil(),
            Utc::now(),
            String::new(),
        )
        .unwrap_err();
        assert_eq!(err, SignalError::NonPositiveEntry(dec!(0)));
    }

    #[test]
    fn rejects_stop_and_target_on_wrong_side() {
        let stop_above = TradeSignal::new(
            eurusd(),
            Direction::Long,
            dec!(1.1000),
            Some(dec!(1.1050)),
            None,
            Uuid::nil(),
            Utc::now(),
            String::new(),
        );
        assert!(matches!(stop_above, Err(SignalError::StopWrongSide { .. })));

        let target_above_short = TradeSignal::new(
            eurusd(),
            Direction::Short,
            dec!(1.1000),
            Some(dec!(1.1050)),
            Some(dec!(1.1100)),
            Uuid::nil(),
            Utc::now(),
            String::new(),
        );
        assert!(matches!(
            target_above_short,
            Err(SignalError::TargetWrongSide { .. })
        ));
    }

    #[test]
    fn fingerprint_ignores_formatting_and_run() {
        let a = long(dec!(1.1000), Some(dec!(1.0950)), Some(dec!(1.1100)));
        let mut b = long(dec!(1.10000), Some(dec!(1.095)), Some(dec!(1.11)));
        b.source_run_id = Uuid::new_v4();
        b.rationale = "different words".to_string();
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64);
    }

    #[test]
    fn fingerprint_distinguishes_levels() {
        let a = long(dec!(1.1000), Some(dec!(1.0950)), Some(dec!(1.1100)));
        let b = long(dec!(1.1000), Some(dec!(1.0950)), None);
        let c = long(dec!(1.1001), Some(dec!(1.0950)), Some(dec!(1.1100)));
        assert_ne!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());
    }

    #[test]
    fn tick_side_selection() {
        let tick = PriceTick {
            instrument: eurusd(),
            bid: Some(dec!(1.0999)),
            ask: Some(dec!(1.1001)),
            mid: dec!(1.1000),
            observed_at: Utc::now(),
        };
        assert_eq!(tick.price_for(Direction::Long), dec!(1.1001));
        assert_eq!(tick.price_for(Direction::Short), dec!(1.0999));

        let mid_only = PriceTick::mid(eurusd(), dec!(1.2), Utc::now());
        assert_eq!(mid_only.price_for(Direction::Long), dec!(1.2));
    }
}
