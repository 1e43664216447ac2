use rust_decimal::Decimal;
use tras_models::signal::{Direction, TradeSignal};
use tras_models::{Instrument, MonitorConfig};

/// Entry matching window: a fixed number of pips and a percentage of the
/// entry price. A price inside either window matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tolerance {
    pub pips: Decimal,
    pub percent: Decimal,
}

impl Tolerance {
    pub fn new(pips: Decimal, percent: Decimal) -> Self {
        Self { pips, percent }
    }

    pub fn from_config(config: &MonitorConfig) -> Self {
        Self::new(config.tolerance_pips, config.tolerance_percent)
    }

    /// Widest allowed distance from `entry`.
    pub fn band(&self, instrument: &Instrument, entry: Decimal) -> Decimal {
        let absolute = self.pips * instrument.pip_size();
        let relative = entry * self.percent / Decimal::ONE_HUNDRED;
        absolute.max(relative)
    }

    /// Long entries fire once price is at or below `entry + band`; shorts
    /// once it is at or above `entry - band`.
    pub fn matches(&self, signal: &TradeSignal, price: Decimal) -> bool {
        let band = self.band(&signal.instrument, signal.entry_price);
        match signal.direction {
            Direction::Long => price <= signal.entry_price + band,
            Direction::Short => price >= signal.entry_price - band,
        }
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::from_config(&MonitorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use uuid::Uuid;

    fn signal(pair: &str, direction: Direction, entry: Decimal) -> TradeSignal {
        TradeSignal::new(
            pair.parse().unwrap(),
            direction,
            entry,
            None,
            None,
            Uuid::new_v4(),
            Utc::now(),
            String::new(),
        )
        .unwrap()
    }

    #[test]
    fn long_within_ten_pips() {
        let tol = Tolerance::new(dec!(10), dec!(0.1));
        let s = signal("EURUSD", Direction::Long, dec!(1.2000));
        assert!(tol.matches(&s, dec!(1.2009)));
        assert!(!tol.matches(&s, dec!(1.2015)));
        assert!(tol.matches(&s, dec!(1.1950)));
    }

    #[test]
    fn short_is_mirrored() {
        let tol = Tolerance::new(dec!(10), dec!(0));
        let s = signal("EURUSD", Direction::Short, dec!(1.2000));
        assert!(tol.matches(&s, dec!(1.1991)));
        assert!(!tol.matches(&s, dec!(1.1985)));
        assert!(tol.matches(&s, dec!(1.2100)));
    }

    #[test]
    fn either_window_is_enough() {
        // 2 pips is 0.0002; 0.1% of 1.2000 is 0.0012.
        let tol = Tolerance::new(dec!(2), dec!(0.1));
        let s = signal("EURUSD", Direction::Long, dec!(1.2000));
        assert_eq!(tol.band(&s.instrument, s.entry_price), dec!(0.0012));
        assert!(tol.matches(&s, dec!(1.2011)));

        let pips_only = Tolerance::new(dec!(2), dec!(0));
        assert!(!pips_only.matches(&s, dec!(1.2011)));
    }

    #[test]
    fn jpy_pips_are_wider() {
        let tol = Tolerance::new(dec!(10), dec!(0));
        let s = signal("USDJPY", Direction::Long, dec!(151.20));
        assert_eq!(tol.band(&s.instrument, s.entry_price), dec!(0.10));
        assert!(tol.matches(&s, dec!(151.29)));
        assert!(!tol.matches(&s, dec!(151.35)));
    }
}
