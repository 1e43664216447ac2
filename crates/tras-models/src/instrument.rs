use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// ISO codes (plus the two quoted metals) the system knows how to pair up.
pub const KNOWN_CODES: &[&str] = &[
    "USD", "EUR", "GBP", "JPY", "CHF", "AUD", "CAD", "NZD", "SEK", "NOK", "DKK", "SGD", "HKD",
    "MXN", "ZAR", "TRY", "PLN", "CNH", "CNY", "XAU", "XAG",
];

pub fn is_known_code(code: &str) -> bool {
    KNOWN_CODES.contains(&code)
}

/// A currency pair in canonical form: six upper-case letters, base then quote (`EURUSD`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Instrument(String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidInstrument(pub String);

impl fmt::Display for InvalidInstrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a recognised currency pair: {:?}", self.0)
    }
}

impl std::error::Error for InvalidInstrument {}

impl Instrument {
    /// Build from two codes. Both must be known and distinct.
    pub fn from_codes(base: &str, quote: &str) -> Result<Self, InvalidInstrument> {
        let base = base.to_ascii_uppercase();
        let quote = quote.to_ascii_uppercase();
        if !is_known_code(&base) || !is_known_code(&quote) || base == quote {
            return Err(InvalidInstrument(format!("{base}/{quote}")));
        }
        Ok(Self(format!("{base}{quote}")))
    }

    pub fn base(&self) -> &str {
        &self.0[..3]
    }

    pub fn quote(&self) -> &str {
        &self.0[3..]
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// `EUR/USD` form, used in notifications and logs.
    pub fn pair_label(&self) -> String {
        format!("{}/{}", self.base(), self.quote())
    }

    /// Size of one pip in quote-currency units.
    pub fn pip_size(&self) -> Decimal {
        match (self.base(), self.quote()) {
            ("XAU", _) => Decimal::new(1, 1),
            ("XAG", _) => Decimal::new(1, 3),
            (_, "JPY") => Decimal::new(1, 2),
            _ => Decimal::new(1, 4),
        }
    }

    /// Decimal places of one tenth of a pip (fractional pip), the precision
    /// used when comparing or fingerprinting prices.
    pub fn price_scale(&self) -> u32 {
        self.pip_size().scale() + 1
    }
}

impl FromStr for Instrument {
    type Err = InvalidInstrument;

    /// Accepts `EURUSD`, `EUR/USD`, `eur_usd`, `EUR USD`, `EUR-USD`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let letters: String = s
            .chars()
            .filter(|c| !matches!(c, '/' | '_' | '-' | ' '))
            .collect();
        if letters.len() != 6 || !letters.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(InvalidInstrument(s.to_string()));
        }
        Self::from_codes(&letters[..3], &letters[3..]).map_err(|_| InvalidInstrument(s.to_string()))
    }
}

impl TryFrom<String> for Instrument {
    type Error = InvalidInstrument;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Instrument> for String {
    fn from(value: Instrument) -> Self {
        value.0
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
