use std::str::FromStr;

use rust_decimal::Decimal;

/// A price level as written in recommendation text.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceMention {
    Price(Decimal),
    /// Distance from the entry, in pips.
    Pips(Decimal),
    /// Two prices written as a range (`1.0990-1.1000`, `1.0990 to 1.1000`).
    Range(Decimal, Decimal),
    /// A numeric token we refuse to guess at, kept verbatim.
    Malformed(String),
}

/// Parse a single numeric token.
///
/// Plain decimals (`1.1000`, `151.20`) are accepted. Comma thousands
/// separators are accepted only when the reading is unambiguous: correct
/// 3-digit grouping plus either a decimal point (`2,345.50`) or several
/// groups (`1,234,567`). Tokens like `1,1000` or `1,100` could be a decimal
/// comma and are rejected.
pub fn parse_number(token: &str) -> Option<Decimal> {
    let token = token.trim();
    if token.is_empty() {
        return None;
    }

    let (int_part, frac_part) = match token.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (token, None),
    };

    if let Some(frac) = frac_part {
        if frac.is_empty() || !frac.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
    }

    let digits: String = if int_part.contains(',') {
        let groups: Vec<&str> = int_part.split(',').collect();
        let well_grouped = !groups[0].is_empty()
            && groups[0].len() <= 3
            && groups[1..].iter().all(|g| g.len() == 3)
            && groups.iter().all(|g| g.chars().all(|c| c.is_ascii_digit()));
        let unambiguous = frac_part.is_some() || groups.len() > 2;
        if !well_grouped || !unambiguous {
            return None;
        }
        groups.concat()
    } else {
        if int_part.is_empty() || !int_part.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        int_part.to_string()
    };

    let normalized = match frac_part {
        Some(frac) => format!("{digits}.{frac}"),
        None => digits,
    };
    Decimal::from_str(&normalized).ok()
}

/// Build a mention from the pieces of a matched value: the first number,
/// an optional second number of a range, and an optional unit word.
pub fn mention_from_parts(first: &str, second: Option<&str>, unit: Option<&str>) -> PriceMention {
    let Some(a) = parse_number(first) else {
        return PriceMention::Malformed(first.to_string());
    };

    if let Some(second) = second {
        return match parse_number(second) {
            Some(b) if a == b => PriceMention::Price(a),
            Some(b) => PriceMention::Range(a, b),
            None => PriceMention::Malformed(second.to_string()),
        };
    }

    match unit.map(|u| u.to_ascii_lowercase()) {
        Some(u) if u.starts_with("pip") || u.starts_with("point") || u == "pts" => {
            PriceMention::Pips(a)
        }
        _ => PriceMention::Price(a),
    }
}
