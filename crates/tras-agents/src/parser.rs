use std::collections::HashSet;
use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use tras_models::analysis::SynthesizedRecommendation;
use tras_models::instrument::Instrument;
use tras_models::signal::{Direction, TradeSignal};

use crate::error::AgentError;
use crate::extract::{Candidate, TextRules};
use crate::price_text::PriceMention;

/// Why a candidate was rejected or adjusted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "detail")]
pub enum ParseIssue {
    UnknownInstrument(String),
    MissingDirection,
    ConflictingDirection,
    MissingEntry,
    EntryRange,
    EntryInPips,
    AmbiguousEntry,
    AmbiguousStop,
    MalformedNumber(String),
    InvalidLevels(String),
    /// Several targets were given; the first was kept. Not a rejection.
    ExtraTargetsIgnored,
}

impl fmt::Display for ParseIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseIssue::UnknownInstrument(s) => write!(f, "unknown instrument {s:?}"),
            ParseIssue::MissingDirection => f.write_str("no direction given"),
            ParseIssue::ConflictingDirection => f.write_str("both long and short wording"),
            ParseIssue::MissingEntry => f.write_str("no entry price"),
            ParseIssue::EntryRange => f.write_str("entry given as a range"),
            ParseIssue::EntryInPips => f.write_str("entry given in pips"),
            ParseIssue::AmbiguousEntry => f.write_str("several different entry prices"),
            ParseIssue::AmbiguousStop => f.write_str("several different stop losses"),
            ParseIssue::MalformedNumber(s) => write!(f, "malformed number {s:?}"),
            ParseIssue::InvalidLevels(s) => write!(f, "invalid levels: {s}"),
            ParseIssue::ExtraTargetsIgnored => f.write_str("several targets, kept the first"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParseWarning {
    pub instrument: Option<Instrument>,
    pub issue: ParseIssue,
    pub excerpt: String,
}

impl ParseWarning {
    /// Whether the candidate was discarded.
    pub fn is_rejection(&self) -> bool {
        !matches!(self.issue, ParseIssue::ExtraTargetsIgnored)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub signals: Vec<TradeSignal>,
    pub warnings: Vec<ParseWarning>,
}

impl ParseOutcome {
    pub fn rejected(&self) -> usize {
        self.warnings.iter().filter(|w| w.is_rejection()).count()
    }
}

/// Turns a synthesized recommendation into validated trade signals.
///
/// Pure: the same text always yields the same signals, stamped with the
/// recommendation's run id and production time. A fenced or inline JSON
/// object carrying a `recommendations` (or `signals`, `trades`,
/// `opportunities`) array takes precedence over free-text heuristics.
pub struct RecommendationParser {
    rules: TextRules,
}

impl RecommendationParser {
    pub fn new() -> Result<Self, AgentError> {
        Ok(Self {
            rules: TextRules::new()?,
        })
    }

    pub fn parse(&self, rec: &SynthesizedRecommendation) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        let candidates = match self.structured_candidates(&rec.text, &mut outcome.warnings) {
            Some(candidates) => {
                debug!(run_id = %rec.run_id, "Parsing structured recommendation block");
                candidates
            }
            None => self.rules.candidates(&rec.text),
        };

        let mut seen = HashSet::new();
        for candidate in candidates {
            let Some(signal) = validate(candidate, rec, &mut outcome.warnings) else {
                continue;
            };
            if seen.insert(signal.fingerprint()) {
                outcome.signals.push(signal);
            } else {
                debug!(instrument = %signal.instrument, "Dropping duplicate signal");
            }
        }

        for w in &outcome.warnings {
            warn!(
                run_id = %rec.run_id,
                instrument = ?w.instrument.as_ref().map(|i| i.as_str()),
                issue = %w.issue,
                excerpt = %truncate(&w.excerpt, 120),
                "Recommendation parse warning"
            );
        }
        info!(
            run_id = %rec.run_id,
            signals = outcome.signals.len(),
            rejected = outcome.rejected(),
            "Parsed recommendation"
        );
        outcome
    }

    /// Candidates from an embedded JSON object, or `None` when the text has
    /// no usable JSON and the free-text rules should run instead.
    fn structured_candidates(
        &self,
        text: &str,
        warnings: &mut Vec<ParseWarning>,
    ) -> Option<Vec<Candidate>> {
        let payload = trade_payload(text)?;
        let items = trade_items(&payload)?;

        let mut candidates = Vec::new();
        for item in items {
            let excerpt = item.to_string();
            let Some(raw_pair) = field(item, PAIR_KEYS).and_then(|v| v.as_str()) else {
                warnings.push(ParseWarning {
                    instrument: None,
                    issue: ParseIssue::UnknownInstrument(String::new()),
                    excerpt,
                });
                continue;
            };
            let instrument = match raw_pair.parse::<Instrument>() {
                Ok(i) => i,
                Err(_) => {
                    warnings.push(ParseWarning {
                        instrument: None,
                        issue: ParseIssue::UnknownInstrument(raw_pair.to_string()),
                        excerpt,
                    });
                    continue;
                }
            };

            let directions = field(item, DIRECTION_KEYS)
                .and_then(|v| v.as_str())
                .and_then(|s| self.rules.direction(s))
                .into_iter()
                .collect();

            candidates.push(Candidate {
                instrument,
                directions,
                entries: self.json_levels(item, ENTRY_KEYS),
                stops: self.json_levels(item, STOP_KEYS),
                targets: self.json_levels(item, TARGET_KEYS),
                excerpt: field(item, RATIONALE_KEYS)
                    .and_then(|v| v.as_str())
                    .map(str::to_string)
                    .unwrap_or(excerpt),
            });
        }
        Some(candidates)
    }

    fn json_levels(&self, item: &serde_json::Value, keys: &[&str]) -> Vec<PriceMention> {
        let values: Vec<&serde_json::Value> = match field(item, keys) {
            Some(serde_json::Value::Array(arr)) => arr.iter().collect(),
            Some(serde_json::Value::Null) | None => Vec::new(),
            Some(v) => vec![v],
        };
        values
            .into_iter()
            .map(|v| match v {
                serde_json::Value::Number(n) => self.rules.mention(&n.to_string()),
                serde_json::Value::String(s) => self.rules.mention(s),
                other => PriceMention::Malformed(other.to_string()),
            })
            .collect()
    }
}

const LIST_KEYS: &[&str] = &["recommendations", "signals", "trades", "opportunities"];
const PAIR_KEYS: &[&str] = &["pair", "currency_pair", "instrument", "symbol"];
const DIRECTION_KEYS: &[&str] = &["direction", "action", "side", "type"];
const ENTRY_KEYS: &[&str] = &["entry", "entry_price", "entryPrice"];
const STOP_KEYS: &[&str] = &["stop_loss", "stopLoss", "stop", "sl"];
const TARGET_KEYS: &[&str] = &["take_profit", "takeProfit", "target", "targets", "exit", "tp"];
const RATIONALE_KEYS: &[&str] = &["rationale", "reason", "recommendation"];

fn field<'v>(item: &'v serde_json::Value, keys: &[&str]) -> Option<&'v serde_json::Value> {
    keys.iter().find_map(|k| item.get(*k))
}

/// Check one candidate and build a signal, or record why not.
fn validate(
    c: Candidate,
    rec: &SynthesizedRecommendation,
    warnings: &mut Vec<ParseWarning>,
) -> Option<TradeSignal> {
    let reject = |issue: ParseIssue, warnings: &mut Vec<ParseWarning>| {
        warnings.push(ParseWarning {
            instrument: Some(c.instrument.clone()),
            issue,
            excerpt: c.excerpt.clone(),
        });
    };

    if let Some(bad) = first_malformed(&[&c.entries, &c.stops, &c.targets]) {
        reject(ParseIssue::MalformedNumber(bad), warnings);
        return None;
    }

    let direction = match c.directions.as_slice() {
        [] => {
            reject(ParseIssue::MissingDirection, warnings);
            return None;
        }
        [d] => *d,
        _ => {
            reject(ParseIssue::ConflictingDirection, warnings);
            return None;
        }
    };

    let entry = match single_entry(&c.entries) {
        Ok(entry) => entry,
        Err(issue) => {
            reject(issue, warnings);
            return None;
        }
    };

    let pip = c.instrument.pip_size();
    let resolve = |m: &PriceMention, away: bool| -> Vec<Decimal> {
        match m {
            PriceMention::Price(p) => vec![*p],
            PriceMention::Range(a, b) => vec![*a, *b],
            PriceMention::Pips(n) => {
                let offset = *n * pip;
                // Stops sit against the trade, targets with it.
                let up = matches!(
                    (direction, away),
                    (Direction::Long, true) | (Direction::Short, false)
                );
                vec![if up { entry + offset } else { entry - offset }]
            }
            PriceMention::Malformed(_) => Vec::new(),
        }
    };

    let stops = distinct_prices(c.stops.iter().flat_map(|m| resolve(m, false)));
    let stop_loss = match stops.as_slice() {
        [] => None,
        [s] => Some(*s),
        _ => {
            reject(ParseIssue::AmbiguousStop, warnings);
            return None;
        }
    };

    let targets = distinct_prices(c.targets.iter().flat_map(|m| resolve(m, true)));
    if targets.len() > 1 {
        reject(ParseIssue::ExtraTargetsIgnored, warnings);
    }
    let take_profit = targets.first().copied();

    match TradeSignal::new(
        c.instrument.clone(),
        direction,
        entry,
        stop_loss,
        take_profit,
        rec.run_id,
        rec.produced_at,
        c.excerpt.clone(),
    ) {
        Ok(signal) => Some(signal),
        Err(e) => {
            reject(ParseIssue::InvalidLevels(e.to_string()), warnings);
            None
        }
    }
}

fn first_malformed(groups: &[&Vec<PriceMention>]) -> Option<String> {
    groups.iter().flat_map(|g| g.iter()).find_map(|m| match m {
        PriceMention::Malformed(s) => Some(s.clone()),
        _ => None,
    })
}

fn single_entry(entries: &[PriceMention]) -> Result<Decimal, ParseIssue> {
    if entries.is_empty() {
        return Err(ParseIssue::MissingEntry);
    }
    if entries.iter().any(|m| matches!(m, PriceMention::Range(..))) {
        return Err(ParseIssue::EntryRange);
    }
    if entries.iter().any(|m| matches!(m, PriceMention::Pips(_))) {
        return Err(ParseIssue::EntryInPips);
    }
    let prices = distinct_prices(entries.iter().filter_map(|m| match m {
        PriceMention::Price(p) => Some(*p),
        _ => None,
    }));
    match prices.as_slice() {
        [p] => Ok(*p),
        _ => Err(ParseIssue::AmbiguousEntry),
    }
}

/// Distinct values in first-seen order, comparing numerically so `1.10`
/// and `1.1000` count as one.
fn distinct_prices(prices: impl Iterator<Item = Decimal>) -> Vec<Decimal> {
    let mut out: Vec<Decimal> = Vec::new();
    for p in prices {
        if !out.contains(&p) {
            out.push(p);
        }
    }
    out
}

fn truncate(s: &str, max_chars: usize) -> &str {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}

/// The first JSON object in `text` that carries trades. Fenced code blocks
/// are tried before bare objects in the prose, and objects with neither a
/// trade list nor a pair key are passed over.
fn trade_payload(text: &str) -> Option<serde_json::Value> {
    fenced_blocks(text)
        .into_iter()
        .chain(balanced_objects(text))
        .filter_map(|body| serde_json::from_str::<serde_json::Value>(body).ok())
        .find(|value| trade_items(value).is_some())
}

/// Trade objects in a payload: the first non-empty list under a known key,
/// or the payload itself when it names a pair.
fn trade_items(value: &serde_json::Value) -> Option<Vec<&serde_json::Value>> {
    let listed = LIST_KEYS
        .iter()
        .filter_map(|key| value.get(*key).and_then(|v| v.as_array()))
        .find(|items| !items.is_empty());
    match listed {
        Some(items) => Some(items.iter().collect()),
        None if field(value, PAIR_KEYS).is_some() => Some(vec![value]),
        None => None,
    }
}

/// Bodies of ``` fences, with any language tag line removed.
fn fenced_blocks(text: &str) -> Vec<&str> {
    text.split("```")
        .skip(1)
        .step_by(2)
        .map(|block| match block.split_once('\n') {
            Some((tag, body)) if !tag.contains('{') => body.trim(),
            _ => block.trim(),
        })
        .filter(|body| body.starts_with('{'))
        .collect()
}

/// Every top-level `{ ... }` span, skipping braces inside JSON strings.
fn balanced_objects(text: &str) -> Vec<&str> {
    let mut spans = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (i, ch) in text.char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' if depth > 0 => in_string = true,
            '{' => {
                if depth == 0 {
                    start = i;
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    spans.push(&text[start..=i]);
                }
            }
            _ => {}
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tras_models::signal::SignalStatus;
    use uuid::Uuid;

    use crate::test_support::EURUSD_LONG_RECOMMENDATION;

    fn rec(text: &str) -> SynthesizedRecommendation {
        SynthesizedRecommendation {
            run_id: Uuid::new_v4(),
            text: text.to_string(),
            sources: vec!["chatgpt".into()],
            synthesizer: "gemini".into(),
            produced_at: Utc::now(),
        }
    }

    fn parser() -> RecommendationParser {
        RecommendationParser::new().unwrap()
    }

    fn only_issue(outcome: &ParseOutcome) -> &ParseIssue {
        assert_eq!(outcome.warnings.len(), 1, "{:?}", outcome.warnings);
        &outcome.warnings[0].issue
    }

    #[test]
    fn parses_structured_block() {
        let r = rec(EURUSD_LONG_RECOMMENDATION);
        let outcome = parser().parse(&r);
        assert!(outcome.warnings.is_empty());
        assert_eq!(outcome.signals.len(), 1);

        let s = &outcome.signals[0];
        assert_eq!(s.instrument.as_str(), "EURUSD");
        assert_eq!(s.direction, Direction::Long);
        assert_eq!(s.entry_price, dec!(1.1000));
        assert_eq!(s.stop_loss, Some(dec!(1.0950)));
        assert_eq!(s.take_profit, Some(dec!(1.1100)));
        assert_eq!(s.source_run_id, r.run_id);
        assert_eq!(s.status, SignalStatus::Pending);
        assert_eq!(s.created_at, r.produced_at);
    }

    #[test]
    fn parsing_is_idempotent() {
        let r = rec(EURUSD_LONG_RECOMMENDATION);
        let p = parser();
        assert_eq!(p.parse(&r), p.parse(&r));
    }

    #[test]
    fn multiple_ideas_become_separate_signals() {
        let text = "\
### 1. EUR/USD – Long
Entry: 1.1000 | Stop Loss: 1.0950 | Target: 1.1100

### 2. USD/JPY – Short
Entry: 151.20 | Stop Loss: 152.00 | Take Profit: 149.50
";
        let outcome = parser().parse(&rec(text));
        assert_eq!(outcome.signals.len(), 2);
        assert_eq!(outcome.signals[1].instrument.as_str(), "USDJPY");
        assert_eq!(outcome.signals[1].direction, Direction::Short);
        assert_eq!(outcome.signals[1].stop_loss, Some(dec!(152.00)));
    }

    #[test]
    fn missing_direction_is_rejected() {
        let outcome = parser().parse(&rec("PAIR: EUR/USD\nENTRY: 1.1000\nSTOP LOSS: 1.0950"));
        assert!(outcome.signals.is_empty());
        assert_eq!(only_issue(&outcome), &ParseIssue::MissingDirection);
    }

    #[test]
    fn missing_entry_is_rejected() {
        let outcome = parser().parse(&rec("PAIR: EUR/USD\nDIRECTION: BUY\nSTOP LOSS: 1.0950"));
        assert!(outcome.signals.is_empty());
        assert_eq!(only_issue(&outcome), &ParseIssue::MissingEntry);
    }

    #[test]
    fn upper_case_prose_before_pair_still_parses() {
        let outcome = parser().parse(&rec("BUY EUR/USD at 1.1000, stop 1.0950, target 1.1100."));
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.signals.len(), 1);
        let s = &outcome.signals[0];
        assert_eq!(s.instrument.as_str(), "EURUSD");
        assert_eq!(s.direction, Direction::Long);
        assert_eq!(s.stop_loss, Some(dec!(1.0950)));

        let outcome = parser().parse(&rec(
            "We like THE USD/JPY short here. SELL USD/JPY at 151.20, stop 152.00, target 149.50.",
        ));
        assert_eq!(outcome.signals.len(), 1);
        assert_eq!(outcome.signals[0].instrument.as_str(), "USDJPY");
        assert_eq!(outcome.signals[0].entry_price, dec!(151.20));
    }

    #[test]
    fn direction_line_before_stop_loss_keeps_the_stop() {
        let outcome = parser().parse(&rec(
            "PAIR: EUR/USD\nENTRY: 1.1000\nDIRECTION: BUY\nSTOP LOSS: 1.0950\nTAKE PROFIT: 1.1100",
        ));
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        let s = &outcome.signals[0];
        assert_eq!(s.entry_price, dec!(1.1000));
        assert_eq!(s.stop_loss, Some(dec!(1.0950)));
        assert_eq!(s.take_profit, Some(dec!(1.1100)));
    }

    #[test]
    fn conflicting_direction_is_rejected() {
        let text = "USD/CAD\nEntry 1.3600, stop 1.3550. Bullish bias but a bearish reversal is possible.";
        let outcome = parser().parse(&rec(text));
        assert!(outcome.signals.is_empty());
        assert_eq!(only_issue(&outcome), &ParseIssue::ConflictingDirection);
    }

    #[test]
    fn entry_range_is_rejected() {
        let outcome = parser().parse(&rec("PAIR: GBP/USD\nDIRECTION: SELL\nENTRY: 1.2700-1.2720"));
        assert_eq!(only_issue(&outcome), &ParseIssue::EntryRange);
    }

    #[test]
    fn entry_in_pips_is_rejected() {
        let outcome =
            parser().parse(&rec("PAIR: GBP/USD\nDIRECTION: SELL\nENTRY: 20 pips above market"));
        assert_eq!(only_issue(&outcome), &ParseIssue::EntryInPips);
    }

    #[test]
    fn several_entries_are_rejected() {
        let outcome = parser().parse(&rec(
            "PAIR: EUR/USD\nDIRECTION: BUY\nENTRY: 1.1000\nRe-entry: 1.0950",
        ));
        assert_eq!(only_issue(&outcome), &ParseIssue::AmbiguousEntry);
    }

    #[test]
    fn malformed_number_fails_closed() {
        let outcome = parser().parse(&rec("PAIR: EUR/USD\nDIRECTION: BUY\nENTRY: 1,1000"));
        assert!(outcome.signals.is_empty());
        assert_eq!(
            only_issue(&outcome),
            &ParseIssue::MalformedNumber("1,1000".to_string())
        );
    }

    #[test]
    fn wrong_side_stop_is_rejected() {
        let outcome = parser().parse(&rec(
            "PAIR: EUR/USD\nDIRECTION: BUY\nENTRY: 1.1000\nSTOP LOSS: 1.1050",
        ));
        assert!(outcome.signals.is_empty());
        assert!(matches!(only_issue(&outcome), ParseIssue::InvalidLevels(_)));
    }

    #[test]
    fn pip_levels_are_converted_from_entry() {
        let outcome = parser().parse(&rec(
            "PAIR: USD/JPY\nDIRECTION: SELL\nENTRY: 151.20\nSTOP LOSS: 50 pips\nTAKE PROFIT: 120 pips",
        ));
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        let s = &outcome.signals[0];
        assert_eq!(s.stop_loss, Some(dec!(151.70)));
        assert_eq!(s.take_profit, Some(dec!(150.00)));
    }

    #[test]
    fn extra_targets_keep_the_first() {
        let outcome = parser().parse(&rec(
            "EUR/USD long\nEntry: 1.1000\nStop: 1.0950\nTP1: 1.1050\nTP2: 1.1100",
        ));
        assert_eq!(outcome.signals.len(), 1);
        assert_eq!(outcome.signals[0].take_profit, Some(dec!(1.1050)));
        assert_eq!(only_issue(&outcome), &ParseIssue::ExtraTargetsIgnored);
        assert_eq!(outcome.rejected(), 0);
    }

    #[test]
    fn thousands_separators_are_accepted() {
        let outcome = parser().parse(&rec(
            "PAIR: XAU/USD\nDIRECTION: BUY\nENTRY: 2,345.50\nSTOP LOSS: 2,330.00",
        ));
        assert_eq!(outcome.signals[0].entry_price, dec!(2345.50));
        assert_eq!(outcome.signals[0].stop_loss, Some(dec!(2330.00)));
    }

    #[test]
    fn duplicate_ideas_are_collapsed() {
        let text = "\
PAIR: EUR/USD
DIRECTION: BUY
ENTRY: 1.1000

PAIR: EUR/USD
DIRECTION: BUY
ENTRY: 1.10000
";
        let outcome = parser().parse(&rec(text));
        assert_eq!(outcome.signals.len(), 1);
    }

    #[test]
    fn structured_json_block_takes_precedence() {
        let text = r#"Here are my final trades:
```json
{"recommendations": [
  {"pair": "EURUSD", "direction": "BUY", "entry": 1.1000, "stop_loss": "1.0950", "target": 1.11},
  {"pair": "GBP/USD", "direction": "SELL", "entry": "1.2700-1.2720"},
  {"pair": "XXX/YYY", "direction": "SELL", "entry": 1.5}
]}
```
EUR/USD mentioned again in prose: entry 1.2000."#;
        let outcome = parser().parse(&rec(text));
        assert_eq!(outcome.signals.len(), 1);
        assert_eq!(outcome.signals[0].entry_price, dec!(1.1000));
        assert_eq!(outcome.signals[0].take_profit, Some(dec!(1.11)));

        let issues: Vec<&ParseIssue> = outcome.warnings.iter().map(|w| &w.issue).collect();
        assert_eq!(
            issues,
            vec![
                &ParseIssue::UnknownInstrument("XXX/YYY".into()),
                &ParseIssue::EntryRange,
            ]
        );
    }

    #[test]
    fn text_without_trades_yields_nothing() {
        let outcome = parser().parse(&rec("Markets are choppy; no trades recommended today."));
        assert!(outcome.signals.is_empty());
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn payload_from_fenced_block() {
        let text = "Here is my analysis:\n```json\n{\"pair\": \"EURUSD\"}\n```\nDone.";
        assert_eq!(trade_payload(text).unwrap()["pair"], "EURUSD");
    }

    #[test]
    fn payload_after_prefix_text() {
        let text = "Based on the reports:\n{\"pair\": \"EURUSD\", \"entry\": 1.1}";
        assert_eq!(trade_payload(text).unwrap()["entry"], 1.1);
    }

    #[test]
    fn braces_inside_strings_do_not_split_objects() {
        let text = r#"{"pair": "GBPUSD", "rationale": "range {low} to {high}", "entry": 1.27}"#;
        assert_eq!(trade_payload(text).unwrap()["entry"], 1.27);
    }

    #[test]
    fn objects_without_trades_are_passed_over() {
        let text = r#"Context: {"dxy": 104.2, "note": "firm"} then {"trades": [{"pair": "USDJPY"}]}"#;
        let payload = trade_payload(text).unwrap();
        assert_eq!(trade_items(&payload).unwrap()[0]["pair"], "USDJPY");
        assert!(trade_payload("plain text, no braces").is_none());
        assert!(trade_payload(r#"{"trades": []}"#).is_none());
    }
}
