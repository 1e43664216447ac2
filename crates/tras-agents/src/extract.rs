//! Text heuristics that turn free-form recommendation text into raw trade
//! candidates.
//!
//! Nothing here decides whether a candidate is a valid signal; that is the
//! parser's job. This module only finds instrument mentions, cuts the text
//! into one block per trade idea and collects every direction word and price
//! level it can see in each block.
//!
//! Segmentation works in one of two modes. When any instrument mention sits
//! at the start of a sentence or line (optionally behind list markers,
//! markdown emphasis or a short label such as `Pair:` or `Trade 2: BUY`),
//! only those mentions open blocks and each block runs to the next one.
//! Otherwise every mention opens a block starting at its sentence. A repeated
//! mention of the same instrument never opens a new block until the current
//! one has an entry.

use regex::{Captures, Regex};
use tras_models::instrument::Instrument;
use tras_models::signal::Direction;

use crate::price_text::{mention_from_parts, PriceMention};

const VALUE: &str = r"(?P<a>\d+(?:,\d+)*(?:\.\d+)?)(?:\s*(?:-|–|to)\s*(?P<b>\d+(?:,\d+)*(?:\.\d+)?))?(?:\s*(?P<unit>pips?|points?|pts)\b)?";
const SEPARATOR: &str = r"[*_]*\s*[:=\-–]?\s*[*_]*\s*(?:(?:at|around|near)\s+|@\s*)?";
const EXCERPT_CHARS: usize = 500;

/// Everything the heuristics found for one trade idea.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub instrument: Instrument,
    /// Distinct directions seen, in first-seen order.
    pub directions: Vec<Direction>,
    pub entries: Vec<PriceMention>,
    pub stops: Vec<PriceMention>,
    pub targets: Vec<PriceMention>,
    /// Whitespace-collapsed block text, truncated.
    pub excerpt: String,
}

struct Mention {
    start: usize,
    /// Start of the sentence the mention sits in.
    sentence: usize,
    instrument: Instrument,
    heading: bool,
}

/// Compiled patterns. Build once and reuse.
pub struct TextRules {
    pair: Regex,
    heading_prefix: Regex,
    entry: Regex,
    stop: Regex,
    target: Regex,
    direction_label: Regex,
    direction_word: Regex,
    value: Regex,
}

impl TextRules {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pair: Regex::new(r"\b([A-Z]{3})[/_\- ]?([A-Z]{3})\b")?,
            heading_prefix: Regex::new(
                r"(?i)^[\s#>*_\-•\d.)(\[\]]*(?:(?:trade|idea|recommendation|opportunity|setup|currency\s+pair|pair|instrument|symbol|go\s+long|go\s+short|buy|sell|long|short)\s*#?\d*\s*[:\-–.)]?[\s*_]*)*$",
            )?,
            entry: Regex::new(&format!(
                r"(?i)\b(?:entry(?:\s+(?:price|point|level|zone))?|enter|(?:go\s+)?(?:buy|sell|long|short)(?:\s+(?:limit|stop))?\s+(?:[a-z]{{3}}[/_\- ]?[a-z]{{3}}\s+)?(?:at|around|near|from|@)){SEPARATOR}{VALUE}"
            ))?,
            stop: Regex::new(&format!(
                r"(?i)\b(?:stop[\s\-]?loss|stop|sl)\b{SEPARATOR}{VALUE}"
            ))?,
            target: Regex::new(&format!(
                r"(?i)\b(?:take[\s\-]?profit|profit\s+target|tp|target|exit|objective)(?:\s*\d\b)?{SEPARATOR}{VALUE}"
            ))?,
            direction_label: Regex::new(
                r"(?i)\b(?:direction|action|side|bias|position|signal|(?:trade|order)\s+type)\b[*_]*\s*[:=\-–]\s*[*_]*\s*(buy|sell|long|short|bullish|bearish)\b",
            )?,
            direction_word: Regex::new(r"(?i)\b(buy|sell|long|short|bullish|bearish)\b")?,
            value: Regex::new(&format!(r"(?i)^\s*{VALUE}\s*$"))?,
        })
    }

    /// Raw candidates in reading order. Blocks with no price level at all
    /// (passing mentions, summaries) are dropped without comment.
    pub fn candidates(&self, text: &str) -> Vec<Candidate> {
        self.segment(text)
            .into_iter()
            .filter_map(|(instrument, block)| self.candidate(instrument, block))
            .collect()
    }

    /// Interpret a standalone value such as `1.1000`, `50 pips` or
    /// `1.0990 - 1.1000`.
    pub fn mention(&self, value: &str) -> PriceMention {
        match self.value.captures(value) {
            Some(caps) => mention_of(&caps),
            None => PriceMention::Malformed(value.trim().to_string()),
        }
    }

    /// Interpret a standalone direction word (`BUY`, `short`, `Bearish`).
    pub fn direction(&self, word: &str) -> Option<Direction> {
        let caps = self.direction_word.captures(word.trim())?;
        direction_of(&caps[1])
    }

    /// Instrument mentions in reading order.
    ///
    /// Matches may overlap: a word like `BUY` or `THE` in front of a pair
    /// reads as a first code, so a failed or space-joined match is retried
    /// one letter further on before the pair behind it is given up.
    fn mentions(&self, text: &str) -> Vec<Mention> {
        let mut found = Vec::new();
        let mut pos = 0;
        while let Some(caps) = self.pair.captures_at(text, pos) {
            let (Some(whole), Some(second)) = (caps.get(0), caps.get(2)) else {
                break;
            };
            let tighter_pair_follows = whole.as_str().contains(' ')
                && starts_joined_code(&text[second.end()..]);
            let instrument = match Instrument::from_codes(&caps[1], &caps[2]) {
                Ok(instrument) if !tighter_pair_follows => instrument,
                _ => {
                    pos = whole.start() + 1;
                    continue;
                }
            };

            let sentence = sentence_start(text, whole.start());
            let heading = self
                .heading_prefix
                .is_match(&text[sentence..whole.start()]);
            found.push(Mention {
                start: whole.start(),
                sentence,
                instrument,
                heading,
            });
            pos = whole.end();
        }
        found
    }

    fn segment<'t>(&self, text: &'t str) -> Vec<(Instrument, &'t str)> {
        let mentions = self.mentions(text);
        let heading_mode = mentions.iter().any(|m| m.heading);

        let mut opened: Vec<(usize, Instrument)> = Vec::new();
        let mut prev_start = 0;
        for m in mentions.iter().filter(|m| !heading_mode || m.heading) {
            if let Some((start, instrument)) = opened.last() {
                if *instrument == m.instrument && !self.entry.is_match(&text[*start..m.start]) {
                    continue;
                }
            }
            opened.push((m.sentence.max(prev_start), m.instrument.clone()));
            prev_start = m.start;
        }

        opened
            .iter()
            .enumerate()
            .map(|(i, (start, instrument))| {
                let end = opened.get(i + 1).map_or(text.len(), |(next, _)| *next);
                (instrument.clone(), &text[*start..end])
            })
            .collect()
    }

    fn candidate(&self, instrument: Instrument, block: &str) -> Option<Candidate> {
        let entries = self.levels(&self.entry, block, false);
        let stops = self.levels(&self.stop, block, true);
        let targets = self.levels(&self.target, block, false);
        if entries.is_empty() && stops.is_empty() && targets.is_empty() {
            return None;
        }

        Some(Candidate {
            instrument,
            directions: self.directions(block),
            entries,
            stops,
            targets,
            excerpt: excerpt(block),
        })
    }

    fn levels(&self, pattern: &Regex, block: &str, skip_order_types: bool) -> Vec<PriceMention> {
        pattern
            .captures_iter(block)
            .filter(|caps| {
                !skip_order_types
                    || caps.get(0).map_or(true, |m| {
                        !is_order_type(m.as_str(), &block[..m.start()])
                    })
            })
            .map(|caps| mention_of(&caps))
            .collect()
    }

    /// Labelled direction first, then direction words on the block's first
    /// line, then any direction word in the block.
    fn directions(&self, block: &str) -> Vec<Direction> {
        let labelled: Vec<Direction> = self
            .direction_label
            .captures_iter(block)
            .filter_map(|caps| direction_of(&caps[1]))
            .collect();
        if !labelled.is_empty() {
            return distinct(labelled);
        }

        let first_line = block.lines().next().unwrap_or_default();
        let heading = self.direction_words(first_line);
        if !heading.is_empty() {
            return heading;
        }

        self.direction_words(block)
    }

    fn direction_words(&self, text: &str) -> Vec<Direction> {
        let found = self
            .direction_word
            .captures_iter(text)
            .filter_map(|caps| {
                let m = caps.get(1)?;
                if is_idiom(&text[m.end()..]) {
                    return None;
                }
                direction_of(m.as_str())
            })
            .collect();
        distinct(found)
    }
}

fn mention_of(caps: &Captures<'_>) -> PriceMention {
    mention_from_parts(
        caps.name("a").map_or("", |m| m.as_str()),
        caps.name("b").map(|m| m.as_str()),
        caps.name("unit").map(|m| m.as_str()),
    )
}

fn direction_of(word: &str) -> Option<Direction> {
    match word.to_ascii_lowercase().as_str() {
        "buy" | "long" | "bullish" => Some(Direction::Long),
        "sell" | "short" | "bearish" => Some(Direction::Short),
        _ => None,
    }
}

fn distinct(directions: Vec<Direction>) -> Vec<Direction> {
    let mut out = Vec::new();
    for d in directions {
        if !out.contains(&d) {
            out.push(d);
        }
    }
    out
}

/// `long-term`, `short squeeze`, `sell-off` and friends are not directions.
fn is_idiom(rest: &str) -> bool {
    let rest = rest.to_ascii_lowercase();
    [
        "-term", " term", "-off", "-lived", " squeeze", " covering", "-side", " side",
    ]
    .iter()
    .any(|suffix| rest.starts_with(suffix))
}

/// `buy stop 1.1000` is an order type, not a stop loss. Only a bare `stop`
/// with `buy`/`sell` right before it on the same line counts; `stop loss`
/// and `SL` are always stop losses.
fn is_order_type(matched: &str, before: &str) -> bool {
    let matched = matched.to_ascii_lowercase();
    let explicit_loss = matched.starts_with("sl")
        || matched
            .strip_prefix("stop")
            .map_or(false, |rest| rest.trim_start_matches([' ', '-']).starts_with("loss"));
    if explicit_loss {
        return false;
    }

    let line = before.rsplit('\n').next().unwrap_or_default();
    if !line.ends_with([' ', '\t']) {
        return false;
    }
    let tail = line.trim_end_matches([' ', '\t']).to_ascii_lowercase();
    ["buy", "sell"].iter().any(|verb| {
        tail.strip_suffix(*verb)
            .map_or(false, |head| !head.ends_with(|c: char| c.is_ascii_alphabetic()))
    })
}

/// `/USD`, `-USD` or `_USD`: the text continues with a joined pair code.
fn starts_joined_code(rest: &str) -> bool {
    let mut chars = rest.chars();
    matches!(chars.next(), Some('/' | '_' | '-'))
        && chars.take(3).filter(|c| c.is_ascii_uppercase()).count() == 3
}

/// Start of the sentence containing `pos`: after the last newline or
/// sentence-ending punctuation followed by whitespace.
fn sentence_start(text: &str, pos: usize) -> usize {
    let head = &text[..pos];
    let line = head.rfind('\n').map_or(0, |i| i + 1);
    let mut boundary = line;
    let mut prev = None;
    for (i, c) in head[line..].char_indices() {
        if matches!(prev, Some('.' | '!' | '?' | ';')) && c.is_whitespace() {
            boundary = line + i + c.len_utf8();
        }
        prev = Some(c);
    }
    boundary
}

fn excerpt(block: &str) -> String {
    let collapsed = block.split_whitespace().collect::<Vec<_>>().join(" ");
    match collapsed.char_indices().nth(EXCERPT_CHARS) {
        Some((idx, _)) => collapsed[..idx].to_string(),
        None => collapsed,
    }
}
