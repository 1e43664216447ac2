use std::fmt::Write;

use chrono::{DateTime, TimeZone};
use tras_models::TradeSignal;
use tras_monitor::{Notification, NotificationKind, Priority};

use crate::pipeline::CycleOutcome;

const RULE: &str = "--------------------------------------------------";

/// Render the per-cycle digest: every provider's answer, which providers
/// were missing, and the synthesized result. `None` when no provider was
/// called.
pub fn render_digest<Tz: TimeZone>(outcome: &CycleOutcome, at: &DateTime<Tz>) -> Option<Notification>
where
    Tz::Offset: std::fmt::Display,
{
    let responses = outcome.responses();
    if responses.is_empty() {
        return None;
    }

    let mut body = String::new();
    let mut missing = Vec::new();
    for response in responses {
        match (&response.text, response.is_ok()) {
            (Some(text), true) => {
                let _ = write!(
                    body,
                    "{} RECOMMENDATIONS\n{RULE}\n{}\n\n",
                    response.provider_id.to_uppercase(),
                    text.trim()
                );
            }
            _ => missing.push(response),
        }
    }

    if !missing.is_empty() {
        let _ = writeln!(body, "NOTE: MISSING RECOMMENDATIONS\n{RULE}");
        for response in &missing {
            let _ = writeln!(
                body,
                "  - {} ({:?} after {} attempt(s)): {}",
                response.provider_id.to_uppercase(),
                response.status,
                response.attempt_count,
                response.error_detail.as_deref().unwrap_or("no detail"),
            );
        }
        body.push('\n');
    }

    match outcome {
        CycleOutcome::Completed {
            recommendation,
            parsed,
            ..
        } => {
            let sources: Vec<String> = recommendation.sources.iter().map(|s| s.to_uppercase()).collect();
            let _ = write!(
                body,
                "FINAL RECOMMENDATION (synthesized by {} from {})\n{RULE}\n{}\n\n",
                recommendation.synthesizer.to_uppercase(),
                sources.join(", "),
                recommendation.text.trim()
            );
            let _ = writeln!(body, "MONITORED SIGNALS\n{RULE}");
            if parsed.signals.is_empty() {
                let _ = writeln!(body, "  (none)");
            }
            for signal in &parsed.signals {
                let _ = writeln!(body, "  {}", signal_line(signal));
            }
            let rejected = parsed.rejected();
            if rejected > 0 {
                let _ = writeln!(body, "  {rejected} candidate(s) rejected, see logs");
            }
        }
        CycleOutcome::Skipped { skipped, .. } => {
            let _ = writeln!(body, "SYNTHESIS SKIPPED: {} ({})", skipped.reason, skipped.detail);
        }
        CycleOutcome::SourceFailed { .. } => {}
    }

    Some(Notification {
        title: format!("Forex Trading Recommendations - {}", at.format("%Y-%m-%d %H:%M")),
        body: body.trim_end().to_string(),
        priority: Priority::Normal,
        kind: NotificationKind::Digest,
    })
}

fn signal_line(signal: &TradeSignal) -> String {
    let mut line = format!(
        "{} {} entry {}",
        signal.instrument.pair_label(),
        signal.direction.to_string().to_uppercase(),
        signal.entry_price
    );
    if let Some(stop) = signal.stop_loss {
        let _ = write!(line, ", stop {stop}");
    }
    if let Some(target) = signal.take_profit {
        let _ = write!(line, ", target {target}");
    }
    line
}
