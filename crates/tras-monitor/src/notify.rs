use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{error, info, warn};
use tras_models::{MonitorConfig, TradeSignal};

use crate::error::NotifyError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    /// A signal's entry condition matched.
    EntryAlert,
    /// Summary of one analysis cycle.
    Digest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Normal,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub priority: Priority,
    pub kind: NotificationKind,
}

const RATIONALE_CHARS: usize = 200;

impl Notification {
    /// Render the alert for a signal whose entry just matched at `price`.
    pub fn entry_alert(signal: &TradeSignal, price: Decimal) -> Self {
        let pair = signal.instrument.pair_label();
        let direction = signal.direction.to_string().to_uppercase();

        let mut body = format!(
            "{pair} entry point triggered\n\n\
             Direction: {direction}\n\
             Entry Price: {}\n\
             Current Price: {:.5}\n",
            signal.entry_price,
            price.round_dp(5),
        );
        if let Some(target) = signal.take_profit {
            body.push_str(&format!("Target: {target}\n"));
        }
        if let Some(stop) = signal.stop_loss {
            body.push_str(&format!("Stop Loss: {stop}\n"));
        }
        let rationale = signal.rationale.trim();
        if !rationale.is_empty() {
            let excerpt: String = rationale.chars().take(RATIONALE_CHARS).collect();
            body.push_str(&format!("\nRecommendation: {excerpt}"));
        }

        Self {
            title: format!("Entry Point Hit: {pair} {direction}"),
            body: body.trim_end().to_string(),
            priority: Priority::High,
            kind: NotificationKind::EntryAlert,
        }
    }
}

/// A delivery channel (push, email).
#[async_trait]
pub trait NotificationSink: Send + Sync {
    fn name(&self) -> &str;

    /// Whether this sink wants notifications of `kind`.
    fn accepts(&self, _kind: NotificationKind) -> bool {
        true
    }

    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryReport {
    pub delivered: Vec<String>,
    /// `(sink, error)` for sinks that gave up.
    pub failed: Vec<(String, String)>,
}

impl DeliveryReport {
    /// Every sink that tried failed.
    pub fn is_failure(&self) -> bool {
        self.delivered.is_empty() && !self.failed.is_empty()
    }
}

/// Sends notifications to every interested sink with a small bounded retry.
pub struct Notifier {
    sinks: Vec<Arc<dyn NotificationSink>>,
    attempts: u32,
    backoff: Duration,
}

impl Notifier {
    pub fn new(sinks: Vec<Arc<dyn NotificationSink>>, attempts: u32, backoff: Duration) -> Self {
        Self {
            sinks,
            attempts: attempts.max(1),
            backoff,
        }
    }

    pub fn from_config(sinks: Vec<Arc<dyn NotificationSink>>, config: &MonitorConfig) -> Self {
        Self::new(
            sinks,
            config.notify_attempts,
            Duration::from_millis(config.notify_backoff_ms),
        )
    }

    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    pub async fn deliver(&self, notification: &Notification) -> DeliveryReport {
        let mut report = DeliveryReport::default();

        for sink in self.sinks.iter().filter(|s| s.accepts(notification.kind)) {
            match self.send_with_retry(sink.as_ref(), notification).await {
                Ok(()) => {
                    info!(sink = sink.name(), title = %notification.title, "Notification sent");
                    report.delivered.push(sink.name().to_string());
                }
                Err(e) => {
                    error!(sink = sink.name(), title = %notification.title, error = %e, "Notification failed");
                    report.failed.push((sink.name().to_string(), e.to_string()));
                }
            }
        }
        report
    }

    async fn send_with_retry(
        &self,
        sink: &dyn NotificationSink,
        notification: &Notification,
    ) -> Result<(), NotifyError> {
        let mut delay = self.backoff;
        let mut attempt = 1;
        loop {
            match sink.send(notification).await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_retryable() && attempt < self.attempts => {
                    warn!(sink = sink.name(), attempt, error = %e, "Notification attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    delay *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tras_models::Direction;
    use uuid::Uuid;

    use crate::test_support::RecordingSink;

    fn signal(rationale: &str) -> TradeSignal {
        TradeSignal::new(
            "EURUSD".parse().unwrap(),
            Direction::Long,
            dec!(1.1000),
            Some(dec!(1.0950)),
            Some(dec!(1.1100)),
            Uuid::new_v4(),
            Utc::now(),
            rationale.to_string(),
        )
        .unwrap()
    }

    fn notifier(sinks: Vec<Arc<dyn NotificationSink>>) -> Notifier {
        Notifier::new(sinks, 3, Duration::from_millis(1))
    }

    #[test]
    fn entry_alert_layout() {
        let n = Notification::entry_alert(&signal("Dollar weakness after payrolls."), dec!(1.10042));
        assert_eq!(n.title, "Entry Point Hit: EUR/USD LONG");
        assert_eq!(n.priority, Priority::High);
        assert!(n.body.contains("Direction: LONG"));
        assert!(n.body.contains("Entry Price: 1.1000"));
        assert!(n.body.contains("Current Price: 1.10042"));
        assert!(n.body.contains("Target: 1.1100"));
        assert!(n.body.contains("Stop Loss: 1.0950"));
        assert!(n.body.ends_with("Recommendation: Dollar weakness after payrolls."));
    }

    #[test]
    fn rationale_is_cut_at_200_chars() {
        let n = Notification::entry_alert(&signal(&"x".repeat(500)), dec!(1.1));
        let tail = n.body.rsplit("Recommendation: ").next().unwrap();
        assert_eq!(tail.chars().count(), 200);
        assert!(n.body.contains("Current Price: 1.10000"));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let sink = Arc::new(RecordingSink::failing_first("push", 2));
        let report = notifier(vec![sink.clone()])
            .deliver(&Notification::entry_alert(&signal(""), dec!(1.1)))
            .await;
        assert_eq!(report.delivered, vec!["push"]);
        assert_eq!(sink.attempts(), 3);
        assert_eq!(sink.sent().len(), 1);
    }

    #[tokio::test]
    async fn gives_up_after_bounded_attempts() {
        let sink = Arc::new(RecordingSink::failing_first("push", 10));
        let report = notifier(vec![sink.clone()])
            .deliver(&Notification::entry_alert(&signal(""), dec!(1.1)))
            .await;
        assert!(report.is_failure());
        assert_eq!(sink.attempts(), 3);
    }

    #[tokio::test]
    async fn one_sink_failing_does_not_stop_others() {
        let bad = Arc::new(RecordingSink::failing_first("email", 10));
        let good = Arc::new(RecordingSink::new("push"));
        let report = notifier(vec![bad, good.clone()])
            .deliver(&Notification::entry_alert(&signal(""), dec!(1.1)))
            .await;
        assert!(!report.is_failure());
        assert_eq!(report.failed.len(), 1);
        assert_eq!(good.sent().len(), 1);
    }

    #[tokio::test]
    async fn sinks_filter_by_kind() {
        let alerts_only = Arc::new(RecordingSink::new("push").only(NotificationKind::EntryAlert));
        let digest = Notification {
            title: "Digest".into(),
            body: String::new(),
            priority: Priority::Normal,
            kind: NotificationKind::Digest,
        };
        let report = notifier(vec![alerts_only.clone()]).deliver(&digest).await;
        assert_eq!(report, DeliveryReport::default());
        assert_eq!(alerts_only.attempts(), 0);
    }
}
