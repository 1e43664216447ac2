//! Alert history on disk keeps a signal from alerting twice across
//! process restarts, even when a later run repeats the same idea.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal_macros::dec;
use tokio::sync::Mutex;
use tras_models::{Direction, TradeSignal};
use tras_monitor::test_support::{RecordingSink, StaticPriceSource};
use tras_monitor::{AlertDeduplicator, Notifier, PriceMonitor, SignalBook, Tolerance};
use tras_store::SqliteAlertStore;
use uuid::Uuid;

fn eurusd_long(run: Uuid) -> TradeSignal {
    TradeSignal::new(
        "EURUSD".parse().unwrap(),
        Direction::Long,
        dec!(1.1000),
        Some(dec!(1.0950)),
        Some(dec!(1.1100)),
        run,
        Utc::now(),
        "Dollar weakness".to_string(),
    )
    .unwrap()
}

/// One "process": fresh book, fresh store handle on the same file.
async fn run_once(path: &std::path::Path, sink: Arc<RecordingSink>) -> usize {
    let prices = Arc::new(StaticPriceSource::new());
    prices.set("EURUSD", dec!(1.1005));

    let store = SqliteAlertStore::open(path).unwrap();
    let monitor = PriceMonitor::new(
        Arc::new(Mutex::new(SignalBook::new())),
        prices,
        AlertDeduplicator::new(Arc::new(store)),
        Arc::new(Notifier::new(vec![sink], 3, Duration::from_millis(1))),
        Tolerance::new(dec!(10), dec!(0.1)),
    );

    let run = Uuid::new_v4();
    monitor
        .book()
        .lock()
        .await
        .replace_run(run, vec![eurusd_long(run)]);
    let report = monitor.poll(Utc::now()).await;
    assert_eq!(report.triggered.len(), 1);
    report.triggered.iter().filter(|t| t.notified).count()
}

#[tokio::test]
async fn alert_fires_once_across_restarts() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alerts.db");
    let sink = Arc::new(RecordingSink::new("push"));

    assert_eq!(run_once(&path, sink.clone()).await, 1);
    assert_eq!(run_once(&path, sink.clone()).await, 0);
    assert_eq!(run_once(&path, sink.clone()).await, 0);

    assert_eq!(sink.sent().len(), 1);
}
