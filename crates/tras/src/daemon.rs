use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, NaiveTime, Utc};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tras_models::{MonitorConfig, ScheduleConfig};
use tras_monitor::{Notifier, PollReport, PriceMonitor};

use crate::digest::render_digest;
use crate::pipeline::{AnalysisPipeline, CycleOutcome};
use crate::schedule::Schedule;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    RunningAnalysis,
}

/// What one tick did.
#[derive(Debug, Default)]
pub struct TickReport {
    pub analysis: Option<CycleOutcome>,
    pub missed: Vec<NaiveTime>,
    pub poll: Option<PollReport>,
}

/// The control loop: one discrete tick drives both the analysis schedule
/// and the price monitor's polling interval.
pub struct Daemon {
    schedule: Schedule,
    pipeline: AnalysisPipeline,
    monitor: PriceMonitor,
    notifier: Arc<Notifier>,
    tick: Duration,
    poll_interval: chrono::Duration,
    status_every: u64,
    send_digest: bool,
    state: LoopState,
    ticks: u64,
    last_poll: Option<DateTime<Utc>>,
    cancel: CancellationToken,
}

impl Daemon {
    pub fn new(
        schedule: Schedule,
        pipeline: AnalysisPipeline,
        monitor: PriceMonitor,
        notifier: Arc<Notifier>,
        schedule_config: &ScheduleConfig,
        monitor_config: &MonitorConfig,
    ) -> Self {
        Self {
            schedule,
            pipeline,
            monitor,
            notifier,
            tick: Duration::from_secs(schedule_config.tick_seconds.max(1)),
            poll_interval: chrono::Duration::seconds(monitor_config.poll_interval_seconds as i64),
            status_every: schedule_config.status_every_ticks.max(1),
            send_digest: true,
            state: LoopState::Idle,
            ticks: 0,
            last_poll: None,
            cancel: CancellationToken::new(),
        }
    }

    /// Skip the per-cycle digest notification.
    pub fn without_digest(mut self) -> Self {
        self.send_digest = false;
        self
    }

    /// Returns a CancellationToken that can be used to trigger shutdown.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> LoopState {
        self.state
    }

    pub fn monitor(&self) -> &PriceMonitor {
        &self.monitor
    }

    /// Run ticks until cancelled. An in-flight tick always completes.
    pub async fn run(&mut self) {
        info!(
            slots = ?self.schedule.slots().iter().map(|s| s.format("%H:%M").to_string()).collect::<Vec<_>>(),
            timezone = %self.schedule.timezone(),
            providers = ?self.pipeline.provider_ids(),
            "Trade alert daemon starting"
        );
        self.log_status(Utc::now()).await;

        loop {
            self.tick_at(Utc::now()).await;
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("Daemon loop shutting down");
                    break;
                }
                _ = tokio::time::sleep(self.tick) => {}
            }
        }
    }

    /// One step of the loop at wall-clock `now`.
    pub async fn tick_at(&mut self, now: DateTime<Utc>) -> TickReport {
        self.ticks += 1;
        let mut report = TickReport::default();

        let slots = self.schedule.check(now);
        report.missed = slots.missed;
        if !slots.due.is_empty() {
            self.state = LoopState::RunningAnalysis;
            info!(slots = ?slots.due, "Scheduled analysis due");
            let outcome = self.pipeline.run_cycle(now).await;
            self.apply(&outcome, now).await;
            self.state = LoopState::Idle;
            report.analysis = Some(outcome);
        }

        let poll_due = self
            .last_poll
            .map_or(true, |last| now - last >= self.poll_interval);
        if poll_due {
            self.last_poll = Some(now);
            report.poll = Some(self.monitor.poll(now).await);
        }

        if self.ticks % self.status_every == 0 {
            self.log_status(now).await;
        }
        report
    }

    /// Hand a cycle's signals to the monitor and send the digest.
    async fn apply(&self, outcome: &CycleOutcome, now: DateTime<Utc>) {
        if let (CycleOutcome::Completed { .. }, Some(run_id)) = (outcome, outcome.run_id()) {
            let mut book = self.monitor.book().lock().await;
            let pruned = book.prune_settled();
            let change = book.replace_run(run_id, outcome.signals().to_vec());
            info!(
                run_id = %run_id,
                added = change.added,
                expired = change.expired,
                pruned,
                pending = book.pending_count(),
                "Signals handed to monitor"
            );
        }

        if !self.send_digest {
            return;
        }
        let local = now.with_timezone(&self.schedule.timezone());
        if let Some(digest) = render_digest(outcome, &local) {
            let delivery = self.notifier.deliver(&digest).await;
            if delivery.is_failure() {
                error!(failed = ?delivery.failed, "Analysis digest not delivered");
            }
        }
    }

    async fn log_status(&self, now: DateTime<Utc>) {
        let pending = self.monitor.book().lock().await.pending_count();
        let next = self
            .schedule
            .next_after(now)
            .map(|t| t.format("%Y-%m-%d %H:%M %Z").to_string())
            .unwrap_or_else(|| "none".to_string());
        info!(pending_signals = pending, next_analysis = %next, ticks = self.ticks, "Status");
    }
}
