//! Turns change notifications into reconciliation passes.
//!
//! The decision logic lives in [`GateCore`], which takes the current time
//! as an argument and owns no timers. [`ChangeTriggerGate`] drives it from a
//! `tokio::select!` loop with a single debounce deadline and a fallback poll.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::config::TimingConfig;
use crate::mutation::{MutationRecord, Relevance};
use crate::reconcile::{PassOutcome, Reconciler};
use crate::surface::{MutationReceiver, SurfaceLocator};

/// Why a notification batch did not schedule a pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Only the projection's own writes
    SelfCaused,
    /// Nothing that could change the source text
    Irrelevant,
    /// A pass completed moments ago
    Cooldown,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// A pass is due at `deadline`; `coalesced` when it replaced a pending one
    Scheduled { deadline: Instant, coalesced: bool },
    Ignored(IgnoreReason),
}

/// What caused a pass
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Trigger {
    Debounce,
    Poll,
    Bootstrap,
    Manual,
}

/// A pass the gate ran, reported to listeners
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PassReport {
    pub trigger: Trigger,
    pub outcome: PassOutcome,
}

pub type PassReportSender = mpsc::UnboundedSender<PassReport>;
pub type PassReportReceiver = mpsc::UnboundedReceiver<PassReport>;

/// Counters for gate decisions
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GateStats {
    pub notifications: u64,
    pub scheduled: u64,
    pub coalesced: u64,
    pub ignored_self: u64,
    pub ignored_irrelevant: u64,
    pub ignored_cooldown: u64,
    pub debounced_passes: u64,
    pub poll_passes: u64,
}

/// Debounce and cooldown bookkeeping, driven by explicit timestamps
#[derive(Debug)]
pub struct GateCore {
    debounce: Duration,
    cooldown: Duration,
    pending: Option<Instant>,
    last_pass: Option<Instant>,
    stats: GateStats,
}

impl GateCore {
    pub fn new(debounce: Duration, cooldown: Duration) -> Self {
        Self {
            debounce,
            cooldown,
            pending: None,
            last_pass: None,
            stats: GateStats::default(),
        }
    }

    pub fn from_timing(timing: &TimingConfig) -> Self {
        Self::new(timing.debounce(), timing.cooldown())
    }

    /// Decide what a batch of notifications received at `now` means
    pub fn on_notification(&mut self, records: &[MutationRecord], now: Instant) -> GateDecision {
        self.stats.notifications += 1;

        match batch_relevance(records) {
            Relevance::SelfCaused => {
                self.stats.ignored_self += 1;
                return GateDecision::Ignored(IgnoreReason::SelfCaused);
            }
            Relevance::Irrelevant => {
                self.stats.ignored_irrelevant += 1;
                return GateDecision::Ignored(IgnoreReason::Irrelevant);
            }
            Relevance::Content | Relevance::ProjectionRemoved => {}
        }

        if self.in_cooldown(now) {
            self.stats.ignored_cooldown += 1;
            return GateDecision::Ignored(IgnoreReason::Cooldown);
        }

        let coalesced = self.pending.is_some();
        GateDecision::Scheduled {
            deadline: self.schedule(now),
            coalesced,
        }
    }

    /// Push the pending deadline out by one debounce period from `now`
    pub fn schedule(&mut self, now: Instant) -> Instant {
        if self.pending.is_some() {
            self.stats.coalesced += 1;
        } else {
            self.stats.scheduled += 1;
        }
        let deadline = now + self.debounce;
        self.pending = Some(deadline);
        deadline
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending
    }

    /// Clear and report the pending pass if its deadline has passed
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.pending {
            Some(deadline) if deadline <= now => {
                self.pending = None;
                true
            }
            _ => false,
        }
    }

    /// Note a completed pass; earlier timestamps never move the cooldown back
    pub fn record_pass(&mut self, at: Instant) {
        if self.last_pass.is_none_or(|last| at > last) {
            self.last_pass = Some(at);
        }
    }

    pub fn in_cooldown(&self, now: Instant) -> bool {
        self.last_pass
            .is_some_and(|at| now.saturating_duration_since(at) < self.cooldown)
    }

    pub fn stats(&self) -> &GateStats {
        &self.stats
    }

    fn note_pass(&mut self, trigger: Trigger) {
        match trigger {
            Trigger::Debounce => self.stats.debounced_passes += 1,
            Trigger::Poll => self.stats.poll_passes += 1,
            Trigger::Bootstrap | Trigger::Manual => {}
        }
    }
}

/// Strongest relevance in a batch
fn batch_relevance(records: &[MutationRecord]) -> Relevance {
    let mut result = Relevance::Irrelevant;
    for record in records {
        match record.relevance() {
            r @ (Relevance::Content | Relevance::ProjectionRemoved) => return r,
            Relevance::SelfCaused => result = Relevance::SelfCaused,
            Relevance::Irrelevant => {}
        }
    }
    result
}

/// Runs reconciliation passes in response to notifications and a fallback poll
pub struct ChangeTriggerGate<L> {
    locator: L,
    reconciler: Arc<Reconciler>,
    core: GateCore,
    poll_interval: Duration,
    reports: Option<PassReportSender>,
}

impl<L: SurfaceLocator> ChangeTriggerGate<L> {
    pub fn new(locator: L, reconciler: Arc<Reconciler>, timing: &TimingConfig) -> Self {
        Self {
            locator,
            reconciler,
            core: GateCore::from_timing(timing),
            poll_interval: timing.poll_interval(),
            reports: None,
        }
    }

    /// Report every pass on the given channel
    pub fn with_reports(mut self, reports: PassReportSender) -> Self {
        self.reports = Some(reports);
        self
    }

    pub fn stats(&self) -> &GateStats {
        self.core.stats()
    }

    /// Run until cancelled; returns the final counters
    pub async fn run(mut self, mut notices: MutationReceiver, cancel: CancellationToken) -> GateStats {
        let start = Instant::now() + self.poll_interval;
        let mut poll = tokio::time::interval_at(start, self.poll_interval);
        poll.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut notices_open = true;

        debug!(poll_ms = self.poll_interval.as_millis() as u64, "change-trigger gate started");

        loop {
            let deadline = self.core.deadline();

            tokio::select! {
                _ = cancel.cancelled() => break,

                batch = notices.recv(), if notices_open => {
                    match batch {
                        Some(records) => self.on_notification(&records),
                        None => {
                            debug!("notification channel closed, relying on poll");
                            notices_open = false;
                        }
                    }
                }

                _ = tokio::time::sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                    if self.core.take_due(Instant::now()) {
                        self.run_pass(Trigger::Debounce);
                    }
                }

                _ = poll.tick() => self.poll(),
            }
        }

        debug!("change-trigger gate stopped");
        self.core.stats().clone()
    }

    fn on_notification(&mut self, records: &[MutationRecord]) {
        if let Some(at) = self.reconciler.last_pass() {
            self.core.record_pass(at);
        }
        let decision = self.core.on_notification(records, Instant::now());
        trace!(?decision, records = records.len(), "gate decision");
    }

    /// Fallback check: pass only when the projection is gone or the text moved
    fn poll(&mut self) {
        let needed = self.locator.with_surface(|surface| match surface {
            Some(surface) => Some(self.reconciler.needs_pass(&*surface)),
            None => None,
        });

        match needed {
            None => debug!("poll: log surface not found"),
            Some(false) => trace!("poll: projection in sync"),
            Some(true) => {
                debug!("poll: projection missing or stale");
                self.run_pass(Trigger::Poll);
            }
        }
    }

    fn run_pass(&mut self, trigger: Trigger) {
        let outcome = self.reconciler.reconcile_located(&self.locator);
        self.core.note_pass(trigger);

        match &outcome {
            PassOutcome::Busy => {
                // Another caller holds the pass; try again after a quiet period
                self.core.schedule(Instant::now());
            }
            PassOutcome::Synced { .. } | PassOutcome::FastSkip => {
                self.core.record_pass(Instant::now());
            }
            PassOutcome::NoSurface | PassOutcome::Failed(_) => {}
        }

        trace!(?trigger, ?outcome, "pass finished");
        if let Some(tx) = &self.reports {
            let _ = tx.send(PassReport { trigger, outcome });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::mutation::NodeInfo;
    use crate::surface::{LogSurface, MemorySurface, SharedSurface, SurfaceRegistry};
    use logtint_types::Severity;

    fn content() -> MutationRecord {
        MutationRecord::character_data(NodeInfo::text())
    }

    fn own_write() -> MutationRecord {
        MutationRecord::child_list(
            NodeInfo::projection_root(),
            vec![NodeInfo::unit(Severity::Info)],
            Vec::new(),
        )
    }

    fn core() -> GateCore {
        GateCore::new(Duration::from_millis(300), Duration::from_millis(200))
    }

    #[test]
    fn test_burst_is_coalesced_into_one_deadline() {
        let mut gate = core();
        let t0 = Instant::now();

        gate.on_notification(&[content()], t0);
        gate.on_notification(&[content()], t0 + Duration::from_millis(100));
        let decision = gate.on_notification(&[content()], t0 + Duration::from_millis(200));

        let expected = t0 + Duration::from_millis(500);
        assert!(matches!(
            decision,
            GateDecision::Scheduled { deadline, coalesced: true } if deadline == expected
        ));
        assert!(!gate.take_due(t0 + Duration::from_millis(499)));
        assert!(gate.take_due(expected));
        assert!(!gate.take_due(expected));
        assert_eq!(gate.stats().scheduled, 1);
        assert_eq!(gate.stats().coalesced, 2);
    }

    #[test]
    fn test_first_notification_is_not_coalesced() {
        let mut gate = core();
        let decision = gate.on_notification(&[content()], Instant::now());
        assert!(matches!(decision, GateDecision::Scheduled { coalesced: false, .. }));
    }

    #[test]
    fn test_own_writes_are_ignored() {
        let mut gate = core();
        let decision = gate.on_notification(&[own_write(), own_write()], Instant::now());
        assert_eq!(decision, GateDecision::Ignored(IgnoreReason::SelfCaused));
        assert_eq!(gate.deadline(), None);
    }

    #[test]
    fn test_mixed_batch_with_content_schedules() {
        let mut gate = core();
        let decision = gate.on_notification(&[own_write(), content()], Instant::now());
        assert!(matches!(decision, GateDecision::Scheduled { .. }));
    }

    #[test]
    fn test_empty_batch_is_irrelevant() {
        let mut gate = core();
        assert_eq!(
            gate.on_notification(&[], Instant::now()),
            GateDecision::Ignored(IgnoreReason::Irrelevant)
        );
    }

    #[test]
    fn test_cooldown_after_pass() {
        let mut gate = core();
        let t0 = Instant::now();
        gate.record_pass(t0);

        assert_eq!(
            gate.on_notification(&[content()], t0 + Duration::from_millis(150)),
            GateDecision::Ignored(IgnoreReason::Cooldown)
        );
        assert!(matches!(
            gate.on_notification(&[content()], t0 + Duration::from_millis(250)),
            GateDecision::Scheduled { .. }
        ));
        assert_eq!(gate.stats().ignored_cooldown, 1);
    }

    #[test]
    fn test_record_pass_keeps_latest() {
        let mut gate = core();
        let t0 = Instant::now();
        gate.record_pass(t0 + Duration::from_millis(100));
        gate.record_pass(t0);
        assert!(gate.in_cooldown(t0 + Duration::from_millis(250)));
    }

    struct Harness {
        surface: SharedSurface,
        reconciler: Arc<Reconciler>,
        reports: PassReportReceiver,
        cancel: CancellationToken,
        task: tokio::task::JoinHandle<GateStats>,
    }

    fn spawn_gate(text: &str, timing: TimingConfig) -> Harness {
        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        let (report_tx, reports) = mpsc::unbounded_channel();
        let surface = MemorySurface::new(text).with_notifier(notice_tx).shared();
        let registry = SurfaceRegistry::new("");
        registry.register(Arc::clone(&surface));

        let reconciler = Arc::new(Reconciler::new(Classifier::builtin(), timing.fast_skip()));
        let gate = ChangeTriggerGate::new(registry, Arc::clone(&reconciler), &timing)
            .with_reports(report_tx);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(gate.run(notice_rx, cancel.clone()));

        Harness {
            surface,
            reconciler,
            reports,
            cancel,
            task,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_pass_after_quiet_period() {
        let mut h = spawn_gate("", TimingConfig::default());

        h.surface.lock().append_text("one\n");
        tokio::time::sleep(Duration::from_millis(100)).await;
        h.surface.lock().append_text("two\n");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(h.reports.try_recv().is_err());

        let report = h.reports.recv().await.unwrap();
        assert_eq!(report.trigger, Trigger::Debounce);
        assert!(matches!(report.outcome, PassOutcome::Synced { appended: 2, .. }));
        assert_eq!(h.surface.lock().units().len(), 2);

        // The pass's own writes must not schedule another pass
        tokio::time::sleep(Duration::from_millis(1_000)).await;
        assert!(h.reports.try_recv().is_err());

        h.cancel.cancel();
        let stats = h.task.await.unwrap();
        assert_eq!(stats.debounced_passes, 1);
        assert!(stats.ignored_self >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_restores_removed_projection() {
        let timing = TimingConfig::default();
        let mut h = spawn_gate("a\nb", timing.clone());

        // First poll finds no projection and renders
        let report = h.reports.recv().await.unwrap();
        assert_eq!(report.trigger, Trigger::Poll);
        assert_eq!(h.surface.lock().units().len(), 2);

        // Removal right after a pass lands inside the cooldown
        h.surface.lock().remove_projection();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(h.surface.lock().mounted_projection().is_none());

        let report = h.reports.recv().await.unwrap();
        assert_eq!(report.trigger, Trigger::Poll);
        assert!(h.surface.lock().mounted_projection().is_some());
        assert_eq!(h.reconciler.stats().rendered, 2);

        h.cancel.cancel();
        let stats = h.task.await.unwrap();
        assert_eq!(stats.poll_passes, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_skips_when_in_sync() {
        let mut h = spawn_gate("a", TimingConfig::default());
        h.reports.recv().await.unwrap();

        tokio::time::sleep(Duration::from_millis(13_000)).await;
        assert!(h.reports.try_recv().is_err());

        h.cancel.cancel();
        assert_eq!(h.task.await.unwrap().poll_passes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gate_survives_closed_notification_channel() {
        let (report_tx, mut reports) = mpsc::unbounded_channel();
        let surface = MemorySurface::new("x").shared();
        let reconciler = Arc::new(Reconciler::default());
        let gate = ChangeTriggerGate::new(
            Arc::clone(&surface),
            reconciler,
            &TimingConfig::default(),
        )
        .with_reports(report_tx);

        let (notice_tx, notice_rx) = mpsc::unbounded_channel();
        drop(notice_tx);
        let cancel = CancellationToken::new();
        let task = tokio::spawn(gate.run(notice_rx, cancel.clone()));

        let report = reports.recv().await.unwrap();
        assert_eq!(report.trigger, Trigger::Poll);
        assert_eq!(surface.lock().units().len(), 1);

        cancel.cancel();
        task.await.unwrap();
    }
}
