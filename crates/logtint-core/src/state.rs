use std::collections::HashSet;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::time::Instant;

use logtint_types::{ContentFingerprint, LineKey, ProjectionId, Severity, SeverityCounts};

/// Snapshot of reconciliation progress for display
#[derive(Clone, Debug, Default)]
pub struct ReconcileStats {
    /// Passes that brought the projection in sync
    pub passes: u64,
    /// Passes skipped because nothing changed
    pub skipped: u64,
    /// Full resets (remount, shrink or drift)
    pub resets: u64,
    /// Passes that ended in an error
    pub failures: u64,
    /// Lines currently rendered
    pub rendered: usize,
    pub counts: SeverityCounts,
    pub projection: Option<ProjectionId>,
    /// Wall-clock time of the last successful pass
    pub last_pass_at: Option<DateTime<Local>>,
}

/// What has been rendered so far, against which source snapshot
#[derive(Debug, Default)]
pub struct ReconciliationState {
    /// Keys of every line in the mounted projection
    rendered: HashSet<LineKey>,

    /// Projection this state describes
    projection: Option<ProjectionId>,

    /// Fingerprint of the text seen by the last successful pass
    last_fingerprint: Option<ContentFingerprint>,

    /// Monotonic time of the last successful pass
    last_pass: Option<Instant>,

    next_projection: u64,

    stats: ReconcileStats,
}

impl ReconciliationState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rendered_len(&self) -> usize {
        self.rendered.len()
    }

    pub fn is_rendered(&self, key: &LineKey) -> bool {
        self.rendered.contains(key)
    }

    pub fn record(&mut self, key: LineKey, severity: Severity) {
        if self.rendered.insert(key) {
            self.stats.counts.increment(severity);
        }
    }

    /// Forget every rendered line (the projection is being rebuilt)
    pub fn clear_rendered(&mut self) {
        self.rendered.clear();
        self.stats.counts = SeverityCounts::default();
        self.stats.resets += 1;
    }

    pub fn projection(&self) -> Option<ProjectionId> {
        self.projection
    }

    /// Fresh id for a projection about to be mounted
    pub fn allocate_projection(&mut self) -> ProjectionId {
        self.next_projection += 1;
        ProjectionId(self.next_projection)
    }

    /// Track a newly mounted projection; it starts empty
    pub fn attach(&mut self, id: ProjectionId) {
        self.projection = Some(id);
        self.clear_rendered();
    }

    pub fn last_fingerprint(&self) -> Option<&ContentFingerprint> {
        self.last_fingerprint.as_ref()
    }

    pub fn last_pass(&self) -> Option<Instant> {
        self.last_pass
    }

    /// Same content as the last pass, and that pass was recent
    pub fn is_fresh(&self, fingerprint: &ContentFingerprint, now: Instant, window: Duration) -> bool {
        self.last_fingerprint.as_ref() == Some(fingerprint)
            && self
                .last_pass
                .is_some_and(|at| now.saturating_duration_since(at) < window)
    }

    pub fn mark_pass(&mut self, fingerprint: ContentFingerprint, now: Instant) {
        self.last_fingerprint = Some(fingerprint);
        self.last_pass = Some(now);
        self.stats.passes += 1;
        self.stats.last_pass_at = Some(Local::now());
    }

    pub fn note_skip(&mut self) {
        self.stats.skipped += 1;
    }

    pub fn note_failure(&mut self) {
        self.stats.failures += 1;
    }

    pub fn stats(&self) -> ReconcileStats {
        ReconcileStats {
            rendered: self.rendered.len(),
            projection: self.projection,
            ..self.stats.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_idempotent() {
        let mut state = ReconciliationState::new();
        state.record(LineKey::new(0, "a"), Severity::Failed);
        state.record(LineKey::new(0, "a"), Severity::Failed);
        assert_eq!(state.rendered_len(), 1);
        assert_eq!(state.stats().counts.failed, 1);
    }

    #[test]
    fn test_attach_starts_empty() {
        let mut state = ReconciliationState::new();
        state.record(LineKey::new(0, "a"), Severity::Info);

        let id = state.allocate_projection();
        state.attach(id);
        assert_eq!(state.projection(), Some(id));
        assert_eq!(state.rendered_len(), 0);
        assert_eq!(state.stats().counts.total(), 0);
        assert_ne!(state.allocate_projection(), id);
    }

    #[test]
    fn test_freshness_window() {
        let mut state = ReconciliationState::new();
        let fp = ContentFingerprint::of("a\nb");
        let start = Instant::now();
        let window = Duration::from_millis(500);
        assert!(!state.is_fresh(&fp, start, window));

        state.mark_pass(fp.clone(), start);
        assert!(state.is_fresh(&fp, start + Duration::from_millis(100), window));
        assert!(!state.is_fresh(&fp, start + Duration::from_millis(500), window));
        assert!(!state.is_fresh(&ContentFingerprint::of("a\nc"), start, window));
    }
}
