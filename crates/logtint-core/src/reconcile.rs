//! Incremental reconciliation of the rendered projection against the
//! live source text.
//!
//! A pass either skips, appends the lines past the projection's end, or
//! rebuilds the projection from scratch when it was removed or the source
//! shrank. Already rendered lines are never touched again.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::time::Instant;
use tracing::{debug, info, trace, warn};

use logtint_types::{ContentFingerprint, split_lines};

use crate::classifier::Classifier;
use crate::config::Config;
use crate::error::{ReconcileError, SurfaceError};
use crate::render::render_line;
use crate::state::{ReconcileStats, ReconciliationState};
use crate::stylesheet::ensure_stylesheet;
use crate::surface::{LogSurface, SurfaceLocator};

/// Why a pass rebuilt the projection
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetReason {
    /// No projection of ours was mounted, a fresh one was
    Remounted,
    /// The source has fewer lines than were rendered
    Shrunk,
    /// The mounted projection no longer matches what was recorded
    Drift,
}

/// Result of one reconciliation pass
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PassOutcome {
    /// Another pass is running
    Busy,
    /// Discovery found no surface
    NoSurface,
    /// Content unchanged since a recent pass
    FastSkip,
    /// Projection is in sync with the source
    Synced {
        appended: usize,
        total: usize,
        reset: Option<ResetReason>,
    },
    /// The pass hit an error; the next trigger starts over
    Failed(ReconcileError),
}

impl PassOutcome {
    /// Whether the pass changed the projection
    pub fn mutated(&self) -> bool {
        matches!(self, Self::Synced { appended, reset, .. } if *appended > 0 || reset.is_some())
    }

    /// Whether a pass ran to completion
    pub fn completed(&self) -> bool {
        matches!(self, Self::Synced { .. } | Self::FastSkip)
    }
}

/// Holds the in-progress flag for the duration of a pass
struct PassGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> PassGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for PassGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Keeps a surface's projection in sync with its text
pub struct Reconciler {
    classifier: Classifier,
    fast_skip: Duration,
    state: Mutex<ReconciliationState>,
    in_progress: AtomicBool,
}

impl Reconciler {
    pub fn new(classifier: Classifier, fast_skip: Duration) -> Self {
        Self {
            classifier,
            fast_skip,
            state: Mutex::new(ReconciliationState::new()),
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.classifier.build(), config.timing.fast_skip())
    }

    /// Whether a pass is running right now
    pub fn is_busy(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    pub fn stats(&self) -> ReconcileStats {
        self.state.lock().stats()
    }

    /// Monotonic time of the last successful pass
    pub fn last_pass(&self) -> Option<Instant> {
        self.state.lock().last_pass()
    }

    /// Locate the surface and reconcile it
    pub fn reconcile_located<L: SurfaceLocator>(&self, locator: &L) -> PassOutcome {
        locator.with_surface(|surface| self.reconcile(surface))
    }

    pub fn reconcile<S: LogSurface + ?Sized>(&self, surface: Option<&mut S>) -> PassOutcome {
        self.reconcile_at(surface, Instant::now())
    }

    /// Run one pass as of `now`
    pub fn reconcile_at<S: LogSurface + ?Sized>(
        &self,
        surface: Option<&mut S>,
        now: Instant,
    ) -> PassOutcome {
        let Some(_guard) = PassGuard::acquire(&self.in_progress) else {
            trace!("reconciliation already in progress");
            return PassOutcome::Busy;
        };

        let Some(surface) = surface else {
            debug!("log surface not found");
            return PassOutcome::NoSurface;
        };

        let mut state = self.state.lock();
        match self.run_pass(&mut state, surface, now) {
            Ok(outcome) => outcome,
            Err(e) => {
                state.note_failure();
                warn!(error = %e, "reconciliation pass failed");
                PassOutcome::Failed(e)
            }
        }
    }

    /// Whether the projection is missing or the text moved since the last pass
    pub fn needs_pass<S: LogSurface + ?Sized>(&self, surface: &S) -> bool {
        let state = self.state.lock();
        let mounted = surface.mounted_projection();
        if mounted.is_none() || mounted != state.projection() {
            return true;
        }
        state.last_fingerprint() != Some(&ContentFingerprint::of(&surface.text()))
    }

    fn run_pass<S: LogSurface + ?Sized>(
        &self,
        state: &mut ReconciliationState,
        surface: &mut S,
        now: Instant,
    ) -> Result<PassOutcome, ReconcileError> {
        let text = surface.text().into_owned();
        let fingerprint = ContentFingerprint::of(&text);

        if state.is_fresh(&fingerprint, now, self.fast_skip) {
            state.note_skip();
            trace!("content unchanged, skipping pass");
            return Ok(PassOutcome::FastSkip);
        }

        let mut reset = None;

        let projection = match (surface.mounted_projection(), state.projection()) {
            (Some(mounted), Some(ours)) if mounted == ours => ours,
            _ => {
                let offset = surface.scroll_offset();
                let id = state.allocate_projection();
                surface.mount_projection(id);
                surface.set_scroll_offset(offset);
                state.attach(id);
                reset = Some(ResetReason::Remounted);
                id
            }
        };

        ensure_stylesheet(surface);

        let lines = split_lines(&text);

        let mounted_len = surface
            .projection_len(projection)
            .ok_or(SurfaceError::ProjectionDetached(projection))?;

        if mounted_len != state.rendered_len() {
            surface.clear_projection(projection)?;
            state.clear_rendered();
            reset = Some(ResetReason::Drift);
        } else if lines.len() < state.rendered_len() {
            surface.clear_projection(projection)?;
            state.clear_rendered();
            reset = Some(ResetReason::Shrunk);
        }

        if let Some(reason) = reset {
            info!(?reason, %projection, lines = lines.len(), "rebuilding projection");
        }

        let start = state.rendered_len();
        let mut units = Vec::with_capacity(lines.len() - start);
        let mut recorded = Vec::with_capacity(lines.len() - start);

        for line in &lines[start..] {
            let key = line.key();
            if state.is_rendered(&key) {
                continue;
            }

            let severity = self.classifier.classify(line.trimmed());
            if let Some(unit) = render_line(&line.raw_text, line.sequence_index, severity) {
                units.push(unit);
                recorded.push((key, severity));
            }
        }

        let appended = units.len();
        surface.append_units(projection, units)?;
        for (key, severity) in recorded {
            state.record(key, severity);
        }

        state.mark_pass(fingerprint, now);

        if appended > 0 {
            debug!(appended, total = state.rendered_len(), "projection updated");
        }

        Ok(PassOutcome::Synced {
            appended,
            total: state.rendered_len(),
            reset,
        })
    }
}

impl Default for Reconciler {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}
