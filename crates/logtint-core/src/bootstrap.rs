//! Startup discovery with bounded retries.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::TimingConfig;
use crate::reconcile::{PassOutcome, Reconciler};
use crate::surface::SurfaceLocator;

/// How startup went
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BootstrapOutcome {
    /// First pass ran after `retries` failed discovery attempts
    Ran { retries: u32, outcome: PassOutcome },
    /// Cancelled before the first pass
    Cancelled,
}

/// Wait one retry period, then look for the surface up to
/// `bootstrap_retries` more times before running the first pass anyway.
/// A miss at that point leaves the surface to the fallback poll.
pub async fn bootstrap<L: SurfaceLocator>(
    locator: &L,
    reconciler: &Reconciler,
    timing: &TimingConfig,
    cancel: &CancellationToken,
) -> BootstrapOutcome {
    let mut retries = 0;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => return BootstrapOutcome::Cancelled,
            _ = tokio::time::sleep(timing.bootstrap_retry()) => {}
        }

        let found = locator.with_surface(|surface| surface.is_some());
        if found || retries >= timing.bootstrap_retries {
            break;
        }

        retries += 1;
        debug!(
            retry = retries,
            max = timing.bootstrap_retries,
            "log surface not found, retrying"
        );
    }

    let outcome = reconciler.reconcile_located(locator);
    info!(retries, ?outcome, "initial reconciliation finished");
    BootstrapOutcome::Ran { retries, outcome }
}
