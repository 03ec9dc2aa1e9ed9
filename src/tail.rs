//! Follows a log file and mirrors it into a surface.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use logtint_core::{LogSurface, SharedSurface};

/// What a sync did to the surface
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TailChange {
    Unchanged,
    /// Bytes of complete lines appended after the previous content
    Appended(usize),
    /// File was truncated or rewritten; the projection is dropped with it
    Replaced,
}

pub struct FileTailer {
    path: PathBuf,
    surface: SharedSurface,
    interval: Duration,
}

impl FileTailer {
    pub fn new(path: PathBuf, surface: SharedSurface, interval: Duration) -> Self {
        Self {
            path,
            surface,
            interval,
        }
    }

    /// Read the file once and push any difference in complete lines into
    /// the surface
    pub async fn sync_once(&self) -> io::Result<TailChange> {
        let bytes = tokio::fs::read(&self.path).await?;
        let content = String::from_utf8_lossy(complete_lines(&bytes));

        let mut surface = self.surface.lock();
        let change = {
            let current = surface.text();
            if content == current {
                TailChange::Unchanged
            } else if content.starts_with(&*current) {
                TailChange::Appended(content.len() - current.len())
            } else {
                TailChange::Replaced
            }
        };

        match change {
            TailChange::Unchanged => {}
            TailChange::Appended(n) => {
                let start = content.len() - n;
                surface.append_text(&content[start..]);
            }
            // Rendered lines can't be trusted after a rewrite, even when the
            // line count did not drop
            TailChange::Replaced => surface.rerender(content.into_owned()),
        }

        Ok(change)
    }

    /// Poll the file until cancelled
    pub async fn run(self, cancel: CancellationToken) {
        let mut tick = tokio::time::interval(self.interval);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut failing = false;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tick.tick() => {}
            }

            match self.sync_once().await {
                Ok(change) => {
                    if failing {
                        info!(path = %self.path.display(), "log file readable again");
                        failing = false;
                    }
                    match change {
                        TailChange::Unchanged => {}
                        TailChange::Appended(bytes) => debug!(bytes, "log file grew"),
                        TailChange::Replaced => info!(path = %self.path.display(), "log file replaced"),
                    }
                }
                Err(e) => {
                    // Rotation can leave the path missing for a moment
                    if !failing {
                        warn!(path = %self.path.display(), error = %e, "failed to read log file");
                        failing = true;
                    }
                }
            }
        }
    }
}

/// Bytes up to and including the last newline. A trailing partial line
/// stays pending until the writer finishes it.
fn complete_lines(bytes: &[u8]) -> &[u8] {
    match bytes.iter().rposition(|&b| b == b'\n') {
        Some(end) => &bytes[..=end],
        None => &[],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logtint_core::{MemorySurface, Reconciler, Severity};
    use std::sync::atomic::{AtomicUsize, Ordering};

    static NEXT: AtomicUsize = AtomicUsize::new(0);

    fn temp_path() -> PathBuf {
        let n = NEXT.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir().join(format!("logtint-tail-{}-{}.log", std::process::id(), n))
    }

    fn texts(surface: &SharedSurface) -> Vec<String> {
        surface.lock().units().iter().map(|u| u.text.clone()).collect()
    }

    #[tokio::test]
    async fn test_sync_appends_and_replaces() {
        let path = temp_path();
        let surface = MemorySurface::default().shared();
        let tailer = FileTailer::new(path.clone(), surface.clone(), Duration::from_millis(10));

        std::fs::write(&path, "one\n").unwrap();
        assert_eq!(tailer.sync_once().await.unwrap(), TailChange::Appended(4));
        assert_eq!(tailer.sync_once().await.unwrap(), TailChange::Unchanged);

        std::fs::write(&path, "one\ntwo\n").unwrap();
        assert_eq!(tailer.sync_once().await.unwrap(), TailChange::Appended(4));
        assert_eq!(surface.lock().text(), "one\ntwo\n");

        std::fs::write(&path, "fresh\n").unwrap();
        assert_eq!(tailer.sync_once().await.unwrap(), TailChange::Replaced);
        assert_eq!(surface.lock().text(), "fresh\n");

        std::fs::remove_file(&path).unwrap();
        assert!(tailer.sync_once().await.is_err());
    }

    #[tokio::test]
    async fn test_partial_line_waits_for_newline() {
        let path = temp_path();
        let surface = MemorySurface::default().shared();
        let tailer = FileTailer::new(path.clone(), surface.clone(), Duration::from_millis(10));
        let reconciler = Reconciler::default();

        std::fs::write(&path, "one\n[FAILED] Asser").unwrap();
        assert_eq!(tailer.sync_once().await.unwrap(), TailChange::Appended(4));
        reconciler.reconcile(Some(&mut *surface.lock()));
        assert_eq!(texts(&surface), ["one"]);

        std::fs::write(&path, "one\n[FAILED] Assertion: expected true\ntwo\n").unwrap();
        assert!(matches!(
            tailer.sync_once().await.unwrap(),
            TailChange::Appended(_)
        ));
        reconciler.reconcile(Some(&mut *surface.lock()));
        assert_eq!(
            texts(&surface),
            ["one", "[FAILED] Assertion: expected true", "two"]
        );
        assert_eq!(surface.lock().units()[1].severity, Severity::Failed);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_split_multibyte_char_is_not_replaced() {
        let path = temp_path();
        let surface = MemorySurface::default().shared();
        let tailer = FileTailer::new(path.clone(), surface.clone(), Duration::from_millis(10));

        std::fs::write(&path, b"ok\ncaf\xC3").unwrap();
        tailer.sync_once().await.unwrap();
        assert_eq!(surface.lock().text(), "ok\n");

        std::fs::write(&path, "ok\ncafé\n").unwrap();
        assert_eq!(tailer.sync_once().await.unwrap(), TailChange::Appended(6));
        assert_eq!(surface.lock().text(), "ok\ncafé\n");
        assert!(!surface.lock().text().contains('\u{FFFD}'));

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_rewrite_rebuilds_projection() {
        let path = temp_path();
        let surface = MemorySurface::default().shared();
        let tailer = FileTailer::new(path.clone(), surface.clone(), Duration::from_millis(10));
        let reconciler = Reconciler::default();

        std::fs::write(&path, "a\nb\n").unwrap();
        tailer.sync_once().await.unwrap();
        reconciler.reconcile(Some(&mut *surface.lock()));
        assert_eq!(texts(&surface), ["a", "b"]);

        // More lines than before
        std::fs::write(&path, "x\ny\nz\n").unwrap();
        assert_eq!(tailer.sync_once().await.unwrap(), TailChange::Replaced);
        assert!(surface.lock().units().is_empty());
        reconciler.reconcile(Some(&mut *surface.lock()));
        assert_eq!(texts(&surface), ["x", "y", "z"]);

        // Same number of lines
        std::fs::write(&path, "1\n2\n3\n").unwrap();
        assert_eq!(tailer.sync_once().await.unwrap(), TailChange::Replaced);
        reconciler.reconcile(Some(&mut *surface.lock()));
        assert_eq!(texts(&surface), ["1", "2", "3"]);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_complete_lines() {
        assert_eq!(complete_lines(b""), b"");
        assert_eq!(complete_lines(b"partial"), b"");
        assert_eq!(complete_lines(b"a\nb"), b"a\n");
        assert_eq!(complete_lines(b"a\nb\n"), b"a\nb\n");
    }
}
