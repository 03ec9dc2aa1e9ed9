//! The log surface contract and an in-memory surface.
//!
//! A surface holds the live source text, owns the mounted projection as a
//! child, and keeps a scroll offset. Discovery goes through a
//! [`SurfaceLocator`] on every pass because hosts may recreate surfaces.

use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;

use logtint_types::{DisplayUnit, ProjectionId};

use crate::error::SurfaceError;
use crate::mutation::{MutationRecord, NodeInfo};

/// Channel carrying batches of change notifications
pub type MutationSender = mpsc::UnboundedSender<Vec<MutationRecord>>;
pub type MutationReceiver = mpsc::UnboundedReceiver<Vec<MutationRecord>>;

/// External container exposing live log text
pub trait LogSurface {
    /// Current full source text
    fn text(&self) -> Cow<'_, str>;

    /// Id of the projection currently mounted, if any
    fn mounted_projection(&self) -> Option<ProjectionId>;

    /// Replace any mounted projection with a fresh, empty one
    fn mount_projection(&mut self, id: ProjectionId);

    /// Number of units in the given projection, `None` if it is not mounted
    fn projection_len(&self, id: ProjectionId) -> Option<usize>;

    /// Append units to the end of the mounted projection
    fn append_units(&mut self, id: ProjectionId, units: Vec<DisplayUnit>) -> Result<(), SurfaceError>;

    /// Remove every unit from the mounted projection
    fn clear_projection(&mut self, id: ProjectionId) -> Result<(), SurfaceError>;

    fn scroll_offset(&self) -> usize;

    fn set_scroll_offset(&mut self, offset: usize);

    fn has_stylesheet(&self, id: &str) -> bool;

    fn inject_stylesheet(&mut self, id: &str, css: &str);
}

/// Finds the surface for a pass
pub trait SurfaceLocator {
    type Surface: LogSurface + ?Sized;

    /// Run `f` with the located surface, or `None` when discovery misses
    fn with_surface<R>(&self, f: impl FnOnce(Option<&mut Self::Surface>) -> R) -> R;
}

/// Surface shared between the host and the reconciler
pub type SharedSurface = Arc<Mutex<MemorySurface>>;

impl SurfaceLocator for SharedSurface {
    type Surface = MemorySurface;

    fn with_surface<R>(&self, f: impl FnOnce(Option<&mut MemorySurface>) -> R) -> R {
        let mut surface = self.lock();
        f(Some(&mut *surface))
    }
}

struct MountedProjection {
    id: ProjectionId,
    units: Vec<DisplayUnit>,
}

/// In-memory log surface that reports its own changes
#[derive(Default)]
pub struct MemorySurface {
    text: String,
    projection: Option<MountedProjection>,
    scroll_offset: usize,
    stylesheets: HashMap<String, String>,
    notifier: Option<MutationSender>,
}

impl MemorySurface {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    /// Report every change on the given channel
    pub fn with_notifier(mut self, notifier: MutationSender) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn set_notifier(&mut self, notifier: MutationSender) {
        self.notifier = Some(notifier);
    }

    pub fn shared(self) -> SharedSurface {
        Arc::new(Mutex::new(self))
    }

    /// Host appended text to the live log
    pub fn append_text(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.text.push_str(text);
        self.notify(MutationRecord::character_data(NodeInfo::text()));
    }

    /// Host swapped the source text, leaving the projection in place
    pub fn replace_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.notify(MutationRecord::child_list(
            NodeInfo::host(),
            vec![NodeInfo::text()],
            vec![NodeInfo::text()],
        ));
    }

    /// Host re-rendered the whole surface, dropping the projection with it
    pub fn rerender(&mut self, text: impl Into<String>) {
        self.text = text.into();
        let mut removed = vec![NodeInfo::text()];
        if self.projection.take().is_some() {
            removed.push(NodeInfo::projection_root());
        }
        self.notify(MutationRecord::child_list(
            NodeInfo::host(),
            vec![NodeInfo::text()],
            removed,
        ));
    }

    /// Host removed the projection without touching the text
    pub fn remove_projection(&mut self) -> bool {
        if self.projection.take().is_none() {
            return false;
        }
        self.notify(MutationRecord::child_list(
            NodeInfo::host(),
            Vec::new(),
            vec![NodeInfo::projection_root()],
        ));
        true
    }

    /// Units of the mounted projection (empty when none is mounted)
    pub fn units(&self) -> &[DisplayUnit] {
        self.projection
            .as_ref()
            .map(|p| p.units.as_slice())
            .unwrap_or_default()
    }

    pub fn stylesheet(&self, id: &str) -> Option<&str> {
        self.stylesheets.get(id).map(String::as_str)
    }

    pub fn stylesheet_count(&self) -> usize {
        self.stylesheets.len()
    }

    fn mounted_mut(&mut self, id: ProjectionId) -> Result<&mut MountedProjection, SurfaceError> {
        self.projection
            .as_mut()
            .filter(|p| p.id == id)
            .ok_or(SurfaceError::ProjectionDetached(id))
    }

    fn notify(&self, record: MutationRecord) {
        if let Some(tx) = &self.notifier {
            // Receiver gone means nobody observes this surface anymore
            let _ = tx.send(vec![record]);
        }
    }
}

impl LogSurface for MemorySurface {
    fn text(&self) -> Cow<'_, str> {
        Cow::Borrowed(&self.text)
    }

    fn mounted_projection(&self) -> Option<ProjectionId> {
        self.projection.as_ref().map(|p| p.id)
    }

    fn mount_projection(&mut self, id: ProjectionId) {
        let previous = self.projection.replace(MountedProjection {
            id,
            units: Vec::new(),
        });

        let removed = if previous.is_some() {
            vec![NodeInfo::projection_root()]
        } else {
            Vec::new()
        };
        self.notify(MutationRecord::child_list(
            NodeInfo::host(),
            vec![NodeInfo::projection_root()],
            removed,
        ));
    }

    fn projection_len(&self, id: ProjectionId) -> Option<usize> {
        self.projection
            .as_ref()
            .filter(|p| p.id == id)
            .map(|p| p.units.len())
    }

    fn append_units(&mut self, id: ProjectionId, units: Vec<DisplayUnit>) -> Result<(), SurfaceError> {
        if units.is_empty() {
            return Ok(());
        }
        let added = units.iter().map(|u| NodeInfo::unit(u.severity)).collect();
        self.mounted_mut(id)?.units.extend(units);
        self.notify(MutationRecord::child_list(
            NodeInfo::projection_root(),
            added,
            Vec::new(),
        ));
        Ok(())
    }

    fn clear_projection(&mut self, id: ProjectionId) -> Result<(), SurfaceError> {
        let projection = self.mounted_mut(id)?;
        let removed: Vec<_> = projection
            .units
            .drain(..)
            .map(|u| NodeInfo::unit(u.severity))
            .collect();
        if !removed.is_empty() {
            self.notify(MutationRecord::child_list(
                NodeInfo::projection_root(),
                Vec::new(),
                removed,
            ));
        }
        Ok(())
    }

    fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    fn set_scroll_offset(&mut self, offset: usize) {
        self.scroll_offset = offset;
    }

    fn has_stylesheet(&self, id: &str) -> bool {
        self.stylesheets.contains_key(id)
    }

    fn inject_stylesheet(&mut self, id: &str, css: &str) {
        self.stylesheets.insert(id.to_string(), css.to_string());
    }
}

/// Candidate surfaces, searched by marker on every pass
#[derive(Clone, Default)]
pub struct SurfaceRegistry {
    candidates: Arc<RwLock<Vec<SharedSurface>>>,
    marker: String,
}

impl SurfaceRegistry {
    /// An empty marker matches any candidate
    pub fn new(marker: impl Into<String>) -> Self {
        Self {
            candidates: Arc::new(RwLock::new(Vec::new())),
            marker: marker.into(),
        }
    }

    pub fn register(&self, surface: SharedSurface) {
        self.candidates.write().push(surface);
    }

    /// Swap the full candidate set, as when the host recreates its surfaces
    pub fn replace_all(&self, surfaces: Vec<SharedSurface>) {
        *self.candidates.write() = surfaces;
    }

    pub fn clear(&self) {
        self.candidates.write().clear();
    }

    pub fn len(&self) -> usize {
        self.candidates.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.read().is_empty()
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// First candidate whose text contains the marker
    pub fn find(&self) -> Option<SharedSurface> {
        self.candidates
            .read()
            .iter()
            .find(|c| self.marker.is_empty() || c.lock().text().contains(self.marker.as_str()))
            .cloned()
    }
}

impl SurfaceLocator for SurfaceRegistry {
    type Surface = MemorySurface;

    fn with_surface<R>(&self, f: impl FnOnce(Option<&mut MemorySurface>) -> R) -> R {
        match self.find() {
            Some(surface) => {
                let mut guard = surface.lock();
                f(Some(&mut *guard))
            }
            None => f(None),
        }
    }
}
