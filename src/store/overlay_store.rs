use std::collections::HashSet;

use crate::foundation::error::{PhotoveilError, PhotoveilResult};
use crate::scene::model::{CatalogItem, Overlay, OverlayId, OverlayKind, OverlayPatch};
use crate::store::history::{DEFAULT_HISTORY_CAPACITY, History, Snapshot};

/// Ordered overlays (bottom to top), the current selection and the undo history.
#[derive(Clone, Debug)]
pub struct OverlayStore {
    overlays: Vec<Overlay>,
    selected: Option<OverlayId>,
    next_id: u64,
    history: History,
}

impl Default for OverlayStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            overlays: Vec::new(),
            selected: None,
            next_id: 1,
            history: History::new(capacity),
        }
    }

    /// Seed a store from existing overlays (e.g. a loaded document). Ids must be unique.
    pub fn from_overlays(
        overlays: Vec<Overlay>,
        history_capacity: usize,
    ) -> PhotoveilResult<Self> {
        let mut seen = HashSet::new();
        for o in &overlays {
            if !seen.insert(o.id) {
                return Err(PhotoveilError::validation(format!(
                    "duplicate overlay id {}",
                    o.id
                )));
            }
        }
        let next_id = overlays.iter().map(|o| o.id.0).max().map_or(1, |m| m + 1);
        Ok(Self {
            overlays,
            selected: None,
            next_id,
            history: History::new(history_capacity),
        })
    }

    /// Overlays in paint order.
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    pub fn get(&self, id: OverlayId) -> Option<&Overlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    pub fn selected(&self) -> Option<OverlayId> {
        self.selected
    }

    pub fn selected_overlay(&self) -> Option<&Overlay> {
        self.selected.and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.overlays.len()
    }

    pub fn is_empty(&self) -> bool {
        self.overlays.is_empty()
    }

    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            overlays: self.overlays.clone(),
            selected: self.selected,
        }
    }

    fn index_of(&self, id: OverlayId) -> Option<usize> {
        self.overlays.iter().position(|o| o.id == id)
    }

    /// Record the current state as one undo step. Called once when a gesture starts.
    pub fn checkpoint(&mut self) {
        let snap = self.snapshot();
        self.history.push(snap);
    }

    /// Drop the most recent checkpoint without restoring it.
    pub fn discard_checkpoint(&mut self) {
        self.history.pop();
    }

    /// Append an overlay with default transform, select it and return its id.
    pub fn add(&mut self, kind: OverlayKind, value: impl Into<String>) -> OverlayId {
        self.checkpoint();
        let id = OverlayId(self.next_id);
        self.next_id += 1;
        self.overlays.push(Overlay::new(id, kind, value));
        self.selected = Some(id);
        tracing::debug!(overlay = %id, ?kind, "overlay added");
        id
    }

    pub fn add_from_catalog(&mut self, item: &CatalogItem) -> OverlayId {
        self.add(item.kind, item.value.clone())
    }

    /// Merge `patch` into an overlay as its own undo step. Unknown ids are ignored.
    pub fn update(&mut self, id: OverlayId, patch: &OverlayPatch) -> bool {
        if self.index_of(id).is_none() || patch.is_empty() {
            return false;
        }
        self.checkpoint();
        self.apply_transient(id, patch)
    }

    /// Merge `patch` without recording history; used for in-gesture frames.
    pub fn apply_transient(&mut self, id: OverlayId, patch: &OverlayPatch) -> bool {
        match self.index_of(id) {
            Some(i) => {
                patch.apply_to(&mut self.overlays[i]);
                true
            }
            None => false,
        }
    }

    /// Put back a previously captured overlay by id, without recording history.
    pub fn restore_overlay(&mut self, overlay: Overlay) -> bool {
        match self.index_of(overlay.id) {
            Some(i) => {
                self.overlays[i] = overlay;
                true
            }
            None => false,
        }
    }

    /// Remove an overlay; the selection is cleared only if it pointed at the removed one.
    pub fn remove(&mut self, id: OverlayId) -> bool {
        let Some(i) = self.index_of(id) else {
            return false;
        };
        self.checkpoint();
        self.overlays.remove(i);
        if self.selected == Some(id) {
            self.selected = None;
        }
        tracing::debug!(overlay = %id, "overlay removed");
        true
    }

    /// Select an existing overlay or clear the selection. Unknown ids clear it.
    pub fn select(&mut self, id: Option<OverlayId>) {
        self.selected = id.filter(|id| self.index_of(*id).is_some());
    }

    /// Remove every overlay (base image cleared).
    pub fn clear(&mut self) {
        if self.overlays.is_empty() && self.selected.is_none() {
            return;
        }
        self.checkpoint();
        self.overlays.clear();
        self.selected = None;
    }

    /// Restore the collection and selection captured before the last mutation.
    pub fn undo(&mut self) -> bool {
        let Some(snap) = self.history.pop() else {
            return false;
        };
        self.overlays = snap.overlays;
        self.selected = snap.selected;
        tracing::debug!(remaining = self.history.len(), "undo");
        true
    }
}

#[cfg(test)]
#[path = "../../tests/unit/store/overlay_store.rs"]
mod tests;
