use std::sync::{Arc, Mutex, PoisonError};

use blake3::Hash;
use serde::Serialize;

use crate::error::Result;
use crate::registry::{ItemId, LayoutItem};
use crate::runtime::drag::PositionOffset;

/// Step of a drag or resize as seen by observers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangePhase {
    StartDragging,
    Dragging,
    EndDragging,
    StartResizing,
    Resizing,
    EndResizing,
}

impl ChangePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChangePhase::StartDragging => "startDragging",
            ChangePhase::Dragging => "dragging",
            ChangePhase::EndDragging => "endDragging",
            ChangePhase::StartResizing => "startResizing",
            ChangePhase::Resizing => "resizing",
            ChangePhase::EndResizing => "endResizing",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PhaseEvent {
    pub item: ItemId,
    pub phase: ChangePhase,
    pub offset: PositionOffset,
}

/// Layout summary emitted when a gesture commits.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutChange {
    pub items: Vec<LayoutItem>,
    /// blake3 of the JSON item list.
    pub digest: Hash,
    /// False when the list is identical to the previous emission.
    pub changed: bool,
}

impl LayoutChange {
    pub fn new(items: Vec<LayoutItem>, previous: Option<&Hash>) -> Result<Self> {
        let digest = blake3::hash(&serde_json::to_vec(&items)?);
        let changed = previous.map(|last| *last != digest).unwrap_or(true);
        Ok(Self {
            items,
            digest,
            changed,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.items)?)
    }
}

/// Receives gesture phases and committed layouts from a container.
pub trait LayoutObserver: Send {
    fn name(&self) -> &str {
        "layout_observer"
    }

    fn on_phase(&mut self, _event: &PhaseEvent) {}

    fn on_layout_change(&mut self, _change: &LayoutChange) {}
}

/// Observer that stores everything it sees. Clones share the buffers.
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    phases: Arc<Mutex<Vec<PhaseEvent>>>,
    changes: Arc<Mutex<Vec<LayoutChange>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn phases(&self) -> Vec<ChangePhase> {
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|event| event.phase)
            .collect()
    }

    pub fn phase_events(&self) -> Vec<PhaseEvent> {
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn changes(&self) -> Vec<LayoutChange> {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear(&self) {
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LayoutObserver for RecordingObserver {
    fn name(&self) -> &str {
        "recording_observer"
    }

    fn on_phase(&mut self, event: &PhaseEvent) {
        self.phases
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }

    fn on_layout_change(&mut self, change: &LayoutChange) {
        self.changes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(change.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::ScreenColumns;

    fn items(order: i32) -> Vec<LayoutItem> {
        vec![LayoutItem {
            id: "a".to_string(),
            cols: 4,
            rows: 2,
            screen_columns: ScreenColumns::new(1, 4, 4, 4),
            order,
        }]
    }

    #[test]
    fn digest_flags_repeated_layouts() {
        let first = LayoutChange::new(items(0), None).unwrap();
        assert!(first.changed);
        let same = LayoutChange::new(items(0), Some(&first.digest)).unwrap();
        assert!(!same.changed);
        let moved = LayoutChange::new(items(1), Some(&first.digest)).unwrap();
        assert!(moved.changed);
    }

    #[test]
    fn json_uses_persisted_field_names() {
        let change = LayoutChange::new(items(3), None).unwrap();
        let json = change.to_json().unwrap();
        assert!(json.contains("\"screenColumns\""));
        assert!(json.contains("\"order\":3"));
    }
}
