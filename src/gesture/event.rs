use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::Point;

/// Which control on an item started the gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandleKind {
    Drag,
    Resize,
}

impl HandleKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandleKind::Drag => "drag",
            HandleKind::Resize => "resize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerSource {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PointerButton {
    Primary,
    Secondary,
    Auxiliary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// Raw pointer sample in client (viewport) pixels.
///
/// `timestamp` is measured from any fixed origin the host picks; only
/// differences between samples matter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerInput {
    pub position: Point,
    pub source: PointerSource,
    pub button: PointerButton,
    pub timestamp: Duration,
}

impl PointerInput {
    pub fn mouse(x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            position: Point::new(x, y),
            source: PointerSource::Mouse,
            button: PointerButton::Primary,
            timestamp: Duration::from_millis(timestamp_ms),
        }
    }

    pub fn touch(x: f64, y: f64, timestamp_ms: u64) -> Self {
        Self {
            source: PointerSource::Touch,
            ..Self::mouse(x, y, timestamp_ms)
        }
    }

    pub fn with_button(mut self, button: PointerButton) -> Self {
        self.button = button;
        self
    }
}

/// Per-axis drag direction, each component in `{-1, 0, 1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DirectionDelta {
    pub x: i8,
    pub y: i8,
}

/// Emitted when a pointer-down arms a tracker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerDown {
    pub handle: HandleKind,
    pub pointer_position: Point,
    pub pickup_position: Point,
    pub cancelled: bool,
}

/// Emitted for every move once the gesture is dragging.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerMove {
    pub handle: HandleKind,
    pub pointer_position: Point,
    pub pickup_position: Point,
    pub last_direction_change: Point,
    pub distance: Point,
    pub delta: DirectionDelta,
    pub has_moved: bool,
    pub is_scrolling: bool,
}

/// Emitted once when a gesture ends, normally or by cancellation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEnd {
    pub handle: HandleKind,
    pub pointer_position: Point,
    pub pickup_position: Point,
    pub distance: Point,
    pub delta: DirectionDelta,
    pub has_moved: bool,
    /// The gesture had crossed the threshold and reached `Dragging`.
    pub started: bool,
    pub cancelled: bool,
}

/// Output of a tracker for a single pointer sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureEvent {
    Down(PointerDown),
    Started {
        handle: HandleKind,
        pickup_position: Point,
    },
    Move(PointerMove),
    End(PointerEnd),
}

/// Tracker state machine position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GesturePhase {
    Idle,
    Armed,
    Dragging,
}
