//! Pointer gesture recognition for dashboard items.
//!
//! One [`PointerGestureTracker`] exists per editable item. The layout service
//! feeds it the shared document-level pointer stream; the container turns its
//! [`GestureEvent`]s into drag and resize steps.

mod core;
pub mod event;

pub use core::{GestureConfig, PointerGestureTracker};
pub use event::{
    Axis, DirectionDelta, GestureEvent, GesturePhase, HandleKind, PointerButton, PointerDown,
    PointerEnd, PointerInput, PointerMove, PointerSource,
};
