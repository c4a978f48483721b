//! Responsive dashboard grid layout engine.
//!
//! Items are packed onto a column grid whose width follows the viewport
//! breakpoint. In edit mode items can be dragged and resized with a pointer;
//! the rest of the grid flows around the manipulated item and the committed
//! layout is published to observers. Rendering stays with the host, which
//! receives positions through a [`Styler`].

pub mod config;
pub mod error;
pub mod geometry;
pub mod gesture;
pub mod layout;
pub mod logging;
pub mod metrics;
pub mod registry;
pub mod render;
pub mod runtime;

pub use config::{AUTO_SCROLL_STEP, GridConfig};
pub use error::{LayoutError, Result};
pub use geometry::{GridPosition, PixelRect, Point, Rect, ScrollPosition};
pub use gesture::{
    GestureConfig, GestureEvent, GesturePhase, HandleKind, PointerButton, PointerEnd,
    PointerGestureTracker, PointerInput, PointerMove, PointerSource,
};
pub use layout::{GridCoordinator, ScreenColumns, ScreenSize, ScreenValues};
pub use logging::{LogEvent, LogFields, LogLevel, Logger, LoggingError, LoggingResult};
pub use metrics::{LayoutMetrics, MetricSnapshot};
pub use registry::{
    Item, ItemId, ItemPatch, ItemSpec, LayoutItem, LayoutService, ListenerHost, NoopListenerHost,
};
pub use render::{GridMetrics, GridStyler, StyleTarget, StyledFrame, Styler};
pub use runtime::autoscroll::{AutoScroller, SafeZone, ScrollDirection, ScrollMetrics};
pub use runtime::diagnostics::{LifecycleLogger, MetricsSnapshotObserver};
pub use runtime::driver::{DriverResult, TerminalDriver, TerminalDriverError, TerminalPointer};
pub use runtime::observer::{
    ChangePhase, LayoutChange, LayoutObserver, PhaseEvent, RecordingObserver,
};
pub use runtime::{ContainerOptions, EventFlow, FrameReport, LayoutContainer};
