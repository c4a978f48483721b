use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::event::{
    Axis, DirectionDelta, GestureEvent, GesturePhase, HandleKind, PointerButton, PointerDown,
    PointerEnd, PointerInput, PointerMove, PointerSource,
};
use crate::{Point, ScrollPosition};

/// Thresholds and timeouts for pointer gestures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GestureConfig {
    /// Minimum manhattan distance (px) before a drag starts.
    pub drag_start_threshold: f64,
    /// Movement (px) along an axis before the direction delta may flip.
    pub direction_change_threshold: f64,
    /// Time the pointer must be held before a drag may start.
    pub drag_start_delay_ms: u64,
    /// Mouse events this soon after a touch are treated as synthetic.
    pub mouse_ignore_ms: u64,
    pub lock_axis: Option<Axis>,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            drag_start_threshold: 5.0,
            direction_change_threshold: 5.0,
            drag_start_delay_ms: 0,
            mouse_ignore_ms: 800,
            lock_axis: None,
        }
    }
}

impl GestureConfig {
    pub fn drag_start_delay(&self) -> Duration {
        Duration::from_millis(self.drag_start_delay_ms)
    }

    pub fn mouse_ignore_window(&self) -> Duration {
        Duration::from_millis(self.mouse_ignore_ms)
    }
}

#[derive(Debug, Clone)]
struct GestureState {
    handle: HandleKind,
    pickup: Point,
    delta: DirectionDelta,
    last_direction_change: Point,
    started: bool,
    has_moved: bool,
    start_time: Duration,
    scroll_at_pickup: ScrollPosition,
}

/// Converts raw pointer samples for one item into drag/resize gestures.
///
/// `Idle → Armed` on an accepted pointer-down, `Armed → Dragging` once the
/// pointer travelled `drag_start_threshold` after the start delay, back to
/// `Idle` on pointer-up or cancellation. Crossing the threshold before the
/// delay elapsed cancels the gesture instead of starting it.
#[derive(Debug, Clone)]
pub struct PointerGestureTracker {
    config: GestureConfig,
    state: Option<GestureState>,
    last_touch: Option<Duration>,
}

impl PointerGestureTracker {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            state: None,
            last_touch: None,
        }
    }

    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    pub fn phase(&self) -> GesturePhase {
        match &self.state {
            None => GesturePhase::Idle,
            Some(state) if state.started => GesturePhase::Dragging,
            Some(_) => GesturePhase::Armed,
        }
    }

    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    pub fn handle(&self) -> Option<HandleKind> {
        self.state.as_ref().map(|state| state.handle)
    }

    pub fn pickup_position(&self) -> Option<Point> {
        self.state.as_ref().map(|state| state.pickup)
    }

    pub fn scroll_at_pickup(&self) -> Option<ScrollPosition> {
        self.state.as_ref().map(|state| state.scroll_at_pickup)
    }

    /// Arm the tracker. Returns `None` when the sample is ignored: a gesture
    /// is already active, a non-primary button was pressed, or a mouse event
    /// arrived inside the ignore window of a touch sequence.
    pub fn pointer_down(
        &mut self,
        handle: HandleKind,
        input: &PointerInput,
        scroll: ScrollPosition,
    ) -> Option<PointerDown> {
        let is_touch = input.source == PointerSource::Touch;
        let auxiliary = !is_touch && input.button != PointerButton::Primary;
        if self.state.is_some() || auxiliary || self.is_synthetic(input) {
            return None;
        }
        if is_touch {
            self.last_touch = Some(input.timestamp);
        }

        let pickup = input.position;
        self.state = Some(GestureState {
            handle,
            pickup,
            delta: DirectionDelta::default(),
            last_direction_change: pickup,
            started: false,
            has_moved: false,
            start_time: input.timestamp,
            scroll_at_pickup: scroll,
        });

        Some(PointerDown {
            handle,
            pointer_position: pickup,
            pickup_position: pickup,
            cancelled: false,
        })
    }

    /// Feed a move sample. `scroll` is the synthetic vertical scroll amount
    /// merged into this sample by an auto-scroll tick (0 for real moves).
    pub fn pointer_move(&mut self, input: &PointerInput, scroll: f64) -> Option<GestureEvent> {
        let threshold = self.config.drag_start_threshold;
        let delay = self.config.drag_start_delay();
        let state = self.state.as_mut()?;

        if !state.started {
            let distance_x = (input.position.x - state.pickup.x).abs();
            let distance_y = (input.position.y - state.pickup.y).abs() + scroll.abs();
            if distance_x + distance_y < threshold {
                return None;
            }
            let elapsed = input.timestamp.saturating_sub(state.start_time);
            if elapsed < delay {
                return self.finish(input, true).map(GestureEvent::End);
            }
            state.started = true;
            let started = GestureEvent::Started {
                handle: state.handle,
                pickup_position: state.pickup,
            };
            if input.source == PointerSource::Touch {
                self.last_touch = Some(input.timestamp);
            }
            return Some(started);
        }

        let mut position = constrain(self.config.lock_axis, state.pickup, input.position);
        state.has_moved = true;
        update_direction(state, position, self.config.direction_change_threshold);
        let mut distance = Point::new(position.x - state.pickup.x, position.y - state.pickup.y);
        position.y += scroll;
        distance.y += scroll;

        Some(GestureEvent::Move(PointerMove {
            handle: state.handle,
            pointer_position: position,
            pickup_position: state.pickup,
            last_direction_change: state.last_direction_change,
            distance,
            delta: state.delta,
            has_moved: state.has_moved,
            is_scrolling: scroll != 0.0,
        }))
    }

    /// End the gesture normally.
    pub fn pointer_up(&mut self, input: &PointerInput) -> Option<PointerEnd> {
        if input.source == PointerSource::Touch && self.state.is_some() {
            self.last_touch = Some(input.timestamp);
        }
        self.finish(input, false)
    }

    /// Abort the gesture without a pointer sample (edit mode left, item removed).
    pub fn cancel(&mut self) -> Option<PointerEnd> {
        let state = self.state.take()?;
        Some(PointerEnd {
            handle: state.handle,
            pointer_position: state.pickup,
            pickup_position: state.pickup,
            distance: Point::default(),
            delta: state.delta,
            has_moved: state.has_moved,
            started: state.started,
            cancelled: true,
        })
    }

    /// Move the pickup point, keeping distances consistent after the content
    /// under the pointer scrolled.
    pub fn shift_pickup(&mut self, dx: f64, dy: f64) {
        if let Some(state) = self.state.as_mut() {
            state.pickup.x += dx;
            state.pickup.y += dy;
        }
    }

    fn finish(&mut self, input: &PointerInput, cancelled: bool) -> Option<PointerEnd> {
        let state = self.state.take()?;
        let position = constrain(self.config.lock_axis, state.pickup, input.position);
        Some(PointerEnd {
            handle: state.handle,
            pointer_position: position,
            pickup_position: state.pickup,
            distance: Point::new(position.x - state.pickup.x, position.y - state.pickup.y),
            delta: state.delta,
            has_moved: state.has_moved,
            started: state.started,
            cancelled,
        })
    }

    fn is_synthetic(&self, input: &PointerInput) -> bool {
        if input.source != PointerSource::Mouse {
            return false;
        }
        self.last_touch
            .map(|touched| input.timestamp < touched + self.config.mouse_ignore_window())
            .unwrap_or(false)
    }
}

fn constrain(lock_axis: Option<Axis>, pickup: Point, position: Point) -> Point {
    match lock_axis {
        Some(Axis::X) => Point::new(position.x, pickup.y),
        Some(Axis::Y) => Point::new(pickup.x, position.y),
        None => position,
    }
}

fn update_direction(state: &mut GestureState, position: Point, threshold: f64) {
    let last = &mut state.last_direction_change;
    if (position.x - last.x).abs() > threshold {
        state.delta.x = if position.x > last.x { 1 } else { -1 };
        last.x = position.x;
    }
    if (position.y - last.y).abs() > threshold {
        state.delta.y = if position.y > last.y { 1 } else { -1 };
        last.y = position.y;
    }
}
