use crate::geometry::{PixelRect, ScrollPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ScrollDirection {
    Up,
    Down,
    #[default]
    None,
}

impl ScrollDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrollDirection::Up => "up",
            ScrollDirection::Down => "down",
            ScrollDirection::None => "none",
        }
    }
}

/// Geometry of the scrollable parent, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollMetrics {
    /// Visible box of the scroll node.
    pub viewport: PixelRect,
    pub position: ScrollPosition,
    /// Largest reachable `position.top`.
    pub max_top: f64,
}

impl ScrollMetrics {
    pub fn new(viewport: PixelRect, position: ScrollPosition, max_top: f64) -> Self {
        Self {
            viewport,
            position,
            max_top: max_top.max(0.0),
        }
    }
}

/// Edges of the area inside which a dragged pointer does not scroll.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SafeZone {
    pub top: f64,
    pub bottom: f64,
}

impl SafeZone {
    /// The top edge is whichever is lower of the padded viewport top and the
    /// container top; the bottom edge is the padded viewport bottom.
    pub fn new(scroll: &ScrollMetrics, container: &PixelRect, padding_top: f64, padding_bottom: f64) -> Self {
        Self {
            top: (scroll.viewport.top + padding_top).max(container.top),
            bottom: scroll.viewport.bottom() - padding_bottom,
        }
    }
}

/// Per-frame edge scrolling while a gesture holds the pointer near an edge.
#[derive(Debug, Clone)]
pub struct AutoScroller {
    step: f64,
    direction: ScrollDirection,
    running: bool,
}

impl AutoScroller {
    pub fn new(step: f64) -> Self {
        Self {
            step,
            direction: ScrollDirection::None,
            running: false,
        }
    }

    pub fn direction(&self) -> ScrollDirection {
        self.direction
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Pick a direction for a pointer at `pointer_y` and start or stop the
    /// loop accordingly.
    pub fn evaluate(&mut self, pointer_y: f64, zone: SafeZone, scroll_top: f64) -> ScrollDirection {
        self.direction = if pointer_y < zone.top && scroll_top > 0.0 {
            ScrollDirection::Up
        } else if pointer_y > zone.bottom {
            ScrollDirection::Down
        } else {
            ScrollDirection::None
        };
        if self.direction == ScrollDirection::None {
            self.stop();
        } else {
            self.running = true;
        }
        self.direction
    }

    /// Stop the loop. Safe to call any number of times; returns whether it
    /// was running.
    pub fn stop(&mut self) -> bool {
        let was_running = self.running;
        self.running = false;
        self.direction = ScrollDirection::None;
        was_running
    }

    /// Signed scroll amount for this frame, limited to the room left in the
    /// scroll direction. `None` when idle or already at the edge.
    pub fn tick(&self, scroll: &ScrollMetrics) -> Option<f64> {
        if !self.running {
            return None;
        }
        let amount = match self.direction {
            ScrollDirection::Up => -self.step.min(scroll.position.top),
            ScrollDirection::Down => self.step.min(scroll.max_top - scroll.position.top),
            ScrollDirection::None => 0.0,
        };
        if amount == 0.0 || amount.is_nan() || self.direction_mismatch(amount) {
            return None;
        }
        Some(amount)
    }

    fn direction_mismatch(&self, amount: f64) -> bool {
        match self.direction {
            ScrollDirection::Up => amount > 0.0,
            ScrollDirection::Down => amount < 0.0,
            ScrollDirection::None => true,
        }
    }
}
