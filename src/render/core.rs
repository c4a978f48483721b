use std::collections::HashMap;

use crate::geometry::{GridPosition, PixelRect};
use crate::registry::ItemId;

/// What a styled position belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StyleTarget {
    Item(ItemId),
    Placeholder,
}

impl StyleTarget {
    pub fn item(id: impl Into<ItemId>) -> Self {
        StyleTarget::Item(id.into())
    }
}

/// Pixel size of one grid cell and the gap between cells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridMetrics {
    pub column_width: f64,
    pub row_height: f64,
    pub gutter: f64,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            column_width: 1.0,
            row_height: 1.0,
            gutter: 0.0,
        }
    }
}

impl GridMetrics {
    /// Column width for a container `width` pixels wide split into `cols`
    /// columns. Falls back to one pixel while the container has no size.
    pub fn for_container(width: f64, cols: u16, gutter: f64, row_height: f64) -> Self {
        let cols = f64::from(cols.max(1));
        let column_width = (width - (cols - 1.0) * gutter) / cols;
        Self {
            column_width: if column_width > 0.0 { column_width } else { 1.0 },
            row_height: if row_height > 0.0 { row_height } else { 1.0 },
            gutter,
        }
    }

    /// Frame of `position` relative to the container's top-left corner.
    pub fn frame(&self, position: GridPosition) -> PixelRect {
        let columns = position.column_end.saturating_sub(position.column_start);
        let rows = position.row_end.saturating_sub(position.row_start);
        PixelRect::new(
            f64::from(position.column_start) * (self.column_width + self.gutter),
            f64::from(position.row_start) * (self.row_height + self.gutter),
            span_pixels(columns, self.column_width, self.gutter),
            span_pixels(rows, self.row_height, self.gutter),
        )
    }

    /// Pixel height of a grid `rows` rows deep.
    pub fn content_height(&self, rows: u16) -> f64 {
        span_pixels(rows, self.row_height, self.gutter)
    }
}

fn span_pixels(cells: u16, size: f64, gutter: f64) -> f64 {
    if cells == 0 {
        return 0.0;
    }
    let cells = f64::from(cells);
    cells * size + (cells - 1.0) * gutter
}

/// One-way boundary that makes computed positions visible.
///
/// Implementations must not feed anything back into layout computation.
pub trait Styler {
    /// Place `target`. `first_layout` asks for no transition animation.
    fn set_position(&mut self, target: &StyleTarget, position: GridPosition, first_layout: bool);

    fn set_placeholder_visible(&mut self, _visible: bool) {}

    /// Cell geometry changed (container resize or breakpoint change).
    fn set_metrics(&mut self, _metrics: GridMetrics) {}

    /// `target` left the layout.
    fn remove(&mut self, _target: &StyleTarget) {}
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StyledFrame {
    pub position: GridPosition,
    pub frame: PixelRect,
    pub animated: bool,
}

/// Styler that keeps the last frame of every target in memory.
///
/// Hosts that draw on their own schedule (terminal UIs, canvases) read the
/// frames back after each animation frame.
#[derive(Debug, Default, Clone)]
pub struct GridStyler {
    metrics: GridMetrics,
    frames: HashMap<StyleTarget, StyledFrame>,
    placeholder_visible: bool,
    writes: u64,
}

impl GridStyler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn metrics(&self) -> GridMetrics {
        self.metrics
    }

    pub fn frame(&self, target: &StyleTarget) -> Option<&StyledFrame> {
        self.frames.get(target)
    }

    pub fn item_frame(&self, id: &str) -> Option<&StyledFrame> {
        self.frames.get(&StyleTarget::item(id))
    }

    /// Placeholder frame while it is visible.
    pub fn placeholder(&self) -> Option<&StyledFrame> {
        if self.placeholder_visible {
            self.frames.get(&StyleTarget::Placeholder)
        } else {
            None
        }
    }

    pub fn is_placeholder_visible(&self) -> bool {
        self.placeholder_visible
    }

    /// Number of `set_position` calls so far.
    pub fn writes(&self) -> u64 {
        self.writes
    }
}

impl Styler for GridStyler {
    fn set_position(&mut self, target: &StyleTarget, position: GridPosition, first_layout: bool) {
        self.writes = self.writes.saturating_add(1);
        self.frames.insert(
            target.clone(),
            StyledFrame {
                position,
                frame: self.metrics.frame(position),
                animated: !first_layout,
            },
        );
    }

    fn set_placeholder_visible(&mut self, visible: bool) {
        self.placeholder_visible = visible;
    }

    fn set_metrics(&mut self, metrics: GridMetrics) {
        self.metrics = metrics;
        for styled in self.frames.values_mut() {
            styled.frame = metrics.frame(styled.position);
        }
    }

    fn remove(&mut self, target: &StyleTarget) {
        self.frames.remove(target);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(column_start: u16, row_start: u16, column_end: u16, row_end: u16) -> GridPosition {
        GridPosition {
            column_start,
            column_end,
            row_start,
            row_end,
        }
    }

    #[test]
    fn column_width_accounts_for_gutters() {
        let metrics = GridMetrics::for_container(1240.0, 12, 8.0, 8.0);
        assert_eq!(metrics.column_width, (1240.0 - 88.0) / 12.0);
        let empty_container = GridMetrics::for_container(0.0, 12, 8.0, 8.0);
        assert_eq!(empty_container.column_width, 1.0);
    }

    #[test]
    fn frames_include_inner_gutters_only() {
        let metrics = GridMetrics {
            column_width: 100.0,
            row_height: 10.0,
            gutter: 8.0,
        };
        let frame = metrics.frame(position(1, 2, 3, 5));
        assert_eq!(frame.left, 108.0);
        assert_eq!(frame.top, 36.0);
        assert_eq!(frame.width, 208.0);
        assert_eq!(frame.height, 46.0);
    }

    #[test]
    fn styler_tracks_placeholder_and_recomputes_frames() {
        let mut styler = GridStyler::new();
        styler.set_position(&StyleTarget::Placeholder, position(0, 0, 2, 1), true);
        assert!(styler.placeholder().is_none());
        styler.set_placeholder_visible(true);
        assert!(!styler.placeholder().unwrap().animated);

        styler.set_metrics(GridMetrics {
            column_width: 50.0,
            row_height: 5.0,
            gutter: 0.0,
        });
        assert_eq!(styler.placeholder().unwrap().frame.width, 100.0);
    }
}
