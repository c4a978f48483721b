use serde::{Deserialize, Serialize};

/// Grid-space corners of a rectangle. `end` coordinates are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GridPosition {
    pub column_start: u16,
    pub column_end: u16,
    pub row_start: u16,
    pub row_end: u16,
}

/// Rectangle in column/row space occupied by a dashboard item.
///
/// The all-zero rectangle is the "not placed yet" sentinel; every other rect
/// keeps `column_end > column_start` and `row_end > row_start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rect {
    column_start: u16,
    column_end: u16,
    row_start: u16,
    row_end: u16,
}

impl Rect {
    pub const EMPTY: Rect = Rect {
        column_start: 0,
        column_end: 0,
        row_start: 0,
        row_end: 0,
    };

    pub const fn from_position(position: GridPosition) -> Self {
        Self {
            column_start: position.column_start,
            column_end: position.column_end,
            row_start: position.row_start,
            row_end: position.row_end,
        }
    }

    /// Rect anchored at `(x, y)` spanning `width` columns and `height` rows.
    pub const fn sized(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            column_start: x,
            column_end: x.saturating_add(width),
            row_start: y,
            row_end: y.saturating_add(height),
        }
    }

    pub const fn empty() -> Self {
        Self::EMPTY
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::EMPTY
    }

    pub fn position(&self) -> GridPosition {
        GridPosition {
            column_start: self.column_start,
            column_end: self.column_end,
            row_start: self.row_start,
            row_end: self.row_end,
        }
    }

    pub fn x(&self) -> u16 {
        self.column_start
    }

    pub fn y(&self) -> u16 {
        self.row_start
    }

    pub fn width(&self) -> u16 {
        self.column_end.saturating_sub(self.column_start)
    }

    pub fn height(&self) -> u16 {
        self.row_end.saturating_sub(self.row_start)
    }

    pub fn right(&self) -> u16 {
        self.column_end
    }

    pub fn bottom(&self) -> u16 {
        self.row_end
    }

    /// Move horizontally, keeping the width.
    pub fn set_x(&mut self, x: u16) {
        let width = self.width();
        self.column_start = x;
        self.column_end = x.saturating_add(width);
    }

    /// Move vertically, keeping the height.
    pub fn set_y(&mut self, y: u16) {
        let height = self.height();
        self.row_start = y;
        self.row_end = y.saturating_add(height);
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        self.column_start < other.column_end
            && other.column_start < self.column_end
            && self.row_start < other.row_end
            && other.row_start < self.row_end
    }
}

impl From<GridPosition> for Rect {
    fn from(position: GridPosition) -> Self {
        Self::from_position(position)
    }
}

/// Point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Pixel-space rectangle (client coordinates).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelRect {
    pub top: f64,
    pub left: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    pub const fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            top,
            left,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.left + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.top + self.height
    }

    /// Translate in place, as a scrolled client rect does.
    pub fn shift(&mut self, top: f64, left: f64) {
        self.top += top;
        self.left += left;
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }
}

/// Scroll offsets of a scrollable node.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ScrollPosition {
    pub top: f64,
    pub left: f64,
}

impl ScrollPosition {
    pub const fn new(top: f64, left: f64) -> Self {
        Self { top, left }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sentinel() {
        assert!(Rect::empty().is_empty());
        assert!(!Rect::sized(0, 0, 1, 1).is_empty());
        assert_eq!(Rect::empty().width(), 0);
    }

    #[test]
    fn inverted_positions_measure_as_zero() {
        let rect = Rect::from(GridPosition {
            column_start: 6,
            column_end: 2,
            row_start: 4,
            row_end: 1,
        });
        assert_eq!((rect.width(), rect.height()), (0, 0));
    }

    #[test]
    fn setters_translate_without_resizing() {
        let mut rect = Rect::sized(2, 3, 4, 2);
        rect.set_x(5);
        rect.set_y(0);
        assert_eq!(
            rect.position(),
            GridPosition {
                column_start: 5,
                column_end: 9,
                row_start: 0,
                row_end: 2,
            }
        );
        assert_eq!((rect.width(), rect.height()), (4, 2));
    }

    #[test]
    fn half_open_edges_do_not_intersect() {
        let left = Rect::sized(0, 0, 4, 2);
        let right = Rect::sized(4, 0, 4, 2);
        let below = Rect::sized(0, 2, 4, 2);
        let overlapping = Rect::sized(3, 1, 2, 2);
        assert!(!left.intersects(&right));
        assert!(!left.intersects(&below));
        assert!(left.intersects(&overlapping));
        assert!(!left.intersects(&Rect::empty()));
    }

    #[test]
    fn pixel_rect_shift_and_contains() {
        let mut rect = PixelRect::new(10.0, 20.0, 100.0, 50.0);
        assert!(rect.contains(Point::new(10.0, 20.0)));
        assert!(!rect.contains(Point::new(110.0, 20.0)));
        rect.shift(-5.0, 0.0);
        assert_eq!(rect.top, 15.0);
        assert_eq!(rect.bottom(), 65.0);
    }
}
