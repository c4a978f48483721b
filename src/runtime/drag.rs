//! Pixel-to-grid conversion and snap targets for drag and resize.

use std::collections::HashSet;

use crate::geometry::{GridPosition, Rect};
use crate::render::GridMetrics;

/// Pixel change of the manipulated item relative to where the gesture began.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PositionOffset {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

/// Cells spanned by `size` pixels, rounded to the nearest half cell.
pub fn span(size: f64, base: f64, gutter: f64) -> i32 {
    ((size + gutter + base / 2.0) / (base + gutter)).floor() as i32
}

/// Cells spanned by `size` pixels, rounded down to the lower grid line.
pub fn span_floor(size: f64, base: f64, gutter: f64) -> i32 {
    ((size + gutter) / (base + gutter)).floor() as i32
}

/// Grid position before clamping; a drag may aim left of or above the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub column_start: i32,
    pub row_start: i32,
    pub column_end: i32,
    pub row_end: i32,
}

impl Candidate {
    /// Resized footprint anchored at `anchor`'s top-left corner, at least one
    /// cell on each axis and never past `cols`.
    pub fn resized(&self, anchor: GridPosition, cols: u16) -> GridPosition {
        let cols = i32::from(cols.max(1));
        let column_start = i32::from(anchor.column_start).min(cols - 1);
        let row_start = i32::from(anchor.row_start);
        let column_end = self.column_end.clamp(column_start + 1, cols);
        let row_end = self.row_end.max(row_start + 1).min(i32::from(u16::MAX));
        GridPosition {
            column_start: column_start as u16,
            column_end: column_end as u16,
            row_start: row_start as u16,
            row_end: row_end as u16,
        }
    }
}

/// Apply a pixel offset to `old`. Start coordinates floor toward the lower
/// grid line; spans round at half a cell. `column_end` never exceeds `cols`.
pub fn calculate_new_position(
    old: GridPosition,
    offset: &PositionOffset,
    metrics: &GridMetrics,
    cols: u16,
) -> Candidate {
    let gutter = metrics.gutter;
    Candidate {
        column_start: i32::from(old.column_start)
            + span_floor(offset.left, metrics.column_width, gutter),
        row_start: i32::from(old.row_start) + span_floor(offset.top, metrics.row_height, gutter),
        column_end: (i32::from(old.column_end)
            + span(offset.width, metrics.column_width, gutter))
        .min(i32::from(cols)),
        row_end: i32::from(old.row_end) + span(offset.height, metrics.row_height, gutter),
    }
}

/// Deduplicated grid points a dragged item may snap its top-left corner to.
#[derive(Debug, Clone, Default)]
pub struct ShiftTargets {
    points: Vec<(u16, u16)>,
    seen: HashSet<(u16, u16)>,
    bound: u16,
}

impl ShiftTargets {
    /// Targets for an item of `item`'s width on a `cols`-wide grid: every
    /// column of the top row, plus the top-left and every bottom-edge cell of
    /// each placed rect. Columns that would push the item past the right edge
    /// are skipped.
    pub fn collect<'a>(cols: u16, item: Rect, placed: impl IntoIterator<Item = &'a Rect>) -> Self {
        let mut targets = Self {
            points: Vec::new(),
            seen: HashSet::new(),
            bound: cols.saturating_sub(item.width()),
        };
        for column in 0..cols {
            targets.add(column, 0);
        }
        for rect in placed {
            if rect.is_empty() {
                continue;
            }
            targets.add(rect.x(), rect.y());
            for column in rect.x()..rect.right() {
                targets.add(column, rect.bottom());
            }
        }
        targets
    }

    fn add(&mut self, column: u16, row: u16) {
        if column > self.bound {
            return;
        }
        if self.seen.insert((column, row)) {
            self.points.push((column, row));
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn contains(&self, column: u16, row: u16) -> bool {
        self.seen.contains(&(column, row))
    }

    /// Closest target to `(column, row)` by Euclidean distance. Equal
    /// distances resolve to the lowest row, then the lowest column.
    pub fn nearest(&self, column: i32, row: i32) -> Option<(u16, u16)> {
        self.points.iter().copied().min_by_key(|&(x, y)| {
            let dx = i64::from(x) - i64::from(column);
            let dy = i64::from(y) - i64::from(row);
            (dx * dx + dy * dy, y, x)
        })
    }
}
