//! Occupancy bookkeeping for one layout pass.
//!
//! Every row keeps a sorted list of disjoint, half-open column ranges that are
//! already taken. Rows are materialised lazily, so the map only grows as deep
//! as the lowest placed footprint.
//!
//! # Example
//! ```
//! use gridboard::layout::grid::GridOccupancy;
//! use gridboard::Rect;
//!
//! let mut occupancy = GridOccupancy::new();
//! occupancy.occupy(&Rect::sized(0, 0, 4, 2));
//! assert!(!occupancy.fits(&Rect::sized(2, 1, 2, 1)));
//! assert!(occupancy.fits(&Rect::sized(4, 0, 2, 2)));
//! assert_eq!(occupancy.depth(), 2);
//! ```

use std::ops::Range;

use crate::Rect;

/// Taken column ranges of a single row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct RowSpans {
    spans: Vec<Range<u16>>,
}

impl RowSpans {
    fn is_free(&self, columns: &Range<u16>) -> bool {
        self.spans
            .iter()
            .all(|span| span.end <= columns.start || columns.end <= span.start)
    }

    fn insert(&mut self, columns: Range<u16>) {
        let mut merged = columns;
        let mut kept = Vec::with_capacity(self.spans.len() + 1);
        for span in self.spans.drain(..) {
            if span.end < merged.start || merged.end < span.start {
                kept.push(span);
            } else {
                merged = merged.start.min(span.start)..merged.end.max(span.end);
            }
        }
        kept.push(merged);
        kept.sort_by_key(|span| span.start);
        self.spans = kept;
    }

    fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }
}

/// Sparse per-row occupancy map.
#[derive(Debug, Clone, Default)]
pub struct GridOccupancy {
    rows: Vec<RowSpans>,
    max_height: u16,
}

impl GridOccupancy {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget every footprint.
    pub fn clear(&mut self) {
        self.rows.clear();
        self.max_height = 0;
    }

    /// True when no row of `rect` intersects a recorded footprint.
    pub fn fits(&self, rect: &Rect) -> bool {
        if rect.is_empty() {
            return true;
        }
        let columns = rect.x()..rect.right();
        (rect.y()..rect.bottom()).all(|row| {
            self.rows
                .get(row as usize)
                .map(|spans| spans.is_free(&columns))
                .unwrap_or(true)
        })
    }

    /// Record `rect` as taken.
    pub fn occupy(&mut self, rect: &Rect) {
        if rect.is_empty() {
            return;
        }
        let bottom = rect.bottom() as usize;
        if self.rows.len() < bottom {
            self.rows.resize_with(bottom, RowSpans::default);
        }
        for row in rect.y()..rect.bottom() {
            self.rows[row as usize].insert(rect.x()..rect.right());
        }
        self.max_height = self.max_height.max(rect.height());
    }

    /// Index one past the lowest occupied row.
    pub fn depth(&self) -> u16 {
        self.rows
            .iter()
            .rposition(|row| !row.is_empty())
            .map(|idx| idx as u16 + 1)
            .unwrap_or(0)
    }

    /// Tallest footprint recorded in this pass.
    pub fn max_height(&self) -> u16 {
        self.max_height
    }

    pub fn is_empty(&self) -> bool {
        self.depth() == 0
    }
}
