use crate::Rect;
use crate::layout::grid::GridOccupancy;

/// Places rectangles on a grid of `cols` columns without overlap.
///
/// One layout computation is `reset()` followed by any sequence of `pack`,
/// `column_pack` and `placed` calls, closed with `complete_pass()`. Scans are
/// row-major (top to bottom, then left to right) and always bounded by the
/// depth of the current occupancy plus the requested height.
#[derive(Debug, Clone)]
pub struct GridCoordinator {
    cols: u16,
    occupancy: GridOccupancy,
    initialized: bool,
}

impl GridCoordinator {
    pub fn new(cols: u16) -> Self {
        Self {
            cols: cols.max(1),
            occupancy: GridOccupancy::new(),
            initialized: false,
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    /// False until one full pass has been completed on this coordinator.
    pub fn initialized(&self) -> bool {
        self.initialized
    }

    /// Start a new pass. Nothing from the previous pass survives.
    pub fn reset(&mut self) {
        self.occupancy.clear();
    }

    /// Mark the current pass as finished.
    pub fn complete_pass(&mut self) {
        self.initialized = true;
    }

    /// Reserve `rect` as-is.
    pub fn placed(&mut self, rect: Rect) {
        self.occupancy.occupy(&rect);
    }

    /// First-fit placement of `rect`'s footprint, ignoring its position.
    pub fn pack(&mut self, rect: Rect) -> Rect {
        let (width, height) = self.footprint(&rect);
        let placed = self.first_fit(width, height);
        self.occupancy.occupy(&placed);
        placed
    }

    /// Keep `rect`'s column and drop it to the lowest free row there.
    ///
    /// Falls back to [`pack`](Self::pack) when the footprint cannot sit at
    /// that column at all.
    pub fn column_pack(&mut self, rect: Rect) -> Rect {
        let (width, height) = self.footprint(&rect);
        let column = rect.x();
        if u32::from(column) + u32::from(width) > u32::from(self.cols) {
            return self.pack(rect);
        }

        let bound = self.scan_bound(height);
        let found = (0..=bound)
            .map(|row| Rect::sized(column, row, width, height))
            .find(|candidate| self.occupancy.fits(candidate));

        match found {
            Some(placed) => {
                self.occupancy.occupy(&placed);
                placed
            }
            None => self.pack(rect),
        }
    }

    /// Lowest free row index below every footprint of this pass.
    pub fn depth(&self) -> u16 {
        self.occupancy.depth()
    }

    fn footprint(&self, rect: &Rect) -> (u16, u16) {
        let width = rect.width().clamp(1, self.cols);
        let height = rect.height().max(1);
        (width, height)
    }

    fn first_fit(&self, width: u16, height: u16) -> Rect {
        let bound = self.scan_bound(height);
        let last_column = self.cols - width;
        for row in 0..=bound {
            for column in 0..=last_column {
                let candidate = Rect::sized(column, row, width, height);
                if self.occupancy.fits(&candidate) {
                    return candidate;
                }
            }
        }
        // Unreachable for `width <= cols`: the row at `depth()` is always free.
        Rect::sized(0, self.occupancy.depth(), width, height)
    }

    fn scan_bound(&self, height: u16) -> u16 {
        self.occupancy
            .depth()
            .saturating_add(self.occupancy.max_height().max(height))
            .saturating_add(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::GridPosition;

    fn pos(column_start: u16, row_start: u16, column_end: u16, row_end: u16) -> GridPosition {
        GridPosition {
            column_start,
            column_end,
            row_start,
            row_end,
        }
    }

    fn size(width: u16, height: u16) -> Rect {
        Rect::sized(0, 0, width, height)
    }

    #[test]
    fn three_quarters_share_a_row() {
        let mut grid = GridCoordinator::new(12);
        grid.reset();
        let placed: Vec<_> = (0..3).map(|_| grid.pack(size(4, 2)).position()).collect();
        assert_eq!(
            placed,
            vec![pos(0, 0, 4, 2), pos(4, 0, 8, 2), pos(8, 0, 12, 2)]
        );
    }

    #[test]
    fn wide_items_stack() {
        let mut grid = GridCoordinator::new(12);
        grid.reset();
        assert_eq!(grid.pack(size(8, 2)).position(), pos(0, 0, 8, 2));
        assert_eq!(grid.pack(size(8, 2)).position(), pos(0, 2, 8, 4));
    }

    #[test]
    fn pack_fills_gaps_first() {
        let mut grid = GridCoordinator::new(6);
        grid.reset();
        grid.pack(size(2, 4));
        grid.pack(size(4, 1));
        // first free 2x2 slot is right of the tall item, under the wide one
        let small = grid.pack(size(2, 2));
        assert_eq!(small.position(), pos(2, 1, 4, 3));
    }

    #[test]
    fn pack_ignores_requested_position() {
        let mut grid = GridCoordinator::new(12);
        grid.reset();
        let placed = grid.pack(Rect::sized(7, 9, 3, 1));
        assert_eq!(placed.position(), pos(0, 0, 3, 1));
    }

    #[test]
    fn column_pack_keeps_column_and_compacts_up() {
        let mut grid = GridCoordinator::new(12);
        grid.reset();
        grid.placed(Rect::sized(0, 0, 6, 3));
        let moved = grid.column_pack(Rect::sized(4, 10, 4, 2));
        assert_eq!(moved.position(), pos(4, 3, 8, 5));
        let free_column = grid.column_pack(Rect::sized(8, 7, 4, 2));
        assert_eq!(free_column.position(), pos(8, 0, 12, 2));
    }

    #[test]
    fn column_pack_falls_back_when_column_overflows() {
        let mut grid = GridCoordinator::new(6);
        grid.reset();
        let placed = grid.column_pack(Rect::sized(5, 0, 4, 1));
        assert_eq!(placed.position(), pos(0, 0, 4, 1));
    }

    #[test]
    fn oversized_requests_are_clamped_and_terminate() {
        let mut grid = GridCoordinator::new(4);
        grid.reset();
        grid.pack(size(2, 1));
        let wide = grid.pack(size(40, 3));
        assert_eq!(wide.position(), pos(0, 1, 4, 4));
        assert!(wide.right() <= grid.cols());
    }

    #[test]
    fn reset_forgets_previous_pass() {
        let mut grid = GridCoordinator::new(12);
        grid.reset();
        grid.pack(size(12, 5));
        grid.complete_pass();
        grid.reset();
        assert_eq!(grid.depth(), 0);
        assert!(grid.initialized());
        assert_eq!(grid.pack(size(12, 1)).position(), pos(0, 0, 12, 1));
    }

    #[test]
    fn pack_is_deterministic_and_never_overlaps() {
        let sizes = [(3, 2), (5, 1), (2, 4), (7, 3), (1, 1), (4, 2), (6, 6), (2, 2)];
        let run = || {
            let mut grid = GridCoordinator::new(9);
            grid.reset();
            sizes
                .iter()
                .map(|&(w, h)| grid.pack(size(w, h)))
                .collect::<Vec<_>>()
        };
        let first = run();
        assert_eq!(first, run());
        for (i, a) in first.iter().enumerate() {
            assert!(a.right() <= 9);
            for b in first.iter().skip(i + 1) {
                assert!(!a.intersects(b), "{a:?} overlaps {b:?}");
            }
        }
    }
}
