//! Breakpoints and per-breakpoint values.
//!
//! A dashboard reflows into a different column count for each named viewport
//! range. Items remember their column span per breakpoint so a narrow screen
//! does not lose the span the user picked on a wide one.

use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

/// Named viewport-width range, ordered from narrowest to widest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ScreenSize {
    XSmall,
    Small,
    Medium,
    Large,
}

impl ScreenSize {
    pub const ALL: [ScreenSize; 4] = [
        ScreenSize::XSmall,
        ScreenSize::Small,
        ScreenSize::Medium,
        ScreenSize::Large,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScreenSize::XSmall => "XSmall",
            ScreenSize::Small => "Small",
            ScreenSize::Medium => "Medium",
            ScreenSize::Large => "Large",
        }
    }

    fn rank(self) -> usize {
        self as usize
    }
}

/// One value per breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ScreenValues<T> {
    #[serde(rename = "XSmall")]
    pub x_small: T,
    #[serde(rename = "Small")]
    pub small: T,
    #[serde(rename = "Medium")]
    pub medium: T,
    #[serde(rename = "Large")]
    pub large: T,
}

impl<T> ScreenValues<T> {
    pub const fn new(x_small: T, small: T, medium: T, large: T) -> Self {
        Self {
            x_small,
            small,
            medium,
            large,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (ScreenSize, &T)> {
        ScreenSize::ALL.into_iter().map(move |size| (size, &self[size]))
    }
}

impl<T> Index<ScreenSize> for ScreenValues<T> {
    type Output = T;

    fn index(&self, size: ScreenSize) -> &T {
        match size {
            ScreenSize::XSmall => &self.x_small,
            ScreenSize::Small => &self.small,
            ScreenSize::Medium => &self.medium,
            ScreenSize::Large => &self.large,
        }
    }
}

impl<T> IndexMut<ScreenSize> for ScreenValues<T> {
    fn index_mut(&mut self, size: ScreenSize) -> &mut T {
        match size {
            ScreenSize::XSmall => &mut self.x_small,
            ScreenSize::Small => &mut self.small,
            ScreenSize::Medium => &mut self.medium,
            ScreenSize::Large => &mut self.large,
        }
    }
}

/// Column span of an item at every breakpoint.
pub type ScreenColumns = ScreenValues<u16>;

/// Spans for a fresh item: its nominal `cols`, capped by each breakpoint's grid.
pub fn init_screen_columns(cols: u16, table: &ScreenColumns) -> ScreenColumns {
    let mut result = ScreenColumns::default();
    for size in ScreenSize::ALL {
        result[size] = table[size].min(cols);
    }
    result
}

/// Apply a resize of `offset` columns made while `screen` was active.
///
/// Wider breakpoints grow by the same offset. Narrower ones follow the change
/// but stay within their own grid and never drop below the span the current
/// breakpoint ends up with (capped to their grid).
pub fn update_screen_columns(
    offset: i32,
    screen: ScreenSize,
    columns: &ScreenColumns,
    table: &ScreenColumns,
) -> ScreenColumns {
    let mut updated = *columns;
    updated[screen] = shift_span(updated[screen], offset);
    let current = updated[screen];

    for size in ScreenSize::ALL {
        if size.rank() < screen.rank() {
            let grown = (i32::from(updated[size]) + offset).max(1);
            let limit = i32::from(table[size]);
            let value = grown
                .min(limit)
                .max(i32::from(current).min(limit));
            updated[size] = value as u16;
        } else if size.rank() > screen.rank() {
            updated[size] = shift_span(updated[size], offset);
        }
    }

    updated
}

fn shift_span(value: u16, offset: i32) -> u16 {
    (i32::from(value) + offset).clamp(0, i32::from(u16::MAX)) as u16
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ScreenColumns {
        ScreenColumns::new(1, 6, 9, 12)
    }

    #[test]
    fn init_caps_each_breakpoint() {
        let columns = init_screen_columns(8, &table());
        assert_eq!(columns, ScreenColumns::new(1, 6, 8, 8));
    }

    #[test]
    fn growing_on_large_updates_narrower_breakpoints() {
        let columns = init_screen_columns(4, &table());
        let updated = update_screen_columns(2, ScreenSize::Large, &columns, &table());
        assert_eq!(updated.large, 6);
        assert_eq!(updated.medium, 6);
        assert_eq!(updated.small, 6);
        assert_eq!(updated.x_small, 1);
    }

    #[test]
    fn shrinking_on_small_shrinks_wider_breakpoints() {
        let columns = ScreenColumns::new(1, 6, 9, 12);
        let updated = update_screen_columns(-2, ScreenSize::Small, &columns, &table());
        assert_eq!(updated.small, 4);
        assert_eq!(updated.medium, 7);
        assert_eq!(updated.large, 10);
        assert_eq!(updated.x_small, 1);
    }

    #[test]
    fn values_serialize_with_breakpoint_names() {
        let json = serde_json::to_value(table()).unwrap();
        assert_eq!(json["XSmall"], 1);
        assert_eq!(json["Large"], 12);
    }
}
