//! Grid placement: breakpoints, occupancy, and the packing coordinator.
//!
//! Downstream code imports the coordinator from here while the placement
//! algorithm itself lives in the private `core` module.

mod core;
pub mod grid;
pub mod screen;

pub use core::GridCoordinator;
pub use grid::GridOccupancy;
pub use screen::{
    ScreenColumns, ScreenSize, ScreenValues, init_screen_columns, update_screen_columns,
};
