//! Styling boundary: turns grid positions into visible frames.

mod core;

pub use core::{GridMetrics, GridStyler, StyleTarget, StyledFrame, Styler};
