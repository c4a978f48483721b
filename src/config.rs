//! Host-supplied grid configuration.
//!
//! Hosts usually keep this next to their page settings as JSON:
//!
//! ```
//! use gridboard::GridConfig;
//!
//! let config = GridConfig::from_json(r#"{ "gutter": 4, "columns": { "XSmall": 1, "Small": 4, "Medium": 8, "Large": 16 } }"#)?;
//! assert_eq!(config.columns.large, 16);
//! assert_eq!(config.row_heights.large, 8.0);
//! # Ok::<(), gridboard::LayoutError>(())
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LayoutError, Result};
use crate::gesture::GestureConfig;
use crate::layout::{ScreenColumns, ScreenSize, ScreenValues};

/// Pixels the auto-scroll loop moves per animation frame.
pub const AUTO_SCROLL_STEP: f64 = 2.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GridConfig {
    /// Gap between cells, in pixels, on both axes.
    pub gutter: f64,
    /// Column count of the grid at each breakpoint.
    pub columns: ScreenColumns,
    /// Row height in pixels at each breakpoint.
    pub row_heights: ScreenValues<f64>,
    /// Minimum viewport width at which each breakpoint applies.
    pub breakpoints: ScreenValues<f64>,
    pub padding_top: f64,
    pub padding_bottom: f64,
    pub disable_first_render_animation: bool,
    pub auto_scroll_step: f64,
    pub gesture: GestureConfig,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            gutter: 8.0,
            columns: ScreenColumns::new(1, 6, 9, 12),
            row_heights: ScreenValues::new(3.0, 4.0, 6.0, 8.0),
            breakpoints: ScreenValues::new(0.0, 600.0, 960.0, 1280.0),
            padding_top: 0.0,
            padding_bottom: 0.0,
            disable_first_render_animation: true,
            auto_scroll_step: AUTO_SCROLL_STEP,
            gesture: GestureConfig::default(),
        }
    }
}

impl GridConfig {
    pub fn from_json(source: &str) -> Result<Self> {
        let config: GridConfig = serde_json::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.gutter >= 0.0) {
            return Err(LayoutError::InvalidConfig(format!(
                "gutter must be non-negative, got {}",
                self.gutter
            )));
        }
        for (size, cols) in self.columns.iter() {
            if *cols == 0 {
                return Err(LayoutError::InvalidConfig(format!(
                    "{} needs at least one column",
                    size.as_str()
                )));
            }
        }
        for (size, height) in self.row_heights.iter() {
            if !(*height > 0.0) {
                return Err(LayoutError::InvalidConfig(format!(
                    "{} row height must be positive",
                    size.as_str()
                )));
            }
        }
        let widths: Vec<f64> = self.breakpoints.iter().map(|(_, width)| *width).collect();
        if widths.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(LayoutError::InvalidConfig(
                "breakpoint widths must be strictly ascending".to_string(),
            ));
        }
        if !(self.auto_scroll_step > 0.0) {
            return Err(LayoutError::InvalidConfig(
                "autoScrollStep must be positive".to_string(),
            ));
        }
        Ok(())
    }

    /// Breakpoint that applies to a viewport `width` pixels wide.
    pub fn screen_for_width(&self, width: f64) -> ScreenSize {
        ScreenSize::ALL
            .into_iter()
            .rev()
            .find(|size| width >= self.breakpoints[*size])
            .unwrap_or(ScreenSize::XSmall)
    }

    pub fn columns_for(&self, screen: ScreenSize) -> u16 {
        self.columns[screen]
    }

    pub fn row_height_for(&self, screen: ScreenSize) -> f64 {
        self.row_heights[screen]
    }
}
