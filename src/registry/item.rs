use serde::{Deserialize, Serialize};

use crate::Rect;
use crate::layout::{ScreenColumns, ScreenSize, init_screen_columns, update_screen_columns};

pub type ItemId = String;

/// Host description of a dashboard entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemSpec {
    pub id: ItemId,
    pub cols: u16,
    pub rows: u16,
    #[serde(default)]
    pub order: Option<i32>,
    #[serde(default)]
    pub screen_columns: Option<ScreenColumns>,
}

impl ItemSpec {
    pub fn new(id: impl Into<ItemId>, cols: u16, rows: u16) -> Self {
        Self {
            id: id.into(),
            cols,
            rows,
            order: None,
            screen_columns: None,
        }
    }

    pub fn with_order(mut self, order: i32) -> Self {
        self.order = Some(order);
        self
    }

    pub fn with_screen_columns(mut self, columns: ScreenColumns) -> Self {
        self.screen_columns = Some(columns);
        self
    }
}

/// Partial update of an item's nominal attributes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ItemPatch {
    pub cols: Option<u16>,
    pub rows: Option<u16>,
    pub order: Option<i32>,
    pub screen_columns: Option<ScreenColumns>,
}

/// One dashboard entry as tracked by the layout engine.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub(crate) id: ItemId,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) order: Option<i32>,
    pub(crate) rect: Rect,
    pub(crate) screen_columns: ScreenColumns,
    pub(crate) stamp: bool,
}

impl Item {
    pub fn from_spec(spec: ItemSpec, table: &ScreenColumns) -> Self {
        let screen_columns = spec
            .screen_columns
            .unwrap_or_else(|| init_screen_columns(spec.cols, table));
        Self {
            id: spec.id,
            cols: spec.cols,
            rows: spec.rows.max(1),
            order: spec.order,
            rect: Rect::empty(),
            screen_columns,
            stamp: false,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn order(&self) -> Option<i32> {
        self.order
    }

    pub fn rect(&self) -> Rect {
        self.rect
    }

    pub fn screen_columns(&self) -> &ScreenColumns {
        &self.screen_columns
    }

    /// Being dragged or resized; excluded from automatic re-packing.
    pub fn is_stamped(&self) -> bool {
        self.stamp
    }

    /// Column span at `screen`.
    pub fn cols_for(&self, screen: ScreenSize) -> u16 {
        self.screen_columns[screen].max(1)
    }

    /// Apply a host patch. Returns true when the item must be re-packed from
    /// scratch (span or order changed) rather than kept in place.
    pub(crate) fn apply_patch(&mut self, patch: ItemPatch, table: &ScreenColumns) -> bool {
        let mut repack = false;
        if let Some(cols) = patch.cols {
            if cols != self.cols {
                self.cols = cols;
                self.screen_columns = init_screen_columns(cols, table);
                repack = true;
            }
        }
        if let Some(columns) = patch.screen_columns {
            if columns != self.screen_columns {
                self.screen_columns = columns;
                repack = true;
            }
        }
        if let Some(order) = patch.order {
            if Some(order) != self.order {
                self.order = Some(order);
                repack = true;
            }
        }
        if let Some(rows) = patch.rows {
            self.rows = rows.max(1);
        }
        if repack {
            self.rect = Rect::empty();
        }
        repack
    }

    pub(crate) fn update_screen_columns(
        &mut self,
        offset: i32,
        screen: ScreenSize,
        table: &ScreenColumns,
    ) {
        if offset == 0 {
            return;
        }
        self.screen_columns = update_screen_columns(offset, screen, &self.screen_columns, table);
        self.cols = self.screen_columns[ScreenSize::Large];
    }

    pub fn to_layout_item(&self) -> LayoutItem {
        LayoutItem {
            id: self.id.clone(),
            cols: self.cols,
            rows: self.rows,
            screen_columns: self.screen_columns,
            order: self.order.unwrap_or_default(),
        }
    }
}

/// Persisted view of an item, emitted with every layout change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutItem {
    pub id: ItemId,
    pub cols: u16,
    pub rows: u16,
    pub screen_columns: ScreenColumns,
    pub order: i32,
}
