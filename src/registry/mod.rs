//! Item membership and the shared pointer stream.

mod core;
pub mod item;

pub use core::{LayoutService, ListenerHost, NoopListenerHost};
pub use item::{Item, ItemId, ItemPatch, ItemSpec, LayoutItem};
