//! Drag-and-resize editing of interface layouts.

pub mod alias;
pub mod editor;
pub mod layout_events;

pub use alias::{DragZone, LayoutAlias, ResizeEdge, BORDER_ZONE, MIN_SIZE};
pub use editor::LayoutEditor;
pub use layout_events::LayoutEvent;
