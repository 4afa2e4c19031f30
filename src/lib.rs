//! PATCHLAB - Audio patch editor library
//!
//! Re-exports all modules for use by binary targets.

// Core engine (event plumbing)
pub mod core;

// App modules
pub mod cli;
pub mod config;
pub mod entities;
pub mod widgets;

// Re-export commonly used types from core
pub use core::event_bus::{downcast_event, BoxedEvent, EventBus, EventEmitter};

// Re-export entities
pub use entities::{
    AttrValue, Attrs, Channel, ChannelLayout, Connection, Endpoint, GraphError, InterfaceDesc,
    NodeId, PatchGraph, PatchNode, PinDir, WidgetDesc,
};

// Re-export the widget layer's public surface
pub use widgets::interface::{InterfaceView, ParamSink, WidgetRegistry, WidgetView};
pub use widgets::layout_editor::{LayoutEditor, LayoutEvent};
pub use widgets::patcher::PatcherCanvas;
