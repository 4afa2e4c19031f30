//! Entities module - graph model and interface descriptions, independent of GUI.
//!
//! The patcher canvas, interface builder and layout editor all render views
//! of these types; none of them owns domain state of its own.

pub mod attrs;
pub mod graph;
pub mod patch;
pub mod widget_desc;

pub use attrs::{AttrValue, Attrs};
pub use graph::{
    Channel, ChannelLayout, Connection, Endpoint, GraphError, GraphResult, NodeId, PinDir,
};
pub use patch::{PatchGraph, PatchNode};
pub use widget_desc::{InterfaceDesc, WidgetDesc, FORM_KIND};
