//! Interface surfaces: registry-built widget trees rendered per node.

pub mod controls;
pub mod interface_events;
pub mod registry;
pub mod view;

pub use interface_events::WidgetPropertyChangedEvent;
pub use registry::{WidgetFactory, WidgetRegistry};
pub use view::{InterfaceView, ParamSink, WidgetBase, WidgetView};
