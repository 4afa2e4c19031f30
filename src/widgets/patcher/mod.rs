//! Node-graph patcher: canvas, node views, pins and connectors.

use eframe::egui::Color32;

pub mod canvas;
pub mod connector;
pub mod node;
pub mod patcher_events;
pub mod pin;

pub use canvas::{PatcherCanvas, DRAG_THRESHOLD};
pub use connector::ConnectorView;
pub use node::NodeView;
pub use patcher_events::{NodeRemovedEvent, ShowNodeInterfaceEvent, ShowNodeSourceEvent};
pub use pin::{Pin, PIN_SIZE};

/// Audio pins and connectors.
pub const AUDIO_COLOUR: Color32 = Color32::from_rgb(0, 128, 0);
/// MIDI pins and connectors.
pub const MIDI_COLOUR: Color32 = Color32::from_rgb(255, 0, 0);
