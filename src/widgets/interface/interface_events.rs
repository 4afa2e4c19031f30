//! Events emitted around interface descriptions.

use crate::entities::NodeId;

/// A widget description property changed; interface views should re-sync.
#[derive(Clone, Debug)]
pub struct WidgetPropertyChangedEvent {
    pub node: NodeId,
    pub widget: String,
    pub key: String,
}
