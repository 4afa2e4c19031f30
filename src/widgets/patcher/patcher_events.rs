//! Events emitted by the patcher canvas.

use crate::entities::NodeId;

/// Request to open (or raise) a node's interface window.
#[derive(Clone, Debug)]
pub struct ShowNodeInterfaceEvent {
    pub node: NodeId,
}

/// Request to open (or raise) a node's source code window.
#[derive(Clone, Debug)]
pub struct ShowNodeSourceEvent {
    pub node: NodeId,
}

/// A node was deleted from the canvas; open windows for it must close.
#[derive(Clone, Debug)]
pub struct NodeRemovedEvent {
    pub node: NodeId,
}
