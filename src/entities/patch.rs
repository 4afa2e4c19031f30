//! PatchGraph: the node graph the patcher edits.
//!
//! Single source of truth for topology and node placement. Views re-derive
//! everything from here each reconciliation pass; mutations flip the
//! `changed` flag so the shell knows the patch needs saving.

use std::fs;
use std::path::Path;

use anyhow::Context;
use indexmap::IndexMap;
use log::debug;
use serde::{Deserialize, Serialize};

use super::graph::{Channel, Connection, ChannelLayout, GraphError, GraphResult, NodeId};
use super::widget_desc::InterfaceDesc;

/// One processing unit: channel shape, placement, interface description.
///
/// The processor itself is opaque here; the editor only needs to know what
/// can be plugged where and what the plugin window looks like.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatchNode {
    pub name: String,
    pub inputs: ChannelLayout,
    pub outputs: ChannelLayout,
    #[serde(default)]
    pub accepts_midi: bool,
    #[serde(default)]
    pub produces_midi: bool,
    /// Normalized centre position on the canvas, 0..1 per axis.
    pub position: [f32; 2],
    #[serde(default)]
    pub interface: InterfaceDesc,
    /// Plugin source shown by the source-view window.
    #[serde(default)]
    pub source_text: String,
}

impl PatchNode {
    pub fn new(name: impl Into<String>, inputs: ChannelLayout, outputs: ChannelLayout) -> Self {
        Self {
            name: name.into(),
            inputs,
            outputs,
            accepts_midi: false,
            produces_midi: false,
            position: [0.5, 0.5],
            interface: InterfaceDesc::new(),
            source_text: String::new(),
        }
    }

    pub fn with_midi(mut self, accepts: bool, produces: bool) -> Self {
        self.accepts_midi = accepts;
        self.produces_midi = produces;
        self
    }

    pub fn with_position(mut self, position: [f32; 2]) -> Self {
        self.position = position;
        self
    }

    pub fn with_interface(mut self, interface: InterfaceDesc) -> Self {
        self.interface = interface;
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source_text = source.into();
        self
    }

    /// Does this node expose `channel` as an output?
    pub fn has_output(&self, channel: Channel) -> bool {
        match channel {
            Channel::Audio(i) => i < self.outputs.total(),
            Channel::Midi => self.produces_midi,
        }
    }

    /// Does this node expose `channel` as an input?
    pub fn has_input(&self, channel: Channel) -> bool {
        match channel {
            Channel::Audio(i) => i < self.inputs.total(),
            Channel::Midi => self.accepts_midi,
        }
    }
}

/// Node set plus connection list. Insertion order is kept so saved patches
/// stay diffable and the canvas draws nodes in a stable order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PatchGraph {
    nodes: IndexMap<NodeId, PatchNode>,
    connections: Vec<Connection>,
    #[serde(skip)]
    changed: bool,
}

impl PatchGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== Nodes ==========

    pub fn add_node(&mut self, node: PatchNode) -> NodeId {
        let id = NodeId::new();
        debug!("add_node {} '{}'", id, node.name);
        self.nodes.insert(id, node);
        self.changed = true;
        id
    }

    pub fn node(&self, id: NodeId) -> Option<&PatchNode> {
        self.nodes.get(&id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut PatchNode> {
        self.nodes.get_mut(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (NodeId, &PatchNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Remove a node and every connection touching it.
    pub fn remove_node(&mut self, id: NodeId) -> GraphResult<PatchNode> {
        let node = self
            .nodes
            .shift_remove(&id)
            .ok_or(GraphError::NodeNotFound { id })?;
        let before = self.connections.len();
        self.connections
            .retain(|c| c.source.node != id && c.dest.node != id);
        debug!(
            "remove_node {} '{}' ({} connections dropped)",
            id,
            node.name,
            before - self.connections.len()
        );
        self.changed = true;
        Ok(node)
    }

    /// Drop every connection touching the node, keeping the node itself.
    /// Returns how many were dropped.
    pub fn disconnect_node(&mut self, id: NodeId) -> GraphResult<usize> {
        if !self.nodes.contains_key(&id) {
            return Err(GraphError::NodeNotFound { id });
        }
        let before = self.connections.len();
        self.connections
            .retain(|c| c.source.node != id && c.dest.node != id);
        let dropped = before - self.connections.len();
        if dropped > 0 {
            self.changed = true;
        }
        Ok(dropped)
    }

    // ========== Positions ==========

    pub fn node_position(&self, id: NodeId) -> Option<[f32; 2]> {
        self.nodes.get(&id).map(|n| n.position)
    }

    /// Store a normalized centre position, clamped to 0..1.
    pub fn set_node_position(&mut self, id: NodeId, position: [f32; 2]) -> GraphResult<()> {
        let node = self
            .nodes
            .get_mut(&id)
            .ok_or(GraphError::NodeNotFound { id })?;
        node.position = [position[0].clamp(0.0, 1.0), position[1].clamp(0.0, 1.0)];
        self.changed = true;
        Ok(())
    }

    // ========== Connections ==========

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_connected(&self, connection: &Connection) -> bool {
        self.connections.contains(connection)
    }

    /// Validate and add a connection.
    ///
    /// Source must be an existing output, dest an existing input, kinds must
    /// match (audio to audio, MIDI to MIDI), no self-loops, no duplicates.
    pub fn add_connection(&mut self, connection: Connection) -> GraphResult<()> {
        let source_node = self
            .nodes
            .get(&connection.source.node)
            .ok_or(GraphError::NodeNotFound { id: connection.source.node })?;
        let dest_node = self
            .nodes
            .get(&connection.dest.node)
            .ok_or(GraphError::NodeNotFound { id: connection.dest.node })?;

        if connection.source.node == connection.dest.node {
            return Err(GraphError::SelfConnection { node: connection.source.node });
        }
        if !source_node.has_output(connection.source.channel) {
            return Err(GraphError::NotAnOutput { endpoint: connection.source });
        }
        if !dest_node.has_input(connection.dest.channel) {
            return Err(GraphError::NotAnInput { endpoint: connection.dest });
        }
        if connection.source.channel.is_midi() != connection.dest.channel.is_midi() {
            return Err(GraphError::KindMismatch {
                source: connection.source,
                dest: connection.dest,
            });
        }
        if self.connections.contains(&connection) {
            return Err(GraphError::DuplicateConnection { connection });
        }

        debug!("add_connection {}", connection);
        self.connections.push(connection);
        self.changed = true;
        Ok(())
    }

    pub fn remove_connection(&mut self, connection: &Connection) -> GraphResult<()> {
        let pos = self
            .connections
            .iter()
            .position(|c| c == connection)
            .ok_or(GraphError::ConnectionNotFound { connection: *connection })?;
        self.connections.remove(pos);
        self.changed = true;
        Ok(())
    }

    // ========== Changed flag ==========

    pub fn set_changed(&mut self) {
        self.changed = true;
    }

    pub fn is_changed(&self) -> bool {
        self.changed
    }

    /// Read and reset the changed flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    // ========== Persistence ==========

    /// Serialize the patch to a JSON file.
    pub fn to_json<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize patch")?;

        let path = path.as_ref();
        let path = if path.extension().and_then(|s| s.to_str()) != Some("json") {
            path.with_extension("json")
        } else {
            path.to_path_buf()
        };

        fs::write(&path, json).with_context(|| format!("write patch {}", path.display()))?;
        Ok(())
    }

    /// Load a patch from a JSON file. The loaded graph starts unchanged.
    pub fn from_json<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let json = fs::read_to_string(path.as_ref())
            .with_context(|| format!("read patch {}", path.as_ref().display()))?;
        let graph: PatchGraph = serde_json::from_str(&json).context("parse patch")?;
        Ok(graph)
    }
}
