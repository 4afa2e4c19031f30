//! Graph vocabulary: node identity, channels, endpoints, connections.
//!
//! The patcher never holds references into the graph. Everything is keyed
//! by `NodeId` so views can outlive (and rediscover) the nodes they draw.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Stable node identity, assigned at insertion and never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(Uuid);

impl NodeId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One connectable channel on a node: an indexed audio channel or the
/// node's single MIDI slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Channel {
    Audio(u16),
    Midi,
}

impl Channel {
    pub fn is_midi(&self) -> bool {
        matches!(self, Channel::Midi)
    }

    /// Audio channel index, if this is an audio channel.
    pub fn audio_index(&self) -> Option<u16> {
        match self {
            Channel::Audio(i) => Some(*i),
            Channel::Midi => None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Audio(i) => write!(f, "audio[{}]", i),
            Channel::Midi => write!(f, "midi"),
        }
    }
}

/// Which side of a node a pin sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PinDir {
    Input,
    Output,
}

impl PinDir {
    pub fn is_input(&self) -> bool {
        matches!(self, PinDir::Input)
    }
}

/// A specific channel of a specific node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub node: NodeId,
    pub channel: Channel,
}

impl Endpoint {
    pub fn new(node: NodeId, channel: Channel) -> Self {
        Self { node, channel }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.node, self.channel)
    }
}

/// Directed edge: `source` is an output endpoint, `dest` an input endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Connection {
    pub source: Endpoint,
    pub dest: Endpoint,
}

impl Connection {
    pub fn new(source: Endpoint, dest: Endpoint) -> Self {
        Self { source, dest }
    }

    /// A connection is MIDI-coloured when either end is a MIDI slot
    /// (validation guarantees both then are).
    pub fn is_midi(&self) -> bool {
        self.source.channel.is_midi() || self.dest.channel.is_midi()
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.dest)
    }
}

/// Audio channel counts per bus on one side of a node.
///
/// Pin spacing treats bus boundaries as half-slot gaps, so the layout math
/// needs both the flat channel index and its bus index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelLayout {
    buses: Vec<u16>,
}

impl ChannelLayout {
    pub fn new(buses: Vec<u16>) -> Self {
        Self { buses }
    }

    pub fn mono() -> Self {
        Self { buses: vec![1] }
    }

    pub fn stereo() -> Self {
        Self { buses: vec![2] }
    }

    pub fn bus_count(&self) -> usize {
        self.buses.len()
    }

    pub fn buses(&self) -> &[u16] {
        &self.buses
    }

    /// Total audio channel count across all buses.
    pub fn total(&self) -> u16 {
        self.buses.iter().sum()
    }

    /// Map a flat channel index to (bus index, offset within bus).
    pub fn bus_of(&self, channel: u16) -> Option<(usize, u16)> {
        let mut base = 0u16;
        for (bus, &count) in self.buses.iter().enumerate() {
            if channel < base + count {
                return Some((bus, channel - base));
            }
            base += count;
        }
        None
    }
}

/// Why a graph mutation was refused.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphError {
    NodeNotFound { id: NodeId },
    NotAnOutput { endpoint: Endpoint },
    NotAnInput { endpoint: Endpoint },
    KindMismatch { source: Endpoint, dest: Endpoint },
    SelfConnection { node: NodeId },
    DuplicateConnection { connection: Connection },
    ConnectionNotFound { connection: Connection },
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphError::NodeNotFound { id } => {
                write!(f, "Node not found: {}", id)
            }
            GraphError::NotAnOutput { endpoint } => {
                write!(f, "Endpoint {} is not an output", endpoint)
            }
            GraphError::NotAnInput { endpoint } => {
                write!(f, "Endpoint {} is not an input", endpoint)
            }
            GraphError::KindMismatch { source, dest } => {
                write!(f, "Cannot connect {} to {}: channel kinds differ", source, dest)
            }
            GraphError::SelfConnection { node } => {
                write!(f, "Cannot connect node {} to itself", node)
            }
            GraphError::DuplicateConnection { connection } => {
                write!(f, "Connection already exists: {}", connection)
            }
            GraphError::ConnectionNotFound { connection } => {
                write!(f, "Connection not found: {}", connection)
            }
        }
    }
}

impl std::error::Error for GraphError {}

pub type GraphResult<T> = Result<T, GraphError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bus_of_maps_flat_indices() {
        let layout = ChannelLayout::new(vec![2, 2, 1]);
        assert_eq!(layout.total(), 5);
        assert_eq!(layout.bus_of(0), Some((0, 0)));
        assert_eq!(layout.bus_of(1), Some((0, 1)));
        assert_eq!(layout.bus_of(2), Some((1, 0)));
        assert_eq!(layout.bus_of(4), Some((2, 0)));
        assert_eq!(layout.bus_of(5), None);
    }

    #[test]
    fn empty_layout_has_no_channels() {
        let layout = ChannelLayout::default();
        assert_eq!(layout.total(), 0);
        assert_eq!(layout.bus_of(0), None);
    }

    #[test]
    fn midi_connection_detection() {
        let a = NodeId::new();
        let b = NodeId::new();
        let audio = Connection::new(
            Endpoint::new(a, Channel::Audio(0)),
            Endpoint::new(b, Channel::Audio(1)),
        );
        let midi = Connection::new(
            Endpoint::new(a, Channel::Midi),
            Endpoint::new(b, Channel::Midi),
        );
        assert!(!audio.is_midi());
        assert!(midi.is_midi());
    }

    #[test]
    fn error_display_names_the_node() {
        let id = NodeId::new();
        let err = GraphError::NodeNotFound { id };
        assert!(err.to_string().contains(&id.to_string()));
    }
}
