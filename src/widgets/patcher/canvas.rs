//! Patcher canvas: hosts node views and connector views over a `PatchGraph`.
//!
//! The graph is the single source of truth. Each pass the canvas reconciles
//! its views against it (`update_components`), then routes pointer gestures:
//! pin drags grow a rubber band, presses on a connector body can tear one
//! end off and re-route it.

use eframe::egui::{Color32, FontId, Id, PointerButton, Pos2, Rect, Sense, Ui, Vec2};
use indexmap::IndexMap;
use log::debug;

use crate::core::EventEmitter;
use crate::entities::{Connection, Endpoint, NodeId, PatchGraph, PinDir};

use super::connector::{paint_connector, ConnectorView};
use super::node::{NodeView, Refresh, LABEL_FONT_SIZE};
use super::patcher_events::{NodeRemovedEvent, ShowNodeInterfaceEvent, ShowNodeSourceEvent};
use super::pin::Pin;
use super::{AUDIO_COLOUR, MIDI_COLOUR};

/// Pointer travel before a press on a connector tears an end off.
pub const DRAG_THRESHOLD: f32 = 4.0;

const CANVAS_FILL: Color32 = Color32::from_rgb(25, 25, 28);

/// Rubber band: exactly one side is anchored, the other follows the pointer.
#[derive(Debug, Clone, Copy)]
struct ConnectorDrag {
    source: Option<Endpoint>,
    dest: Option<Endpoint>,
    pos: Pos2,
}

/// Armed press on an existing connector, not yet past the drag threshold.
#[derive(Debug, Clone, Copy)]
struct ConnectorGrab {
    connection: Connection,
    press: Pos2,
}

#[derive(Debug, Default)]
pub struct PatcherCanvas {
    nodes: IndexMap<NodeId, NodeView>,
    connectors: Vec<ConnectorView>,
    rubber: Option<ConnectorDrag>,
    grab: Option<ConnectorGrab>,
}

impl PatcherCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconcile views with the graph: stale connectors first, then node
    /// views (refresh or drop), then whatever is missing.
    pub fn update_components(
        &mut self,
        graph: &PatchGraph,
        canvas: Rect,
        measure: &dyn Fn(&str) -> f32,
    ) {
        self.connectors
            .retain(|c| graph.is_connected(&c.connection));

        self.nodes.retain(|_, view| {
            let width = graph.node(view.id).map(|n| measure(&n.name));
            match width {
                Some(w) => view.refresh(graph, canvas, w) == Refresh::Kept,
                None => false,
            }
        });

        for &connection in graph.connections() {
            if !self.connectors.iter().any(|c| c.connection == connection) {
                self.connectors.push(ConnectorView::new(connection));
            }
        }

        for (id, node) in graph.nodes() {
            if !self.nodes.contains_key(&id) {
                let mut view = NodeView::new(id);
                view.refresh(graph, canvas, measure(&node.name));
                self.nodes.insert(id, view);
            }
        }

        self.resolve_connectors();
    }

    /// Re-derive connector endpoints from current pin rectangles.
    fn resolve_connectors(&mut self) {
        let nodes = &self.nodes;
        for view in &mut self.connectors {
            let source = nodes
                .get(&view.connection.source.node)
                .and_then(|n| n.pin_pos(view.connection.source.channel, PinDir::Output));
            let dest = nodes
                .get(&view.connection.dest.node)
                .and_then(|n| n.pin_pos(view.connection.dest.channel, PinDir::Input));
            view.resolve(source, dest);
        }
    }

    /// Start a rubber band with one anchored side.
    pub fn begin_connector_drag(
        &mut self,
        source: Option<Endpoint>,
        dest: Option<Endpoint>,
        pos: Pos2,
    ) {
        self.rubber = Some(ConnectorDrag { source, dest, pos });
    }

    /// Move the free end of the rubber band.
    pub fn drag_connector(&mut self, pos: Pos2) {
        if let Some(drag) = &mut self.rubber {
            drag.pos = pos;
        }
    }

    /// Drop the rubber band. A connection is made only when the pointer
    /// lands on a pin of the right direction and the graph accepts it;
    /// everything else cancels silently.
    pub fn end_connector_drag(
        &mut self,
        pos: Pos2,
        graph: &mut PatchGraph,
    ) -> Option<Connection> {
        let drag = self.rubber.take()?;
        let pin = self.find_pin_at(pos)?;
        let (source, dest) = match (drag.source, drag.dest) {
            (Some(source), None) if pin.dir.is_input() => (source, pin.endpoint),
            (None, Some(dest)) if !pin.dir.is_input() => (pin.endpoint, dest),
            _ => return None,
        };
        let connection = Connection::new(source, dest);
        match graph.add_connection(connection) {
            Ok(()) => Some(connection),
            Err(e) => {
                debug!("connection rejected: {e}");
                None
            }
        }
    }

    /// Arm a grab if the press lands on a connector body. Nodes sit above
    /// connectors, so a press inside any node never grabs.
    pub fn press_connector(&mut self, pos: Pos2) -> bool {
        if self.nodes.values().any(|v| v.hit_test(pos)) {
            return false;
        }
        match self.connector_at(pos) {
            Some(view) => {
                self.grab = Some(ConnectorGrab {
                    connection: view.connection,
                    press: pos,
                });
                true
            }
            None => false,
        }
    }

    /// Pointer moved while pressed on the background. Past the threshold a
    /// grabbed connector is torn off: the end nearer the pointer comes
    /// free, the other stays anchored.
    pub fn drag_pointer(&mut self, pos: Pos2, graph: &mut PatchGraph) {
        if let Some(grab) = self.grab {
            if grab.press.distance(pos) <= DRAG_THRESHOLD {
                return;
            }
            self.grab = None;
            let Some((source_pos, dest_pos)) = self
                .connectors
                .iter()
                .find(|c| c.connection == grab.connection)
                .map(|c| c.endpoints())
            else {
                return;
            };
            if graph.remove_connection(&grab.connection).is_err() {
                return;
            }
            let Connection { source, dest } = grab.connection;
            if pos.distance(source_pos) < pos.distance(dest_pos) {
                self.begin_connector_drag(None, Some(dest), pos);
            } else {
                self.begin_connector_drag(Some(source), None, pos);
            }
        } else if self.rubber.is_some() {
            self.drag_connector(pos);
        }
    }

    /// Pointer released on the background.
    pub fn release_pointer(&mut self, pos: Pos2, graph: &mut PatchGraph) -> Option<Connection> {
        self.grab = None;
        if self.rubber.is_some() {
            self.end_connector_drag(pos, graph)
        } else {
            None
        }
    }

    pub fn connector_at(&self, pos: Pos2) -> Option<&ConnectorView> {
        self.connectors.iter().find(|c| c.hit_test(pos))
    }

    /// Topmost pin under the pointer. Later-added nodes paint on top, so
    /// search in reverse insertion order.
    pub fn find_pin_at(&self, pos: Pos2) -> Option<Pin> {
        self.nodes
            .values()
            .rev()
            .find_map(|view| view.pin_at(pos).copied())
    }

    fn endpoint_pos(&self, endpoint: Endpoint, dir: PinDir) -> Option<Pos2> {
        self.nodes
            .get(&endpoint.node)?
            .pin_pos(endpoint.channel, dir)
    }

    fn rubber_ends(&self, drag: &ConnectorDrag) -> Option<(Pos2, Pos2, bool)> {
        match (drag.source, drag.dest) {
            (Some(source), None) => {
                let anchored = self.endpoint_pos(source, PinDir::Output)?;
                Some((anchored, drag.pos, source.channel.is_midi()))
            }
            (None, Some(dest)) => {
                let anchored = self.endpoint_pos(dest, PinDir::Input)?;
                Some((drag.pos, anchored, dest.channel.is_midi()))
            }
            _ => None,
        }
    }

    pub fn show(&mut self, ui: &mut Ui, graph: &mut PatchGraph, emitter: &EventEmitter) {
        let (canvas, bg) = ui.allocate_exact_size(ui.available_size(), Sense::click_and_drag());
        let painter = ui.painter_at(canvas);
        painter.rect_filled(canvas, 0.0, CANVAS_FILL);

        let measure = |name: &str| -> f32 {
            ui.fonts_mut(|f| {
                f.layout_no_wrap(
                    name.to_owned(),
                    FontId::proportional(LABEL_FONT_SIZE),
                    Color32::WHITE,
                )
                .size()
                .x
            })
        };
        self.update_components(graph, canvas, &measure);

        // Background gestures: connector grabs and rubber-band updates for
        // drags that started here.
        if bg.drag_started_by(PointerButton::Primary) {
            if let Some(pos) = bg.interact_pointer_pos() {
                self.press_connector(pos);
            }
        }
        if bg.dragged_by(PointerButton::Primary) {
            if let Some(pos) = bg.interact_pointer_pos() {
                self.drag_pointer(pos, graph);
            }
        }
        if bg.drag_stopped_by(PointerButton::Primary) {
            if let Some(pos) = bg.interact_pointer_pos() {
                self.release_pointer(pos, graph);
            }
        }

        let mut hovered_nodes: Vec<NodeId> = Vec::new();
        let ids: Vec<NodeId> = self.nodes.keys().copied().collect();
        for id in ids {
            let Some(view) = self.nodes.get(&id) else {
                continue;
            };
            let rect = view.rect;
            let body = view.body_rect();
            let pins: Vec<Pin> = view.pins.clone();

            // Body first, pins after: pins end up on top for presses.
            let body_resp = ui.interact(body, Id::new(("node", id)), Sense::click_and_drag());

            let mut removed = false;
            let mut disconnect = false;
            body_resp.context_menu(|ui| {
                if ui.button("Show plugin interface").clicked() {
                    emitter.emit(ShowNodeInterfaceEvent { node: id });
                }
                if ui.button("Show source code").clicked() {
                    emitter.emit(ShowNodeSourceEvent { node: id });
                }
                if ui.button("Delete this plugin").clicked() {
                    removed = true;
                }
                if ui.button("Disconnect all pins").clicked() {
                    disconnect = true;
                }
            });

            if removed {
                if graph.remove_node(id).is_ok() {
                    emitter.emit(NodeRemovedEvent { node: id });
                }
                self.nodes.shift_remove(&id);
                self.connectors
                    .retain(|c| graph.is_connected(&c.connection));
                continue;
            }
            if disconnect {
                let _ = graph.disconnect_node(id);
                self.connectors
                    .retain(|c| graph.is_connected(&c.connection));
            }

            if body_resp.double_clicked() {
                emitter.emit(ShowNodeInterfaceEvent { node: id });
            }

            if body_resp.dragged_by(PointerButton::Primary) {
                let delta = body_resp.drag_delta();
                if delta != Vec2::ZERO {
                    if let Some(view) = self.nodes.get_mut(&id) {
                        view.translate(delta);
                    }
                    let centre = rect.translate(delta).center() - canvas.min;
                    let _ = graph.set_node_position(
                        id,
                        [centre.x / canvas.width(), centre.y / canvas.height()],
                    );
                }
            }
            if body_resp.hovered() {
                hovered_nodes.push(id);
            }

            for pin in pins {
                let pin_id = Id::new(("pin", pin.endpoint.node, pin.endpoint.channel, pin.dir));
                let resp = ui.interact(pin.rect, pin_id, Sense::click_and_drag());
                if resp.drag_started_by(PointerButton::Primary) {
                    if let Some(pos) = resp.interact_pointer_pos() {
                        if pin.dir.is_input() {
                            self.begin_connector_drag(None, Some(pin.endpoint), pos);
                        } else {
                            self.begin_connector_drag(Some(pin.endpoint), None, pos);
                        }
                    }
                }
                if resp.dragged_by(PointerButton::Primary) {
                    if let Some(pos) = resp.interact_pointer_pos() {
                        self.drag_connector(pos);
                    }
                }
                if resp.drag_stopped_by(PointerButton::Primary) {
                    if let Some(pos) = resp.interact_pointer_pos() {
                        self.end_connector_drag(pos, graph);
                    }
                }
            }
        }

        // Paint: connectors under nodes, rubber band on top.
        self.resolve_connectors();
        let hover_pos = ui.input(|i| i.pointer.hover_pos());
        let over_node = hover_pos.is_some_and(|p| self.nodes.values().any(|v| v.hit_test(p)));
        for view in &self.connectors {
            let hovered = !over_node && hover_pos.is_some_and(|p| view.hit_test(p));
            view.paint(&painter, hovered);
        }
        for view in self.nodes.values() {
            view.paint(&painter, hovered_nodes.contains(&view.id));
        }
        if let Some(drag) = &self.rubber {
            if let Some((p1, p2, midi)) = self.rubber_ends(drag) {
                let colour = if midi { MIDI_COLOUR } else { AUDIO_COLOUR };
                paint_connector(&painter, p1, p2, colour, false);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Channel, ChannelLayout, PatchNode};

    const CANVAS: Rect = Rect {
        min: Pos2::new(0.0, 0.0),
        max: Pos2::new(1000.0, 800.0),
    };

    fn measure(_: &str) -> f32 {
        50.0
    }

    fn two_node_graph() -> (PatchGraph, NodeId, NodeId) {
        let mut graph = PatchGraph::new();
        let a = graph.add_node(
            PatchNode::new("a", ChannelLayout::stereo(), ChannelLayout::stereo())
                .with_position([0.2, 0.2]),
        );
        let b = graph.add_node(
            PatchNode::new("b", ChannelLayout::stereo(), ChannelLayout::stereo())
                .with_position([0.8, 0.8]),
        );
        (graph, a, b)
    }

    fn connect(graph: &mut PatchGraph, a: NodeId, b: NodeId) -> Connection {
        let connection = Connection::new(
            Endpoint::new(a, Channel::Audio(0)),
            Endpoint::new(b, Channel::Audio(0)),
        );
        graph.add_connection(connection).unwrap();
        connection
    }

    #[test]
    fn reconciliation_tracks_graph_changes() {
        let (mut graph, a, b) = two_node_graph();
        connect(&mut graph, a, b);

        let mut canvas = PatcherCanvas::new();
        canvas.update_components(&graph, CANVAS, &measure);
        assert_eq!(canvas.nodes.len(), 2);
        assert_eq!(canvas.connectors.len(), 1);

        graph.remove_node(a).unwrap();
        canvas.update_components(&graph, CANVAS, &measure);
        assert_eq!(canvas.nodes.len(), 1);
        assert!(canvas.connectors.is_empty(), "cascade removed the view");

        let c = graph.add_node(PatchNode::new(
            "c",
            ChannelLayout::mono(),
            ChannelLayout::mono(),
        ));
        canvas.update_components(&graph, CANVAS, &measure);
        assert!(canvas.nodes.contains_key(&c));
    }

    #[test]
    fn rubber_band_connects_output_to_input() {
        let (mut graph, a, b) = two_node_graph();
        let mut canvas = PatcherCanvas::new();
        canvas.update_components(&graph, CANVAS, &measure);

        let from = canvas.nodes[&a]
            .pin_pos(Channel::Audio(0), PinDir::Output)
            .unwrap();
        let to = canvas.nodes[&b]
            .pin_pos(Channel::Audio(1), PinDir::Input)
            .unwrap();

        canvas.begin_connector_drag(Some(Endpoint::new(a, Channel::Audio(0))), None, from);
        canvas.drag_connector(to);
        let made = canvas.end_connector_drag(to, &mut graph);

        let expected = Connection::new(
            Endpoint::new(a, Channel::Audio(0)),
            Endpoint::new(b, Channel::Audio(1)),
        );
        assert_eq!(made, Some(expected));
        assert!(graph.is_connected(&expected));
        assert!(canvas.rubber.is_none());
    }

    #[test]
    fn drop_on_wrong_direction_cancels() {
        let (mut graph, a, b) = two_node_graph();
        let mut canvas = PatcherCanvas::new();
        canvas.update_components(&graph, CANVAS, &measure);

        let from = canvas.nodes[&a]
            .pin_pos(Channel::Audio(0), PinDir::Output)
            .unwrap();
        // Released over another output pin: a source needs an input.
        let wrong = canvas.nodes[&b]
            .pin_pos(Channel::Audio(0), PinDir::Output)
            .unwrap();

        canvas.begin_connector_drag(Some(Endpoint::new(a, Channel::Audio(0))), None, from);
        assert_eq!(canvas.end_connector_drag(wrong, &mut graph), None);
        assert_eq!(graph.connection_count(), 0);
    }

    #[test]
    fn drop_on_empty_canvas_cancels() {
        let (mut graph, a, _) = two_node_graph();
        let mut canvas = PatcherCanvas::new();
        canvas.update_components(&graph, CANVAS, &measure);

        let from = canvas.nodes[&a]
            .pin_pos(Channel::Audio(0), PinDir::Output)
            .unwrap();
        canvas.begin_connector_drag(Some(Endpoint::new(a, Channel::Audio(0))), None, from);
        assert_eq!(
            canvas.end_connector_drag(Pos2::new(500.0, 50.0), &mut graph),
            None
        );
        assert_eq!(graph.connection_count(), 0);
        assert!(canvas.rubber.is_none());
    }

    #[test]
    fn graph_rejection_cancels_the_drop() {
        let (mut graph, a, b) = two_node_graph();
        let existing = connect(&mut graph, a, b);
        let mut canvas = PatcherCanvas::new();
        canvas.update_components(&graph, CANVAS, &measure);

        // Same pair again: duplicate, rejected by the graph.
        let from = canvas.nodes[&a]
            .pin_pos(Channel::Audio(0), PinDir::Output)
            .unwrap();
        let to = canvas.nodes[&b]
            .pin_pos(Channel::Audio(0), PinDir::Input)
            .unwrap();
        canvas.begin_connector_drag(Some(existing.source), None, from);
        assert_eq!(canvas.end_connector_drag(to, &mut graph), None);
        assert_eq!(graph.connection_count(), 1);
    }

    #[test]
    fn grab_holds_until_threshold_then_tears_off_nearer_end() {
        let (mut graph, a, b) = two_node_graph();
        let connection = connect(&mut graph, a, b);
        let mut canvas = PatcherCanvas::new();
        canvas.update_components(&graph, CANVAS, &measure);

        let (source_pos, dest_pos) = canvas.connectors[0].endpoints();
        let mid = ((source_pos.to_vec2() + dest_pos.to_vec2()) / 2.0).to_pos2();

        assert!(canvas.press_connector(mid));
        assert!(graph.is_connected(&connection), "armed, not yet torn");

        // Within the threshold nothing moves.
        canvas.drag_pointer(mid + Vec2::new(2.0, 0.0), &mut graph);
        assert!(graph.is_connected(&connection));
        assert!(canvas.rubber.is_none());

        // Past it, dragged toward the dest end: dest comes free.
        let near_dest = mid + (dest_pos - mid) * 0.5;
        canvas.drag_pointer(near_dest, &mut graph);
        assert!(!graph.is_connected(&connection));
        let drag = canvas.rubber.unwrap();
        assert_eq!(drag.source, Some(connection.source));
        assert_eq!(drag.dest, None);

        // Released back on the dest pin: reconnected.
        let made = canvas.release_pointer(dest_pos, &mut graph);
        assert_eq!(made, Some(connection));
        assert!(graph.is_connected(&connection));
    }

    #[test]
    fn tearing_off_near_source_frees_the_source_end() {
        let (mut graph, a, b) = two_node_graph();
        let connection = connect(&mut graph, a, b);
        let mut canvas = PatcherCanvas::new();
        canvas.update_components(&graph, CANVAS, &measure);

        let (source_pos, dest_pos) = canvas.connectors[0].endpoints();
        let mid = ((source_pos.to_vec2() + dest_pos.to_vec2()) / 2.0).to_pos2();

        assert!(canvas.press_connector(mid));
        let near_source = mid + (source_pos - mid) * 0.5;
        canvas.drag_pointer(near_source, &mut graph);

        let drag = canvas.rubber.unwrap();
        assert_eq!(drag.source, None);
        assert_eq!(drag.dest, Some(connection.dest));

        // Dropped on nothing: the connection stays gone.
        assert_eq!(canvas.release_pointer(Pos2::new(500.0, 60.0), &mut graph), None);
        assert!(!graph.is_connected(&connection));
        canvas.update_components(&graph, CANVAS, &measure);
        assert!(canvas.connectors.is_empty());
    }

    #[test]
    fn press_away_from_any_connector_does_not_arm() {
        let (mut graph, a, b) = two_node_graph();
        connect(&mut graph, a, b);
        let mut canvas = PatcherCanvas::new();
        canvas.update_components(&graph, CANVAS, &measure);

        assert!(!canvas.press_connector(Pos2::new(990.0, 10.0)));
        // A press inside a node body never grabs the connector beneath it.
        let node_centre = canvas.nodes[&a].rect.center();
        assert!(!canvas.press_connector(node_centre));
    }
}
