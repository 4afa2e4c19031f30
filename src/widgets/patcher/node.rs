//! Node view: one processing unit on the patcher canvas.
//!
//! Everything here is re-derived from the graph on refresh; the view keeps
//! no state the graph does not already know, apart from pin geometry.

use eframe::egui::{Align2, Color32, FontId, Painter, Pos2, Rect, Stroke, StrokeKind, Vec2};

use crate::entities::{Channel, Endpoint, NodeId, PatchGraph, PatchNode, PinDir};

use super::pin::{x_fraction, Pin, PIN_SIZE};

/// Node label font, shared by painting and width measurement.
pub const LABEL_FONT_SIZE: f32 = 13.0;

const BODY_FILL: Color32 = Color32::from_rgb(45, 45, 48);
const BODY_OUTLINE: Color32 = Color32::from_rgb(70, 70, 74);
const BODY_OUTLINE_HOVER: Color32 = Color32::from_rgb(160, 160, 165);
const LABEL_COLOUR: Color32 = Color32::from_rgb(220, 220, 220);

/// Outcome of a refresh pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Kept,
    /// The backing node vanished; the canvas drops this view.
    Removed,
}

#[derive(Debug, Clone)]
pub struct NodeView {
    pub id: NodeId,
    pub display_name: String,
    /// Pin counts per side, MIDI slots included.
    num_ins: u16,
    num_outs: u16,
    pub pins: Vec<Pin>,
    pub rect: Rect,
}

impl NodeView {
    pub fn new(id: NodeId) -> Self {
        Self {
            id,
            display_name: String::new(),
            num_ins: 0,
            num_outs: 0,
            pins: Vec::new(),
            rect: Rect::ZERO,
        }
    }

    /// Resynchronize with the graph: name, size, position, pin set.
    ///
    /// `text_width` is the measured width of the node's current name.
    /// Idempotent: a second call with the same graph state changes nothing.
    pub fn refresh(&mut self, graph: &PatchGraph, canvas: Rect, text_width: f32) -> Refresh {
        let Some(node) = graph.node(self.id) else {
            return Refresh::Removed;
        };

        let num_ins = node.inputs.total() + node.accepts_midi as u16;
        let num_outs = node.outputs.total() + node.produces_midi as u16;
        self.display_name = node.name.clone();

        let height: f32 = if text_width > 300.0 { 100.0 } else { 60.0 };
        let width = 100.0f32
            .max(20.0 * (num_ins.max(num_outs) + 1) as f32)
            .max(16.0 + text_width.min(300.0));

        let centre = canvas.min
            + Vec2::new(
                node.position[0] * canvas.width(),
                node.position[1] * canvas.height(),
            );
        let rect = Rect::from_center_size(centre, Vec2::new(width, height));

        let pins_changed = num_ins != self.num_ins || num_outs != self.num_outs;
        if pins_changed {
            self.num_ins = num_ins;
            self.num_outs = num_outs;
            self.rebuild_pins(node);
        }
        if pins_changed || rect != self.rect {
            self.rect = rect;
            self.layout_pins(node);
        }
        Refresh::Kept
    }

    /// Pin order: audio inputs, MIDI input, audio outputs, MIDI output.
    fn rebuild_pins(&mut self, node: &PatchNode) {
        self.pins.clear();
        for i in 0..node.inputs.total() {
            self.pins.push(Pin::new(
                Endpoint::new(self.id, Channel::Audio(i)),
                PinDir::Input,
            ));
        }
        if node.accepts_midi {
            self.pins
                .push(Pin::new(Endpoint::new(self.id, Channel::Midi), PinDir::Input));
        }
        for i in 0..node.outputs.total() {
            self.pins.push(Pin::new(
                Endpoint::new(self.id, Channel::Audio(i)),
                PinDir::Output,
            ));
        }
        if node.produces_midi {
            self.pins
                .push(Pin::new(Endpoint::new(self.id, Channel::Midi), PinDir::Output));
        }
    }

    /// Place pins along the top (inputs) and bottom (outputs) edges.
    /// The MIDI slot takes the last position on its side.
    fn layout_pins(&mut self, node: &PatchNode) {
        for pin in &mut self.pins {
            let (layout, total) = match pin.dir {
                PinDir::Input => (&node.inputs, self.num_ins),
                PinDir::Output => (&node.outputs, self.num_outs),
            };
            let (index, bus_index) = match pin.endpoint.channel {
                Channel::Audio(i) => (
                    i as usize,
                    layout.bus_of(i).map(|(bus, _)| bus).unwrap_or(0),
                ),
                Channel::Midi => (total.saturating_sub(1) as usize, 0),
            };
            pin.bus_index = bus_index;

            let fx = x_fraction(index, bus_index, total as usize, layout.bus_count());
            let x = self.rect.left() + self.rect.width() * fx - PIN_SIZE / 2.0;
            let y = if pin.dir.is_input() {
                self.rect.top()
            } else {
                self.rect.bottom() - PIN_SIZE
            };
            pin.rect = Rect::from_min_size(Pos2::new(x, y), Vec2::splat(PIN_SIZE));
        }
    }

    /// Interactive body between the pin strips, inset from the sides.
    pub fn body_rect(&self) -> Rect {
        Rect::from_min_max(
            Pos2::new(self.rect.left() + 3.0, self.rect.top() + PIN_SIZE),
            Pos2::new(self.rect.right() - 6.0, self.rect.bottom() - PIN_SIZE),
        )
    }

    /// Body (side-inset, clear of the pin strips) or any pin.
    pub fn hit_test(&self, pos: Pos2) -> bool {
        if self.pins.iter().any(|p| p.contains(pos)) {
            return true;
        }
        let local = pos - self.rect.min;
        local.x >= 3.0
            && local.x < self.rect.width() - 6.0
            && local.y >= PIN_SIZE
            && local.y < self.rect.height() - PIN_SIZE
    }

    pub fn pin_at(&self, pos: Pos2) -> Option<&Pin> {
        self.pins.iter().find(|p| p.contains(pos))
    }

    pub fn pin_pos(&self, channel: Channel, dir: PinDir) -> Option<Pos2> {
        self.pins
            .iter()
            .find(|p| p.endpoint.channel == channel && p.dir == dir)
            .map(|p| p.pos())
    }

    /// Move the whole view, pins included, without touching the graph.
    pub fn translate(&mut self, delta: Vec2) {
        self.rect = self.rect.translate(delta);
        for pin in &mut self.pins {
            pin.rect = pin.rect.translate(delta);
        }
    }

    pub fn paint(&self, painter: &Painter, hovered: bool) {
        let body = self.rect.shrink2(Vec2::new(4.0, PIN_SIZE));
        painter.rect_filled(body, 4.0, BODY_FILL);
        let outline = if hovered { BODY_OUTLINE_HOVER } else { BODY_OUTLINE };
        painter.rect_stroke(body, 4.0, Stroke::new(1.0, outline), StrokeKind::Outside);
        painter.text(
            body.center(),
            Align2::CENTER_CENTER,
            &self.display_name,
            FontId::proportional(LABEL_FONT_SIZE),
            LABEL_COLOUR,
        );
        for pin in &self.pins {
            pin.paint(painter);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ChannelLayout;

    const CANVAS: Rect = Rect {
        min: Pos2::new(0.0, 0.0),
        max: Pos2::new(1000.0, 800.0),
    };

    fn graph_with(node: PatchNode) -> (PatchGraph, NodeId) {
        let mut graph = PatchGraph::new();
        let id = graph.add_node(node);
        (graph, id)
    }

    #[test]
    fn stereo_midi_node_gets_three_input_pins_and_min_width() {
        let (graph, id) = graph_with(
            PatchNode::new("synth", ChannelLayout::stereo(), ChannelLayout::stereo())
                .with_midi(true, false),
        );
        let mut view = NodeView::new(id);
        view.refresh(&graph, CANVAS, 40.0);

        let inputs: Vec<&Pin> = view.pins.iter().filter(|p| p.dir.is_input()).collect();
        assert_eq!(inputs.len(), 3);
        assert!(inputs[2].is_midi(), "MIDI pin must come last");
        assert!(inputs[2].pos().x > inputs[1].pos().x);
        assert!(view.rect.width() >= 100.0);
        assert_eq!(view.rect.height(), 60.0);
    }

    #[test]
    fn refresh_is_idempotent() {
        let (graph, id) = graph_with(
            PatchNode::new("reverb", ChannelLayout::stereo(), ChannelLayout::stereo())
                .with_midi(true, true),
        );
        let mut view = NodeView::new(id);
        view.refresh(&graph, CANVAS, 55.0);

        let rect = view.rect;
        let pins = view.pins.clone();
        assert_eq!(view.refresh(&graph, CANVAS, 55.0), Refresh::Kept);
        assert_eq!(view.rect, rect);
        assert_eq!(view.pins, pins);
    }

    #[test]
    fn vanished_node_requests_removal() {
        let (mut graph, id) = graph_with(PatchNode::new(
            "gone",
            ChannelLayout::mono(),
            ChannelLayout::mono(),
        ));
        let mut view = NodeView::new(id);
        view.refresh(&graph, CANVAS, 30.0);

        graph.remove_node(id).unwrap();
        assert_eq!(view.refresh(&graph, CANVAS, 30.0), Refresh::Removed);
    }

    #[test]
    fn long_names_widen_the_node_until_the_cap() {
        let (graph, id) = graph_with(PatchNode::new(
            "very long plugin title",
            ChannelLayout::mono(),
            ChannelLayout::mono(),
        ));
        let mut view = NodeView::new(id);

        view.refresh(&graph, CANVAS, 250.0);
        assert_eq!(view.rect.width(), 266.0);
        assert_eq!(view.rect.height(), 60.0);

        // Width is capped, overflow goes into a second text line
        view.refresh(&graph, CANVAS, 340.0);
        assert_eq!(view.rect.width(), 316.0);
        assert_eq!(view.rect.height(), 100.0);
    }

    #[test]
    fn pin_count_drives_width() {
        let (graph, id) = graph_with(PatchNode::new(
            "mixer",
            ChannelLayout::new(vec![8]),
            ChannelLayout::stereo(),
        ));
        let mut view = NodeView::new(id);
        view.refresh(&graph, CANVAS, 30.0);
        // 8 input pins: 20 * (8 + 1)
        assert_eq!(view.rect.width(), 180.0);
    }

    #[test]
    fn view_centres_on_normalized_position() {
        let (mut graph, id) = graph_with(PatchNode::new(
            "osc",
            ChannelLayout::mono(),
            ChannelLayout::mono(),
        ));
        graph.set_node_position(id, [0.25, 0.5]).unwrap();

        let mut view = NodeView::new(id);
        view.refresh(&graph, CANVAS, 30.0);
        assert_eq!(view.rect.center(), Pos2::new(250.0, 400.0));
    }

    #[test]
    fn hit_test_covers_body_and_pins_only() {
        let (graph, id) = graph_with(
            PatchNode::new("synth", ChannelLayout::stereo(), ChannelLayout::stereo())
                .with_midi(true, false),
        );
        let mut view = NodeView::new(id);
        view.refresh(&graph, CANVAS, 40.0);

        assert!(view.hit_test(view.rect.center()));
        // Top-left corner: outside the body inset and not a pin
        assert!(!view.hit_test(view.rect.min + Vec2::new(1.0, 1.0)));
        // But a pin in the top strip hits
        let pin = view.pins[0];
        assert!(view.hit_test(pin.pos()));
        // Just outside the right inset
        assert!(!view.hit_test(Pos2::new(
            view.rect.right() - 3.0,
            view.rect.center().y
        )));
    }

    #[test]
    fn translate_moves_pins_with_the_body() {
        let (graph, id) = graph_with(PatchNode::new(
            "osc",
            ChannelLayout::mono(),
            ChannelLayout::mono(),
        ));
        let mut view = NodeView::new(id);
        view.refresh(&graph, CANVAS, 30.0);

        let pin_before = view.pins[0].pos();
        view.translate(Vec2::new(10.0, -5.0));
        assert_eq!(view.pins[0].pos(), pin_before + Vec2::new(10.0, -5.0));
        assert!(view.hit_test(view.rect.center()));
    }
}
