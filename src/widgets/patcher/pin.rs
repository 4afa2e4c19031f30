//! Pin: one connectable channel endpoint on a node view.

use eframe::egui::{Painter, Pos2, Rect, Vec2};

use crate::entities::{Endpoint, PinDir};

use super::{AUDIO_COLOUR, MIDI_COLOUR};

/// Pin square side, also the vertical inset of the node body.
pub const PIN_SIZE: f32 = 16.0;

/// One pin of a node view. Owned exclusively by its `NodeView`; identity is
/// the endpoint, geometry is re-derived on every layout pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pin {
    pub endpoint: Endpoint,
    pub dir: PinDir,
    /// Index of the bus this channel belongs to (0 for MIDI).
    pub bus_index: usize,
    pub rect: Rect,
}

impl Pin {
    pub fn new(endpoint: Endpoint, dir: PinDir) -> Self {
        Self {
            endpoint,
            dir,
            bus_index: 0,
            rect: Rect::ZERO,
        }
    }

    pub fn is_midi(&self) -> bool {
        self.endpoint.channel.is_midi()
    }

    /// Connector attachment point.
    pub fn pos(&self) -> Pos2 {
        self.rect.center()
    }

    pub fn contains(&self, pos: Pos2) -> bool {
        self.rect.contains(pos)
    }

    /// Disc with a stem pointing into the node body.
    pub fn paint(&self, painter: &Painter) {
        let colour = if self.is_midi() { MIDI_COLOUR } else { AUDIO_COLOUR };
        let w = self.rect.width();
        let h = self.rect.height();

        painter.circle_filled(self.pos(), w * 0.25, colour);
        let stem_top = if self.dir.is_input() {
            self.rect.top() + h * 0.5
        } else {
            self.rect.top()
        };
        let stem = Rect::from_min_size(
            Pos2::new(self.rect.left() + w * 0.4, stem_top),
            Vec2::new(w * 0.2, h * 0.5),
        );
        painter.rect_filled(stem, 0.0, colour);
    }
}

/// Horizontal placement fraction for a pin slot.
///
/// `total` counts every pin on that side (MIDI included), `bus_count` counts
/// audio buses only. Crossing a bus boundary shifts the slot by half a step,
/// which reads as a small gap between buses.
pub fn x_fraction(index: usize, bus_index: usize, total: usize, bus_count: usize) -> f32 {
    let total_slots = total as f32 + 0.5 * bus_count.saturating_sub(1) as f32;
    let slot = index as f32 + 0.5 * bus_index as f32;
    (1.0 + slot) / (total_slots + 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractions_are_monotonic_and_interior() {
        // Stereo + stereo + mono across three buses
        let buses = [(0usize, 0usize), (1, 0), (2, 1), (3, 1), (4, 2)];
        let total = 5;
        let bus_count = 3;

        let mut last = 0.0f32;
        for (index, bus) in buses {
            let f = x_fraction(index, bus, total, bus_count);
            assert!(f > 0.0 && f < 1.0, "fraction {} out of range", f);
            assert!(f > last, "fraction must grow with index");
            last = f;
        }
    }

    #[test]
    fn single_bus_spreads_evenly() {
        let f0 = x_fraction(0, 0, 3, 1);
        let f1 = x_fraction(1, 0, 3, 1);
        let f2 = x_fraction(2, 0, 3, 1);
        assert!((f0 - 0.25).abs() < 1e-6);
        assert!((f1 - 0.50).abs() < 1e-6);
        assert!((f2 - 0.75).abs() < 1e-6);
    }

    #[test]
    fn bus_boundary_adds_half_slot() {
        // Two stereo buses: gap between index 1 and 2 is 1.5 slots,
        // gaps inside a bus stay 1.0
        let total = 4;
        let buses = 2;
        let f = |i, b| x_fraction(i, b, total, buses);
        let step_inside = f(1, 0) - f(0, 0);
        let step_across = f(2, 1) - f(1, 0);
        assert!((step_across / step_inside - 1.5).abs() < 1e-5);
    }
}
