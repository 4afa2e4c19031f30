//! Connector: the visual of one connection, a vertical-flowing cubic curve
//! from a source pin to a dest pin with an arrowhead at the midpoint.

use eframe::egui::emath::Rot2;
use eframe::egui::{Color32, Painter, Pos2, Rect, Shape, Stroke, Vec2};

use crate::entities::Connection;

use super::{AUDIO_COLOUR, MIDI_COLOUR};

/// Grab stroke is 5px wide, so anything within half of that hits.
pub const HIT_DISTANCE: f32 = 2.5;
/// Dead zone around the endpoints, so pins stay clickable over the curve.
pub const END_EXCLUSION: f32 = 7.0;
/// Painted stroke width.
const STROKE_WIDTH: f32 = 2.5;
/// Arrowhead half extents: base half-width and apex half-length.
const ARROW_HALF_WIDTH: f32 = 5.0;
const ARROW_HALF_LENGTH: f32 = 4.0;
/// Flattening resolution for painting and hit testing.
const SEGMENTS: usize = 32;

/// View of exactly one connection. Endpoint positions are re-derived from
/// pin rectangles each pass and cached, so the curve survives a node view
/// disappearing mid-gesture.
#[derive(Debug, Clone)]
pub struct ConnectorView {
    pub connection: Connection,
    source_pos: Pos2,
    dest_pos: Pos2,
}

impl ConnectorView {
    pub fn new(connection: Connection) -> Self {
        Self {
            connection,
            source_pos: Pos2::ZERO,
            dest_pos: Pos2::ZERO,
        }
    }

    /// Adopt freshly resolved pin positions; a side whose node view is gone
    /// keeps its last known position.
    pub fn resolve(&mut self, source: Option<Pos2>, dest: Option<Pos2>) -> (Pos2, Pos2) {
        if let Some(p) = source {
            self.source_pos = p;
        }
        if let Some(p) = dest {
            self.dest_pos = p;
        }
        (self.source_pos, self.dest_pos)
    }

    /// Endpoint positions as of the last resolve.
    pub fn endpoints(&self) -> (Pos2, Pos2) {
        (self.source_pos, self.dest_pos)
    }

    pub fn hit_test(&self, pos: Pos2) -> bool {
        hit_test(self.source_pos, self.dest_pos, pos)
    }

    pub fn paint(&self, painter: &Painter, hovered: bool) {
        let colour = if self.connection.is_midi() {
            MIDI_COLOUR
        } else {
            AUDIO_COLOUR
        };
        paint_connector(painter, self.source_pos, self.dest_pos, colour, hovered);
    }
}

/// Cubic control points: both sit on the endpoint verticals, one third and
/// two thirds of the way down the vertical span.
fn control_points(p1: Pos2, p2: Pos2) -> (Pos2, Pos2) {
    let dy = p2.y - p1.y;
    (
        Pos2::new(p1.x, p1.y + dy / 3.0),
        Pos2::new(p2.x, p1.y + 2.0 * dy / 3.0),
    )
}

/// Flatten the curve to a polyline for painting and hit testing.
pub fn path_points(p1: Pos2, p2: Pos2) -> Vec<Pos2> {
    let (c1, c2) = control_points(p1, p2);
    (0..=SEGMENTS)
        .map(|i| {
            let t = i as f32 / SEGMENTS as f32;
            let t2 = t * t;
            let t3 = t2 * t;
            let mt = 1.0 - t;
            let mt2 = mt * mt;
            let mt3 = mt2 * mt;
            Pos2::new(
                mt3 * p1.x + 3.0 * mt2 * t * c1.x + 3.0 * mt * t2 * c2.x + t3 * p2.x,
                mt3 * p1.y + 3.0 * mt2 * t * c1.y + 3.0 * mt * t2 * c2.y + t3 * p2.y,
            )
        })
        .collect()
}

/// Arrowhead triangle at the chord midpoint, pointing along the chord.
/// For this control-point scheme the chord midpoint lies on the curve.
pub fn arrow_points(p1: Pos2, p2: Pos2) -> [Pos2; 3] {
    let mid = Pos2::new((p1.x + p2.x) * 0.5, (p1.y + p2.y) * 0.5);
    let rot = Rot2::from_angle((p2.y - p1.y).atan2(p2.x - p1.x));
    [
        Vec2::new(-ARROW_HALF_LENGTH, ARROW_HALF_WIDTH),
        Vec2::new(-ARROW_HALF_LENGTH, -ARROW_HALF_WIDTH),
        Vec2::new(ARROW_HALF_LENGTH, 0.0),
    ]
    .map(|v| mid + rot * v)
}

/// True when `pos` lies on the grab stroke but clear of both endpoints.
pub fn hit_test(p1: Pos2, p2: Pos2, pos: Pos2) -> bool {
    if pos.distance(p1) <= END_EXCLUSION || pos.distance(p2) <= END_EXCLUSION {
        return false;
    }

    // Control points sit on the endpoint verticals, so the whole curve
    // lives inside the endpoint bounding box
    let bounds = Rect::from_two_pos(p1, p2).expand(HIT_DISTANCE);
    if !bounds.contains(pos) {
        return false;
    }

    let points = path_points(p1, p2);
    points
        .windows(2)
        .any(|seg| dist_to_segment(pos, seg[0], seg[1]) <= HIT_DISTANCE)
}

fn dist_to_segment(pos: Pos2, a: Pos2, b: Pos2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_sq();
    if len_sq <= f32::EPSILON {
        return pos.distance(a);
    }
    let t = ((pos - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    pos.distance(a + ab * t)
}

pub fn paint_connector(painter: &Painter, p1: Pos2, p2: Pos2, colour: Color32, hovered: bool) {
    let width = if hovered { STROKE_WIDTH * 1.6 } else { STROKE_WIDTH };
    painter.add(Shape::line(path_points(p1, p2), Stroke::new(width, colour)));
    painter.add(Shape::convex_polygon(
        arrow_points(p1, p2).to_vec(),
        colour,
        Stroke::NONE,
    ));
}
