//! A draggable stand-in for one interface widget while edit mode is on.
//!
//! The alias shadows the widget's bounds. A press inside the border strip
//! arms one of eight resize zones, a press anywhere else arms a move.
//! Bounds only change while a gesture runs; the release hook reports
//! whether anything moved since the press snapshot.

use eframe::egui::{Pos2, Rect, Vec2};

use super::layout_events::LayoutEvent;

/// Width of the border strip that resizes instead of moving.
pub const BORDER_ZONE: f32 = 6.0;
/// Widgets cannot be resized below this on either axis.
pub const MIN_SIZE: f32 = 8.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResizeEdge {
    Left,
    Right,
    Top,
    Bottom,
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeEdge {
    /// Which sides of the rect this edge drags: (left, right, top, bottom).
    fn sides(self) -> (bool, bool, bool, bool) {
        match self {
            ResizeEdge::Left => (true, false, false, false),
            ResizeEdge::Right => (false, true, false, false),
            ResizeEdge::Top => (false, false, true, false),
            ResizeEdge::Bottom => (false, false, false, true),
            ResizeEdge::TopLeft => (true, false, true, false),
            ResizeEdge::TopRight => (false, true, true, false),
            ResizeEdge::BottomLeft => (true, false, false, true),
            ResizeEdge::BottomRight => (false, true, false, true),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DragZone {
    Interior,
    Border(ResizeEdge),
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum DragState {
    Idle,
    Pressed { zone: DragZone },
    Dragging { zone: DragZone },
}

pub struct LayoutAlias {
    widget: String,
    bounds: Rect,
    state: DragState,
    start: Rect,
    press_pos: Pos2,
}

impl LayoutAlias {
    pub fn new(widget: impl Into<String>, bounds: Rect) -> Self {
        Self {
            widget: widget.into(),
            bounds,
            state: DragState::Idle,
            start: bounds,
            press_pos: Pos2::ZERO,
        }
    }

    pub fn widget(&self) -> &str {
        &self.widget
    }

    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    /// Resynchronize from the shadowed widget. No-op mid-gesture, the
    /// alias owns the bounds until release.
    pub fn set_bounds(&mut self, bounds: Rect) {
        if !self.is_adjusting() {
            self.bounds = bounds;
        }
    }

    pub fn is_adjusting(&self) -> bool {
        !matches!(self.state, DragState::Idle)
    }

    /// Classify a point against the current bounds. Corners win over
    /// edges, the border strip wins over the interior.
    pub fn zone_at(&self, pos: Pos2) -> Option<DragZone> {
        let b = self.bounds;
        if !b.contains(pos) {
            return None;
        }
        let left = pos.x < b.left() + BORDER_ZONE;
        let right = pos.x >= b.right() - BORDER_ZONE;
        let top = pos.y < b.top() + BORDER_ZONE;
        let bottom = pos.y >= b.bottom() - BORDER_ZONE;
        let zone = match (left, right, top, bottom) {
            (true, _, true, _) => DragZone::Border(ResizeEdge::TopLeft),
            (_, true, true, _) => DragZone::Border(ResizeEdge::TopRight),
            (true, _, _, true) => DragZone::Border(ResizeEdge::BottomLeft),
            (_, true, _, true) => DragZone::Border(ResizeEdge::BottomRight),
            (true, _, _, _) => DragZone::Border(ResizeEdge::Left),
            (_, true, _, _) => DragZone::Border(ResizeEdge::Right),
            (_, _, true, _) => DragZone::Border(ResizeEdge::Top),
            (_, _, _, true) => DragZone::Border(ResizeEdge::Bottom),
            _ => DragZone::Interior,
        };
        Some(zone)
    }

    /// Arm a gesture if the press lands on this alias.
    pub fn press(&mut self, pos: Pos2) -> Option<LayoutEvent> {
        let zone = self.zone_at(pos)?;
        self.state = DragState::Pressed { zone };
        self.start = self.bounds;
        self.press_pos = pos;
        Some(LayoutEvent::Started {
            widget: self.widget.clone(),
            bounds: self.bounds,
        })
    }

    /// Apply the pointer position to the armed gesture. Bounds are
    /// recomputed from the press snapshot so clamping never drifts.
    pub fn drag(&mut self, pos: Pos2, parent: Rect) -> Option<LayoutEvent> {
        let zone = match self.state {
            DragState::Pressed { zone } | DragState::Dragging { zone } => zone,
            DragState::Idle => return None,
        };
        self.state = DragState::Dragging { zone };
        let delta = pos - self.press_pos;
        let next = match zone {
            DragZone::Interior => constrain_move(self.start.translate(delta), parent),
            DragZone::Border(edge) => resize_edge(self.start, edge, delta, parent),
        };
        if next == self.bounds {
            return None;
        }
        self.bounds = next;
        Some(LayoutEvent::Changed {
            widget: self.widget.clone(),
            bounds: next,
        })
    }

    /// End the gesture. Reports `changed` only when the final bounds
    /// differ from the press snapshot.
    pub fn release(&mut self) -> Option<LayoutEvent> {
        if !self.is_adjusting() {
            return None;
        }
        self.state = DragState::Idle;
        Some(LayoutEvent::Finished {
            widget: self.widget.clone(),
            bounds: self.bounds,
            changed: self.bounds != self.start,
        })
    }
}

/// Keep a moved rect inside the parent without changing its size.
fn constrain_move(rect: Rect, parent: Rect) -> Rect {
    let mut shift = Vec2::ZERO;
    if rect.left() < parent.left() {
        shift.x = parent.left() - rect.left();
    }
    if rect.right() + shift.x > parent.right() {
        shift.x = parent.right() - rect.right();
    }
    if rect.top() < parent.top() {
        shift.y = parent.top() - rect.top();
    }
    if rect.bottom() + shift.y > parent.bottom() {
        shift.y = parent.bottom() - rect.bottom();
    }
    rect.translate(shift)
}

/// Drag the sides named by `edge`, holding the minimum size and staying
/// inside the parent. Minimum size wins if the two ever conflict.
fn resize_edge(start: Rect, edge: ResizeEdge, delta: Vec2, parent: Rect) -> Rect {
    let mut rect = start;
    let (left, right, top, bottom) = edge.sides();
    if left {
        rect.min.x = (start.min.x + delta.x)
            .max(parent.left())
            .min(rect.max.x - MIN_SIZE);
    }
    if right {
        rect.max.x = (start.max.x + delta.x)
            .min(parent.right())
            .max(rect.min.x + MIN_SIZE);
    }
    if top {
        rect.min.y = (start.min.y + delta.y)
            .max(parent.top())
            .min(rect.max.y - MIN_SIZE);
    }
    if bottom {
        rect.max.y = (start.max.y + delta.y)
            .min(parent.bottom())
            .max(rect.min.y + MIN_SIZE);
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;
    use eframe::egui::pos2;

    fn parent() -> Rect {
        Rect::from_min_size(Pos2::ZERO, Vec2::new(400.0, 300.0))
    }

    fn alias() -> LayoutAlias {
        LayoutAlias::new("gain", Rect::from_min_size(pos2(50.0, 40.0), Vec2::new(100.0, 30.0)))
    }

    #[test]
    fn zones_split_the_border_from_the_interior() {
        let a = alias();
        assert_eq!(a.zone_at(pos2(100.0, 55.0)), Some(DragZone::Interior));
        assert_eq!(
            a.zone_at(pos2(51.0, 55.0)),
            Some(DragZone::Border(ResizeEdge::Left))
        );
        assert_eq!(
            a.zone_at(pos2(149.0, 55.0)),
            Some(DragZone::Border(ResizeEdge::Right))
        );
        assert_eq!(
            a.zone_at(pos2(100.0, 41.0)),
            Some(DragZone::Border(ResizeEdge::Top))
        );
        // Corners win where two edge strips overlap.
        assert_eq!(
            a.zone_at(pos2(51.0, 41.0)),
            Some(DragZone::Border(ResizeEdge::TopLeft))
        );
        assert_eq!(
            a.zone_at(pos2(149.0, 68.0)),
            Some(DragZone::Border(ResizeEdge::BottomRight))
        );
        assert_eq!(a.zone_at(pos2(10.0, 10.0)), None);
    }

    #[test]
    fn interior_drag_moves_and_reports_each_step() {
        let mut a = alias();
        let started = a.press(pos2(100.0, 55.0));
        assert!(matches!(started, Some(LayoutEvent::Started { .. })));

        let moved = a.drag(pos2(120.0, 65.0), parent());
        match moved {
            Some(LayoutEvent::Changed { bounds, .. }) => {
                assert_eq!(bounds.min, pos2(70.0, 50.0));
                assert_eq!(bounds.size(), Vec2::new(100.0, 30.0));
            }
            other => panic!("expected a change, got {other:?}"),
        }

        // Holding still reports nothing new.
        assert!(a.drag(pos2(120.0, 65.0), parent()).is_none());

        match a.release() {
            Some(LayoutEvent::Finished { changed, .. }) => assert!(changed),
            other => panic!("expected a finish, got {other:?}"),
        }
        assert!(!a.is_adjusting());
    }

    #[test]
    fn moves_clamp_to_the_parent_rect() {
        let mut a = alias();
        a.press(pos2(100.0, 55.0));
        a.drag(pos2(-500.0, -500.0), parent());
        assert_eq!(a.bounds().min, Pos2::ZERO);
        a.drag(pos2(900.0, 900.0), parent());
        assert_eq!(a.bounds().max, pos2(400.0, 300.0));
        assert_eq!(a.bounds().size(), Vec2::new(100.0, 30.0));
    }

    #[test]
    fn border_drag_resizes_the_pressed_edge_only() {
        let mut a = alias();
        a.press(pos2(149.0, 55.0));
        a.drag(pos2(189.0, 80.0), parent());
        // Right edge follows x, the rest hold.
        assert_eq!(a.bounds().max.x, 190.0);
        assert_eq!(a.bounds().min, pos2(50.0, 40.0));
        assert_eq!(a.bounds().max.y, 70.0);
    }

    #[test]
    fn corner_drag_resizes_both_axes() {
        let mut a = alias();
        a.press(pos2(51.0, 41.0));
        a.drag(pos2(41.0, 21.0), parent());
        assert_eq!(a.bounds().min, pos2(40.0, 20.0));
        assert_eq!(a.bounds().max, pos2(150.0, 70.0));
    }

    #[test]
    fn resize_stops_at_the_minimum_size() {
        let mut a = alias();
        a.press(pos2(149.0, 55.0));
        a.drag(pos2(-400.0, 55.0), parent());
        assert_eq!(a.bounds().width(), MIN_SIZE);
        assert_eq!(a.bounds().min.x, 50.0);
    }

    #[test]
    fn untouched_release_reports_no_change() {
        let mut a = alias();
        a.press(pos2(100.0, 55.0));
        match a.release() {
            Some(LayoutEvent::Finished { changed, bounds, .. }) => {
                assert!(!changed);
                assert_eq!(bounds, alias().bounds());
            }
            other => panic!("expected a finish, got {other:?}"),
        }
    }

    #[test]
    fn sync_is_ignored_while_a_gesture_runs() {
        let mut a = alias();
        a.press(pos2(100.0, 55.0));
        a.drag(pos2(110.0, 55.0), parent());
        let held = a.bounds();
        a.set_bounds(Rect::from_min_size(Pos2::ZERO, Vec2::splat(10.0)));
        assert_eq!(a.bounds(), held);
        a.release();
        a.set_bounds(Rect::from_min_size(Pos2::ZERO, Vec2::splat(10.0)));
        assert_eq!(a.bounds().size(), Vec2::splat(10.0));
    }
}
