//! Edit-mode overlay for an interface surface.
//!
//! While enabled the editor sits on top of the rendered widgets, keeps
//! one [`LayoutAlias`] per direct child and swallows the pointer, so
//! the widgets underneath never see the gesture. Disabled, it neither
//! paints nor intercepts anything.

use eframe::egui::{Color32, CursorIcon, PointerButton, Pos2, Rect, Sense, Stroke, StrokeKind, Ui};
use indexmap::IndexMap;

use super::alias::{DragZone, LayoutAlias, ResizeEdge};
use super::layout_events::LayoutEvent;
use crate::widgets::interface::InterfaceView;

const FRAME_COLOUR: Color32 = Color32::from_rgb(120, 160, 220);
const ACTIVE_COLOUR: Color32 = Color32::from_rgb(255, 200, 80);

#[derive(Default)]
pub struct LayoutEditor {
    enabled: bool,
    aliases: IndexMap<String, LayoutAlias>,
    active: Option<String>,
}

impl LayoutEditor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Aliases only live while edit mode is on; turning it off drops
    /// them along with any half-finished gesture.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if !enabled {
            self.aliases.clear();
            self.active = None;
        }
    }

    pub fn alias(&self, widget: &str) -> Option<&LayoutAlias> {
        self.aliases.get(widget)
    }

    pub fn alias_count(&self) -> usize {
        self.aliases.len()
    }

    /// Resynchronize one alias per direct child of the interface:
    /// stale aliases go, new children get one, survivors re-read their
    /// bounds from the widget they shadow.
    pub fn update_frames(&mut self, interface: &InterfaceView) {
        if !self.enabled {
            return;
        }
        self.aliases
            .retain(|name, _| interface.child(name).is_some());
        for child in interface.children() {
            match self.aliases.get_mut(child.name()) {
                Some(alias) => alias.set_bounds(child.bounds()),
                None => {
                    self.aliases.insert(
                        child.name().to_owned(),
                        LayoutAlias::new(child.name(), child.bounds()),
                    );
                }
            }
        }
        if let Some(active) = &self.active {
            if !self.aliases.contains_key(active) {
                self.active = None;
            }
        }
    }

    /// Route a press to the topmost alias under it.
    pub fn press(&mut self, pos: Pos2) -> Option<LayoutEvent> {
        if !self.enabled {
            return None;
        }
        let name = self
            .aliases
            .iter()
            .rev()
            .find(|(_, alias)| alias.zone_at(pos).is_some())
            .map(|(name, _)| name.clone())?;
        let event = self.aliases.get_mut(&name)?.press(pos);
        if event.is_some() {
            self.active = Some(name);
        }
        event
    }

    pub fn drag(&mut self, pos: Pos2, parent: Rect) -> Option<LayoutEvent> {
        let name = self.active.clone()?;
        self.aliases.get_mut(&name)?.drag(pos, parent)
    }

    pub fn release(&mut self) -> Option<LayoutEvent> {
        let name = self.active.take()?;
        self.aliases.get_mut(&name)?.release()
    }

    fn zone_under(&self, pos: Pos2) -> Option<DragZone> {
        self.aliases
            .values()
            .rev()
            .find_map(|alias| alias.zone_at(pos))
    }

    /// Draw the alias frames over `surface` and run the gesture loop.
    /// The interact claims the whole surface, so enabled edit mode is
    /// what keeps pointer events away from the live widgets.
    pub fn show(&mut self, ui: &mut Ui, surface: Rect) -> Vec<LayoutEvent> {
        let mut events = Vec::new();
        if !self.enabled {
            return events;
        }
        let response = ui.interact(surface, ui.id().with("layout_editor"), Sense::drag());
        let origin = surface.min.to_vec2();
        let local_parent = Rect::from_min_size(Pos2::ZERO, surface.size());

        if response.drag_started_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                if let Some(event) = self.press(pos - origin) {
                    events.push(event);
                }
            }
        }
        if response.dragged_by(PointerButton::Primary) {
            if let Some(pos) = response.interact_pointer_pos() {
                if let Some(event) = self.drag(pos - origin, local_parent) {
                    events.push(event);
                }
            }
        }
        if response.drag_stopped_by(PointerButton::Primary) {
            if let Some(event) = self.release() {
                events.push(event);
            }
        }

        if let Some(pos) = response.hover_pos() {
            if let Some(zone) = self.zone_under(pos - origin) {
                ui.ctx().output_mut(|o| o.cursor_icon = zone_cursor(zone));
            }
        }

        let painter = ui.painter_at(surface);
        for alias in self.aliases.values() {
            let rect = alias.bounds().translate(origin);
            let active = self.active.as_deref() == Some(alias.widget());
            let colour = if active { ACTIVE_COLOUR } else { FRAME_COLOUR };
            painter.rect_stroke(rect, 0.0, Stroke::new(1.0, colour), StrokeKind::Inside);
            if active {
                painter.rect_filled(rect, 0.0, colour.gamma_multiply(0.15));
            }
        }
        events
    }
}

fn zone_cursor(zone: DragZone) -> CursorIcon {
    match zone {
        DragZone::Interior => CursorIcon::Move,
        DragZone::Border(ResizeEdge::Left) | DragZone::Border(ResizeEdge::Right) => {
            CursorIcon::ResizeHorizontal
        }
        DragZone::Border(ResizeEdge::Top) | DragZone::Border(ResizeEdge::Bottom) => {
            CursorIcon::ResizeVertical
        }
        DragZone::Border(ResizeEdge::TopLeft) | DragZone::Border(ResizeEdge::BottomRight) => {
            CursorIcon::ResizeNwSe
        }
        DragZone::Border(ResizeEdge::TopRight) | DragZone::Border(ResizeEdge::BottomLeft) => {
            CursorIcon::ResizeNeSw
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{InterfaceDesc, WidgetDesc};
    use crate::widgets::interface::WidgetRegistry;
    use eframe::egui::pos2;

    fn interface() -> InterfaceView {
        let mut desc = InterfaceDesc::with_form("Layout", 400.0, 300.0);

        let mut gain = WidgetDesc::new("rslider");
        gain.set_bounds([50.0, 40.0, 100.0, 30.0]);
        desc.insert("gain", gain);

        let mut mix = WidgetDesc::new("hslider");
        mix.set_bounds([50.0, 100.0, 100.0, 30.0]);
        desc.insert("mix", mix);

        InterfaceView::build(&desc, &WidgetRegistry::builtin())
    }

    fn editor() -> LayoutEditor {
        let mut editor = LayoutEditor::new();
        editor.set_enabled(true);
        editor.update_frames(&interface());
        editor
    }

    fn parent() -> Rect {
        Rect::from_min_size(Pos2::ZERO, eframe::egui::Vec2::new(400.0, 300.0))
    }

    #[test]
    fn frames_track_the_interface_children() {
        let editor = editor();
        assert_eq!(editor.alias_count(), 2);
        assert_eq!(
            editor.alias("gain").map(|a| a.bounds().min),
            Some(pos2(50.0, 40.0))
        );
        assert_eq!(
            editor.alias("mix").map(|a| a.bounds().min),
            Some(pos2(50.0, 100.0))
        );
    }

    #[test]
    fn stale_frames_drop_when_the_interface_shrinks() {
        let mut editor = editor();
        let mut desc = InterfaceDesc::new();
        let mut gain = WidgetDesc::new("rslider");
        gain.set_bounds([50.0, 40.0, 100.0, 30.0]);
        desc.insert("gain", gain);
        let view = InterfaceView::build(&desc, &WidgetRegistry::builtin());

        editor.update_frames(&view);
        assert_eq!(editor.alias_count(), 1);
        assert!(editor.alias("mix").is_none());
    }

    #[test]
    fn disabled_editor_intercepts_nothing() {
        let mut editor = editor();
        editor.set_enabled(false);
        assert_eq!(editor.alias_count(), 0);
        assert!(editor.press(pos2(100.0, 55.0)).is_none());
    }

    #[test]
    fn gesture_routes_to_the_pressed_alias() {
        let mut editor = editor();
        let started = editor.press(pos2(100.0, 110.0));
        assert_eq!(started.as_ref().map(|e| e.widget()), Some("mix"));

        editor.drag(pos2(100.0, 140.0), parent());
        assert_eq!(
            editor.alias("mix").map(|a| a.bounds().min),
            Some(pos2(50.0, 130.0))
        );
        // The other alias never moved.
        assert_eq!(
            editor.alias("gain").map(|a| a.bounds().min),
            Some(pos2(50.0, 40.0))
        );

        match editor.release() {
            Some(LayoutEvent::Finished { widget, changed, .. }) => {
                assert_eq!(widget, "mix");
                assert!(changed);
            }
            other => panic!("expected a finish, got {other:?}"),
        }
        // A second release has no gesture to end.
        assert!(editor.release().is_none());
    }

    #[test]
    fn press_on_empty_surface_arms_nothing() {
        let mut editor = editor();
        assert!(editor.press(pos2(300.0, 250.0)).is_none());
        assert!(editor.drag(pos2(310.0, 260.0), parent()).is_none());
    }

    #[test]
    fn resync_keeps_the_alias_a_gesture_is_holding() {
        let mut editor = editor();
        editor.press(pos2(100.0, 55.0));
        editor.drag(pos2(130.0, 55.0), parent());
        let held = editor.alias("gain").map(|a| a.bounds());

        editor.update_frames(&interface());
        assert_eq!(editor.alias("gain").map(|a| a.bounds()), held);

        editor.release();
        editor.update_frames(&interface());
        assert_eq!(
            editor.alias("gain").map(|a| a.bounds().min),
            Some(pos2(50.0, 40.0))
        );
    }
}
