//! Interface view: a node's control surface built from its description.
//!
//! `InterfaceView::build` walks the description records in order. The
//! `form` record configures the surface itself (caption, size, colour),
//! every other record goes through the registry and becomes a boxed
//! widget child. Unknown kinds are skipped with a warning, never an error.

use eframe::egui::{Color32, Id, Pos2, Rect, Sense, Ui, UiBuilder, Vec2};
use log::warn;

use crate::entities::{Attrs, InterfaceDesc, WidgetDesc, FORM_KIND};

use super::registry::WidgetRegistry;

/// Receiver for automation gestures, keyed by widget name.
pub trait ParamSink {
    fn begin_gesture(&mut self, name: &str);
    fn set_value(&mut self, name: &str, value: f32);
    fn end_gesture(&mut self, name: &str);
}

/// Name and placement shared by every widget.
#[derive(Debug, Clone)]
pub struct WidgetBase {
    pub name: String,
    pub bounds: Rect,
}

impl WidgetBase {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        Self {
            name: name.to_owned(),
            bounds: rect_from_bounds(desc.bounds()),
        }
    }

    pub fn sync(&mut self, desc: &WidgetDesc) {
        self.bounds = rect_from_bounds(desc.bounds());
    }
}

/// One live control inside an interface.
///
/// `ui` renders into a child region sized to `bounds()` and pushes value
/// gestures into the sink; `sync` re-reads the backing description after
/// a property change.
pub trait WidgetView {
    fn base(&self) -> &WidgetBase;
    fn base_mut(&mut self) -> &mut WidgetBase;
    fn kind(&self) -> &'static str;
    fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink);
    fn sync(&mut self, desc: &WidgetDesc);

    fn name(&self) -> &str {
        &self.base().name
    }
    fn bounds(&self) -> Rect {
        self.base().bounds
    }
    fn set_bounds(&mut self, bounds: Rect) {
        self.base_mut().bounds = bounds;
    }
}

pub(crate) fn rect_from_bounds(b: [f32; 4]) -> Rect {
    Rect::from_min_size(Pos2::new(b[0], b[1]), Vec2::new(b[2], b[3]))
}

pub(crate) fn colour32(attrs: &Attrs, key: &str, default: Color32) -> Color32 {
    match attrs.get_colour(key) {
        Some([r, g, b, a]) => Color32::from_rgba_unmultiplied(r, g, b, a),
        None => default,
    }
}

pub struct InterfaceView {
    caption: String,
    size: Vec2,
    background: Color32,
    children: Vec<Box<dyn WidgetView>>,
}

impl InterfaceView {
    pub fn build(desc: &InterfaceDesc, registry: &WidgetRegistry) -> Self {
        let mut view = Self {
            caption: String::new(),
            size: Vec2::new(400.0, 300.0),
            background: Color32::from_gray(25),
            children: Vec::new(),
        };
        for (name, widget) in desc.iter() {
            if widget.kind == FORM_KIND {
                view.apply_form(widget);
                continue;
            }
            if registry.is_singleton(&widget.kind)
                && view.children.iter().any(|c| c.kind() == widget.kind)
            {
                warn!("only one '{}' per interface, skipping '{name}'", widget.kind);
                continue;
            }
            match registry.make(name, widget) {
                Some(child) => view.children.push(child),
                None => warn!("unknown widget kind '{}', skipping '{name}'", widget.kind),
            }
        }
        view
    }

    fn apply_form(&mut self, form: &WidgetDesc) {
        self.caption = form.attrs.get_str_or("caption", "").to_owned();
        self.size = Vec2::new(
            form.attrs.get_float_or("width", 400.0),
            form.attrs.get_float_or("height", 300.0),
        );
        self.background = colour32(&form.attrs, "colour", Color32::from_gray(25));
    }

    pub fn caption(&self) -> &str {
        &self.caption
    }

    pub fn size(&self) -> Vec2 {
        self.size
    }

    pub fn background(&self) -> Color32 {
        self.background
    }

    pub fn children(&self) -> &[Box<dyn WidgetView>] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&dyn WidgetView> {
        self.children
            .iter()
            .find(|c| c.name() == name)
            .map(|b| b.as_ref())
    }

    pub fn child_mut(&mut self, name: &str) -> Option<&mut dyn WidgetView> {
        self.children
            .iter_mut()
            .find(|c| c.name() == name)
            .map(|b| b.as_mut() as &mut dyn WidgetView)
    }

    /// Render every child at its described position, relative to the
    /// current cursor origin. Returns the surface rect so overlays
    /// (layout editor) can cover the same area.
    pub fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) -> Rect {
        let origin = ui.max_rect().min;
        let surface = Rect::from_min_size(origin, self.size);
        ui.painter().rect_filled(surface, 0.0, self.background);
        ui.allocate_rect(surface, Sense::hover());
        for child in &mut self.children {
            let rect = child.bounds().translate(origin.to_vec2());
            let mut child_ui = ui.new_child(
                UiBuilder::new()
                    .max_rect(rect)
                    .id_salt(Id::new(("widget", child.name()))),
            );
            child.ui(&mut child_ui, sink);
        }
        surface
    }

    /// Refresh children from the description after property changes.
    pub fn sync(&mut self, desc: &InterfaceDesc) {
        if let Some((_, form)) = desc.form() {
            self.apply_form(form);
        }
        for child in &mut self.children {
            if let Some(w) = desc.get(child.name()) {
                child.sync(w);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::AttrValue;

    #[test]
    fn build_applies_form_and_keeps_description_order() {
        let mut desc = InterfaceDesc::with_form("My Synth", 520.0, 340.0);
        desc.insert(
            "gain",
            WidgetDesc::new("hslider")
                .with("left", AttrValue::Int(10))
                .with("top", AttrValue::Int(20))
                .with("width", AttrValue::Int(200))
                .with("height", AttrValue::Int(30)),
        );
        desc.insert("mute", WidgetDesc::new("checkbox"));

        let view = InterfaceView::build(&desc, &WidgetRegistry::builtin());
        assert_eq!(view.caption(), "My Synth");
        assert_eq!(view.size(), Vec2::new(520.0, 340.0));
        assert_eq!(view.children().len(), 2);
        assert_eq!(view.children()[0].name(), "gain");
        assert_eq!(view.children()[1].name(), "mute");
        assert_eq!(
            view.child("gain").unwrap().bounds(),
            Rect::from_min_size(Pos2::new(10.0, 20.0), Vec2::new(200.0, 30.0))
        );
    }

    #[test]
    fn unknown_kinds_are_skipped() {
        let mut desc = InterfaceDesc::new();
        desc.insert("mystery", WidgetDesc::new("fancyscope"));
        desc.insert("ok", WidgetDesc::new("button"));

        let view = InterfaceView::build(&desc, &WidgetRegistry::builtin());
        assert_eq!(view.children().len(), 1);
        assert_eq!(view.children()[0].name(), "ok");
    }

    #[test]
    fn singleton_kinds_get_one_slot() {
        let mut desc = InterfaceDesc::new();
        desc.insert("keys1", WidgetDesc::new("keyboard"));
        desc.insert("keys2", WidgetDesc::new("keyboard"));
        desc.insert("log1", WidgetDesc::new("console"));
        desc.insert("log2", WidgetDesc::new("console"));

        let view = InterfaceView::build(&desc, &WidgetRegistry::builtin());
        let kinds: Vec<&str> = view.children().iter().map(|c| c.kind()).collect();
        assert_eq!(kinds, vec!["keyboard", "console"]);
        assert!(view.child("keys2").is_none());
        assert!(view.child("log2").is_none());
    }

    #[test]
    fn sync_refreshes_child_bounds() {
        let mut desc = InterfaceDesc::new();
        desc.insert("gain", WidgetDesc::new("hslider"));
        let mut view = InterfaceView::build(&desc, &WidgetRegistry::builtin());

        desc.get_mut("gain")
            .unwrap()
            .set_bounds([5.0, 6.0, 120.0, 24.0]);
        view.sync(&desc);
        assert_eq!(
            view.child("gain").unwrap().bounds(),
            Rect::from_min_size(Pos2::new(5.0, 6.0), Vec2::new(120.0, 24.0))
        );
    }

    #[test]
    fn set_bounds_moves_only_the_view() {
        let mut desc = InterfaceDesc::new();
        desc.insert("gain", WidgetDesc::new("hslider"));
        let mut view = InterfaceView::build(&desc, &WidgetRegistry::builtin());

        let rect = Rect::from_min_size(Pos2::new(50.0, 60.0), Vec2::new(100.0, 20.0));
        view.child_mut("gain").unwrap().set_bounds(rect);
        assert_eq!(view.child("gain").unwrap().bounds(), rect);
        assert_eq!(desc.get("gain").unwrap().bounds(), [0.0; 4]);
    }
}
