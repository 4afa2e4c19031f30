//! Widget registry: type tag to factory.
//!
//! Adding a widget kind is a registration, nothing more. The builder asks
//! the registry for a factory per record and skips records it cannot
//! resolve.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

use crate::entities::WidgetDesc;

use super::controls::{
    ButtonView, CheckboxView, ComboBoxView, ConsoleView, GroupBoxView, ImageView, KeyboardView,
    LabelView, NumberBoxView, SliderStyle, SliderView, XyPadView,
};
use super::view::WidgetView;

pub type WidgetFactory = fn(name: &str, desc: &WidgetDesc) -> Box<dyn WidgetView>;

/// Kinds limited to one instance per interface.
const SINGLETON_KINDS: &[&str] = &["keyboard", "console"];

static BUILTIN: Lazy<WidgetRegistry> = Lazy::new(|| {
    let mut reg = WidgetRegistry::new();
    reg.register("hslider", |n, d| {
        Box::new(SliderView::new(n, d, SliderStyle::Horizontal))
    });
    reg.register("vslider", |n, d| {
        Box::new(SliderView::new(n, d, SliderStyle::Vertical))
    });
    reg.register("rslider", |n, d| {
        Box::new(SliderView::new(n, d, SliderStyle::Rotary))
    });
    reg.register("button", |n, d| Box::new(ButtonView::new(n, d)));
    reg.register("checkbox", |n, d| Box::new(CheckboxView::new(n, d)));
    reg.register("combobox", |n, d| Box::new(ComboBoxView::new(n, d)));
    reg.register("label", |n, d| Box::new(LabelView::new(n, d)));
    reg.register("image", |n, d| Box::new(ImageView::new(n, d)));
    reg.register("groupbox", |n, d| Box::new(GroupBoxView::new(n, d)));
    reg.register("numberbox", |n, d| Box::new(NumberBoxView::new(n, d)));
    reg.register("keyboard", |n, d| Box::new(KeyboardView::new(n, d)));
    reg.register("console", |n, d| Box::new(ConsoleView::new(n, d)));
    reg.register("xypad", |n, d| Box::new(XyPadView::new(n, d)));
    reg
});

#[derive(Clone, Default)]
pub struct WidgetRegistry {
    factories: IndexMap<String, WidgetFactory>,
}

impl WidgetRegistry {
    /// Empty registry, for hosts that bring their own widget set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in widget kind.
    pub fn builtin() -> Self {
        BUILTIN.clone()
    }

    /// Registering an existing kind replaces its factory.
    pub fn register(&mut self, kind: impl Into<String>, factory: WidgetFactory) {
        self.factories.insert(kind.into(), factory);
    }

    pub fn make(&self, name: &str, desc: &WidgetDesc) -> Option<Box<dyn WidgetView>> {
        self.factories.get(desc.kind.as_str()).map(|f| f(name, desc))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.factories.contains_key(kind)
    }

    pub fn is_singleton(&self, kind: &str) -> bool {
        SINGLETON_KINDS.contains(&kind)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}
