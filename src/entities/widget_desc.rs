//! Widget description records: the declarative source of a plugin interface.
//!
//! An interface is an ordered list of records, each a type tag plus a flat
//! `Attrs` property set. The `form` record describes the window itself;
//! everything else is instantiated through the widget registry. Records are
//! keyed by widget name, which the layout editor and parameter gestures use
//! as the stable identity.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::attrs::{AttrValue, Attrs};

/// Type tag of the window-level record.
pub const FORM_KIND: &str = "form";

/// One widget record: type tag + properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WidgetDesc {
    pub kind: String,
    pub attrs: Attrs,
}

impl WidgetDesc {
    pub fn new(kind: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            attrs: Attrs::new(),
        }
    }

    /// Builder-style property assignment.
    pub fn with(mut self, key: impl Into<String>, value: AttrValue) -> Self {
        self.attrs.set(key, value);
        self
    }

    /// Widget rectangle within its parent, as (left, top, width, height).
    pub fn bounds(&self) -> [f32; 4] {
        [
            self.attrs.get_float_or("left", 0.0),
            self.attrs.get_float_or("top", 0.0),
            self.attrs.get_float_or("width", 0.0),
            self.attrs.get_float_or("height", 0.0),
        ]
    }

    pub fn set_bounds(&mut self, bounds: [f32; 4]) {
        self.attrs.set("left", AttrValue::Float(bounds[0]));
        self.attrs.set("top", AttrValue::Float(bounds[1]));
        self.attrs.set("width", AttrValue::Float(bounds[2]));
        self.attrs.set("height", AttrValue::Float(bounds[3]));
    }
}

/// Ordered widget records of one plugin interface, keyed by widget name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InterfaceDesc {
    #[serde(default)]
    widgets: IndexMap<String, WidgetDesc>,
}

impl InterfaceDesc {
    pub fn new() -> Self {
        Self {
            widgets: IndexMap::new(),
        }
    }

    /// Interface with just a window record.
    pub fn with_form(caption: impl Into<String>, width: f32, height: f32) -> Self {
        let mut desc = Self::new();
        desc.insert(
            "form",
            WidgetDesc::new(FORM_KIND)
                .with("caption", AttrValue::Str(caption.into()))
                .with("width", AttrValue::Float(width))
                .with("height", AttrValue::Float(height)),
        );
        desc
    }

    /// Insert or replace a record. Returns the previous record for that name.
    pub fn insert(&mut self, name: impl Into<String>, desc: WidgetDesc) -> Option<WidgetDesc> {
        self.widgets.insert(name.into(), desc)
    }

    pub fn get(&self, name: &str) -> Option<&WidgetDesc> {
        self.widgets.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut WidgetDesc> {
        self.widgets.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<WidgetDesc> {
        self.widgets.shift_remove(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.widgets.contains_key(name)
    }

    /// Records in description order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &WidgetDesc)> {
        self.widgets.iter()
    }

    pub fn len(&self) -> usize {
        self.widgets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.widgets.is_empty()
    }

    /// The window record, if the description has one.
    pub fn form(&self) -> Option<(&String, &WidgetDesc)> {
        self.widgets.iter().find(|(_, w)| w.kind == FORM_KIND)
    }

    /// Set one property on a named record. Returns true when the stored
    /// value actually changed, so callers know whether to notify.
    pub fn set_prop(&mut self, name: &str, key: &str, value: AttrValue) -> bool {
        match self.widgets.get_mut(name) {
            Some(desc) => {
                if desc.attrs.get(key) == Some(&value) {
                    return false;
                }
                desc.attrs.set(key, value);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_keep_description_order() {
        let mut desc = InterfaceDesc::with_form("Synth", 400.0, 300.0);
        desc.insert("gain", WidgetDesc::new("rslider"));
        desc.insert("mute", WidgetDesc::new("checkbox"));

        let names: Vec<&str> = desc.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, ["form", "gain", "mute"]);
    }

    #[test]
    fn form_lookup_matches_kind_not_name() {
        let mut desc = InterfaceDesc::new();
        desc.insert("gain", WidgetDesc::new("rslider"));
        assert!(desc.form().is_none());

        desc.insert("main_window", WidgetDesc::new(FORM_KIND));
        let (name, _) = desc.form().unwrap();
        assert_eq!(name, "main_window");
    }

    #[test]
    fn set_prop_reports_real_changes_only() {
        let mut desc = InterfaceDesc::new();
        desc.insert("gain", WidgetDesc::new("rslider").with("value", AttrValue::Float(0.5)));

        assert!(!desc.set_prop("gain", "value", AttrValue::Float(0.5)));
        assert!(desc.set_prop("gain", "value", AttrValue::Float(0.7)));
        assert!(!desc.set_prop("missing", "value", AttrValue::Float(0.7)));
        assert_eq!(desc.get("gain").unwrap().attrs.get_float("value"), Some(0.7));
    }

    #[test]
    fn bounds_roundtrip() {
        let mut w = WidgetDesc::new("button");
        assert_eq!(w.bounds(), [0.0; 4]);
        w.set_bounds([10.0, 20.0, 80.0, 30.0]);
        assert_eq!(w.bounds(), [10.0, 20.0, 80.0, 30.0]);
    }
}
