//! Generic attribute storage for widget description records.
//!
//! Every widget record carries a flat key -> value property set
//! ("bounds", "text", "colour", "min", "max", ...). Values keep insertion
//! order so serialized descriptions stay diffable.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Generic attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    Bool(bool),
    Str(String),
    Int(i32),
    Float(f32),
    /// RGBA, 0-255 per component.
    Colour([u8; 4]),
}

impl AttrValue {
    /// Colour as egui-friendly premultiplied-free RGBA floats (0..1).
    pub fn as_rgba_f32(&self) -> Option<[f32; 4]> {
        match self {
            AttrValue::Colour(c) => Some([
                c[0] as f32 / 255.0,
                c[1] as f32 / 255.0,
                c[2] as f32 / 255.0,
                c[3] as f32 / 255.0,
            ]),
            _ => None,
        }
    }
}

/// Attribute container: string key -> typed value, insertion-ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Attrs {
    #[serde(default)]
    map: IndexMap<String, AttrValue>,
}

impl Attrs {
    pub fn new() -> Self {
        Self {
            map: IndexMap::new(),
        }
    }

    pub fn set(&mut self, key: impl Into<String>, value: AttrValue) {
        self.map.insert(key.into(), value);
    }

    pub fn get(&self, key: &str) -> Option<&AttrValue> {
        self.map.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        match self.map.get(key) {
            Some(AttrValue::Str(s)) => Some(s),
            _ => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.map.get(key) {
            Some(AttrValue::Int(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_float(&self, key: &str) -> Option<f32> {
        match self.map.get(key) {
            // Numeric properties arrive as either kind depending on the
            // authoring source; widen rather than force authors to care.
            Some(AttrValue::Float(v)) => Some(*v),
            Some(AttrValue::Int(v)) => Some(*v as f32),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.map.get(key) {
            Some(AttrValue::Bool(v)) => Some(*v),
            _ => None,
        }
    }

    pub fn get_colour(&self, key: &str) -> Option<[u8; 4]> {
        match self.map.get(key) {
            Some(AttrValue::Colour(c)) => Some(*c),
            _ => None,
        }
    }

    // Generic helpers with defaults (to reduce boilerplate)

    /// Get str value with custom default
    pub fn get_str_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get_str(key).unwrap_or(default)
    }

    /// Get i32 value with custom default
    pub fn get_i32_or(&self, key: &str, default: i32) -> i32 {
        self.get_i32(key).unwrap_or(default)
    }

    /// Get float value with custom default
    pub fn get_float_or(&self, key: &str, default: f32) -> f32 {
        self.get_float(key).unwrap_or(default)
    }

    /// Get bool value with custom default
    pub fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }

    /// Get colour value with custom default
    pub fn get_colour_or(&self, key: &str, default: [u8; 4]) -> [u8; 4] {
        self.get_colour(key).unwrap_or(default)
    }

    /// Get mutable reference to attribute value
    pub fn get_mut(&mut self, key: &str) -> Option<&mut AttrValue> {
        self.map.get_mut(key)
    }

    /// Remove attribute by key
    pub fn remove(&mut self, key: &str) -> Option<AttrValue> {
        self.map.shift_remove(key)
    }

    /// Iterate over all attributes (key, value)
    pub fn iter(&self) -> impl Iterator<Item = (&String, &AttrValue)> {
        self.map.iter()
    }

    /// Check if attribute exists
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Get number of attributes
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn typed_getters_reject_mismatched_kinds() {
        let mut attrs = Attrs::new();
        attrs.set("text", AttrValue::Str("gain".into()));
        attrs.set("min", AttrValue::Float(0.0));

        assert_eq!(attrs.get_str("text"), Some("gain"));
        assert_eq!(attrs.get_float("text"), None);
        assert_eq!(attrs.get_bool("min"), None);
        assert_eq!(attrs.get_str("missing"), None);
    }

    #[test]
    fn float_getter_widens_ints() {
        let mut attrs = Attrs::new();
        attrs.set("max", AttrValue::Int(127));
        assert_eq!(attrs.get_float("max"), Some(127.0));
        assert_eq!(attrs.get_float_or("nope", 1.5), 1.5);
    }

    #[test]
    fn defaults_apply_only_when_absent() {
        let mut attrs = Attrs::new();
        attrs.set("visible", AttrValue::Bool(false));
        assert!(!attrs.get_bool_or("visible", true));
        assert!(attrs.get_bool_or("enabled", true));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut attrs = Attrs::new();
        attrs.set("b", AttrValue::Int(1));
        attrs.set("a", AttrValue::Int(2));
        attrs.set("c", AttrValue::Int(3));
        let keys: Vec<&str> = attrs.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(keys, ["b", "a", "c"]);
    }

    #[test]
    fn colour_roundtrip() {
        let mut attrs = Attrs::new();
        attrs.set("colour", AttrValue::Colour([255, 128, 0, 255]));
        assert_eq!(attrs.get_colour("colour"), Some([255, 128, 0, 255]));
        let rgba = attrs.get("colour").and_then(|v| v.as_rgba_f32()).unwrap();
        assert!((rgba[0] - 1.0).abs() < f32::EPSILON);
        assert!((rgba[1] - 128.0 / 255.0).abs() < f32::EPSILON);
    }
}
