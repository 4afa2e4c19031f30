//! Built-in widget set.
//!
//! Thin egui renderings of the classic control surface widgets. Each one
//! caches what it needs from its description record, redraws from that
//! cache, and reports value gestures as begin/set/end triples keyed by
//! widget name.

use eframe::egui::{
    self, epaint, Align2, Color32, FontId, Pos2, Rect, RichText, Sense, Stroke, StrokeKind, Ui,
    Vec2,
};

use crate::entities::WidgetDesc;

use super::view::{colour32, ParamSink, WidgetBase, WidgetView};

/// One gesture triple, the way host automation expects them.
fn emit(sink: &mut dyn ParamSink, name: &str, value: f32) {
    sink.begin_gesture(name);
    sink.set_value(name, value);
    sink.end_gesture(name);
}

// ---------------------------------------------------------------------------
// Sliders

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SliderStyle {
    Horizontal,
    Vertical,
    Rotary,
}

#[derive(Debug)]
pub struct SliderView {
    base: WidgetBase,
    style: SliderStyle,
    label: String,
    min: f32,
    max: f32,
    value: f32,
}

impl SliderView {
    pub fn new(name: &str, desc: &WidgetDesc, style: SliderStyle) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            style,
            label: String::new(),
            min: 0.0,
            max: 1.0,
            value: 0.0,
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.label = desc.attrs.get_str_or("text", "").to_owned();
        self.min = desc.attrs.get_float_or("min", 0.0);
        self.max = desc.attrs.get_float_or("max", 1.0).max(self.min);
        self.value = desc
            .attrs
            .get_float_or("value", self.min)
            .clamp(self.min, self.max);
    }

    pub fn value(&self) -> f32 {
        self.value
    }

    fn knob_ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) {
        let (rect, resp) = ui.allocate_exact_size(ui.available_size(), Sense::drag());
        if resp.dragged() {
            let span = self.max - self.min;
            let next =
                (self.value - resp.drag_delta().y / 200.0 * span).clamp(self.min, self.max);
            if next != self.value {
                self.value = next;
                emit(sink, &self.base.name, self.value);
            }
        }
        let radius = rect.size().min_elem() / 2.0 - 2.0;
        let t = if self.max > self.min {
            (self.value - self.min) / (self.max - self.min)
        } else {
            0.0
        };
        // Sweep from lower-left through twelve o'clock to lower-right.
        let angle = (0.75 + t * 1.5) * std::f32::consts::PI;
        let painter = ui.painter();
        painter.circle(
            rect.center(),
            radius,
            Color32::from_gray(50),
            Stroke::new(1.0, Color32::from_gray(120)),
        );
        painter.line_segment(
            [
                rect.center(),
                rect.center() + Vec2::angled(angle) * radius * 0.8,
            ],
            Stroke::new(2.0, Color32::from_gray(220)),
        );
    }
}

impl WidgetView for SliderView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        match self.style {
            SliderStyle::Horizontal => "hslider",
            SliderStyle::Vertical => "vslider",
            SliderStyle::Rotary => "rslider",
        }
    }

    fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) {
        if self.style == SliderStyle::Rotary {
            return self.knob_ui(ui, sink);
        }
        let slider = egui::Slider::new(&mut self.value, self.min..=self.max)
            .text(self.label.as_str());
        let slider = match self.style {
            SliderStyle::Vertical => slider.vertical(),
            _ => slider,
        };
        if ui.add(slider).changed() {
            emit(sink, &self.base.name, self.value);
        }
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

// ---------------------------------------------------------------------------
// Button / checkbox

#[derive(Debug)]
pub struct ButtonView {
    base: WidgetBase,
    text: String,
    state: bool,
}

impl ButtonView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            text: String::new(),
            state: false,
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.text = desc.attrs.get_str_or("text", &self.base.name).to_owned();
        self.state = desc.attrs.get_float_or("value", 0.0) == 1.0;
    }
}

impl WidgetView for ButtonView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "button"
    }

    fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) {
        let resp = ui.add_sized(ui.available_size(), egui::Button::new(self.text.as_str()));
        if resp.clicked() {
            self.state = !self.state;
            emit(sink, &self.base.name, self.state as i32 as f32);
        }
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

#[derive(Debug)]
pub struct CheckboxView {
    base: WidgetBase,
    label: String,
    checked: bool,
}

impl CheckboxView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            label: String::new(),
            checked: false,
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.label = desc.attrs.get_str_or("text", &self.base.name).to_owned();
        self.checked = desc.attrs.get_float_or("value", 0.0) == 1.0;
    }

    pub fn checked(&self) -> bool {
        self.checked
    }
}

impl WidgetView for CheckboxView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "checkbox"
    }

    fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) {
        if ui.checkbox(&mut self.checked, self.label.as_str()).changed() {
            emit(sink, &self.base.name, self.checked as i32 as f32);
        }
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

// ---------------------------------------------------------------------------
// Combo box

#[derive(Debug)]
pub struct ComboBoxView {
    base: WidgetBase,
    items: Vec<String>,
    selected: usize,
}

impl ComboBoxView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            items: Vec::new(),
            selected: 0,
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.items = desc
            .attrs
            .get_str_or("items", "")
            .split(',')
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        // Stored value is 1-based, like the host sees it.
        let value = desc.attrs.get_i32_or("value", 1).max(1) as usize;
        self.selected = (value - 1).min(self.items.len().saturating_sub(1));
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn selected(&self) -> usize {
        self.selected
    }
}

impl WidgetView for ComboBoxView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "combobox"
    }

    fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) {
        if self.items.is_empty() {
            return;
        }
        let resp = egui::ComboBox::from_id_salt(self.base.name.as_str())
            .width(ui.available_width())
            .show_index(ui, &mut self.selected, self.items.len(), |i| {
                self.items[i].clone()
            });
        if resp.changed() {
            emit(sink, &self.base.name, (self.selected + 1) as f32);
        }
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

// ---------------------------------------------------------------------------
// Label / image / group box

#[derive(Debug)]
pub struct LabelView {
    base: WidgetBase,
    text: String,
    colour: Color32,
}

impl LabelView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            text: String::new(),
            colour: Color32::from_gray(220),
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.text = desc.attrs.get_str_or("text", "").to_owned();
        self.colour = colour32(&desc.attrs, "fontcolour", Color32::from_gray(220));
    }
}

impl WidgetView for LabelView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "label"
    }

    fn ui(&mut self, ui: &mut Ui, _sink: &mut dyn ParamSink) {
        ui.add(egui::Label::new(
            RichText::new(self.text.as_str()).color(self.colour),
        ));
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

#[derive(Debug)]
pub struct ImageView {
    base: WidgetBase,
    shape: String,
    corners: f32,
    line_thickness: f32,
    outline: Color32,
    colour: Color32,
}

impl ImageView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            shape: String::new(),
            corners: 0.0,
            line_thickness: 0.0,
            outline: Color32::from_gray(120),
            colour: Color32::from_gray(70),
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.shape = desc.attrs.get_str_or("shape", "square").to_owned();
        self.corners = desc.attrs.get_float_or("corners", 0.0);
        self.line_thickness = desc.attrs.get_float_or("linethickness", 0.0);
        self.outline = colour32(&desc.attrs, "outlinecolour", Color32::from_gray(120));
        self.colour = colour32(&desc.attrs, "colour", Color32::from_gray(70));
    }
}

impl WidgetView for ImageView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "image"
    }

    fn ui(&mut self, ui: &mut Ui, _sink: &mut dyn ParamSink) {
        let (rect, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter();
        let inset = rect.shrink(self.line_thickness);
        if self.shape == "square" {
            painter.rect_filled(rect, self.corners, self.outline);
            painter.rect_filled(inset, (self.corners - self.line_thickness).max(0.0), self.colour);
        } else {
            painter.add(epaint::EllipseShape {
                center: rect.center(),
                radius: rect.size() / 2.0,
                fill: self.outline,
                stroke: Stroke::NONE,
            });
            painter.add(epaint::EllipseShape {
                center: rect.center(),
                radius: (inset.size() / 2.0).max(Vec2::ZERO),
                fill: self.colour,
                stroke: Stroke::NONE,
            });
        }
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

#[derive(Debug)]
pub struct GroupBoxView {
    base: WidgetBase,
    title: String,
    colour: Color32,
    font_colour: Color32,
}

impl GroupBoxView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            title: String::new(),
            colour: Color32::from_gray(35),
            font_colour: Color32::from_gray(220),
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.title = desc.attrs.get_str_or("text", "").to_owned();
        self.colour = colour32(&desc.attrs, "colour", Color32::from_gray(35));
        self.font_colour = colour32(&desc.attrs, "fontcolour", Color32::from_gray(220));
    }
}

impl WidgetView for GroupBoxView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "groupbox"
    }

    fn ui(&mut self, ui: &mut Ui, _sink: &mut dyn ParamSink) {
        let (rect, _) = ui.allocate_exact_size(ui.available_size(), Sense::hover());
        let painter = ui.painter();
        painter.rect_filled(rect, 4.0, self.colour);
        painter.rect_stroke(
            rect,
            4.0,
            Stroke::new(1.0, Color32::from_gray(120)),
            StrokeKind::Inside,
        );
        painter.text(
            Pos2::new(rect.center().x, rect.top() + 10.0),
            Align2::CENTER_CENTER,
            &self.title,
            FontId::proportional(13.0),
            self.font_colour,
        );
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

// ---------------------------------------------------------------------------
// Number box

#[derive(Debug)]
pub struct NumberBoxView {
    base: WidgetBase,
    min: f32,
    max: f32,
    value: f32,
    increment: f32,
}

impl NumberBoxView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            min: 0.0,
            max: 1.0,
            value: 0.0,
            increment: 0.01,
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.min = desc.attrs.get_float_or("min", 0.0);
        self.max = desc.attrs.get_float_or("max", 1.0).max(self.min);
        self.value = desc
            .attrs
            .get_float_or("value", self.min)
            .clamp(self.min, self.max);
        self.increment = desc.attrs.get_float_or("increment", 0.01);
    }
}

impl WidgetView for NumberBoxView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "numberbox"
    }

    fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) {
        let drag = egui::DragValue::new(&mut self.value)
            .range(self.min..=self.max)
            .speed(self.increment.max(0.001));
        if ui.add_sized(ui.available_size(), drag).changed() {
            emit(sink, &self.base.name, self.value);
        }
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

// ---------------------------------------------------------------------------
// Keyboard

/// Two octaves of white keys, computer-keyboard style, starting here.
const KEY_BASE_OCTAVE: u8 = 3;
const WHITE_KEYS: usize = 14;

/// Map a horizontal fraction of the keyboard to a MIDI note.
pub(crate) fn white_key_note(base_octave: u8, frac: f32) -> u8 {
    const WHITE_STEPS: [u8; 7] = [0, 2, 4, 5, 7, 9, 11];
    let key = ((frac * WHITE_KEYS as f32) as usize).min(WHITE_KEYS - 1);
    let octave = base_octave as usize + 1 + key / 7;
    (octave * 12 + WHITE_STEPS[key % 7] as usize).min(127) as u8
}

#[derive(Debug)]
pub struct KeyboardView {
    base: WidgetBase,
    held: Option<u8>,
}

impl KeyboardView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        Self {
            base: WidgetBase::new(name, desc),
            held: None,
        }
    }
}

impl WidgetView for KeyboardView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "keyboard"
    }

    fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) {
        let (rect, resp) = ui.allocate_exact_size(ui.available_size(), Sense::drag());

        if let Some(pos) = resp.interact_pointer_pos() {
            let frac = ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0);
            let note = white_key_note(KEY_BASE_OCTAVE, frac);
            if resp.drag_started() {
                sink.begin_gesture(&self.base.name);
                sink.set_value(&self.base.name, note as f32);
                self.held = Some(note);
            } else if resp.dragged() && self.held != Some(note) {
                sink.set_value(&self.base.name, note as f32);
                self.held = Some(note);
            }
        }
        if resp.drag_stopped() {
            sink.end_gesture(&self.base.name);
            self.held = None;
        }

        let painter = ui.painter();
        painter.rect_filled(rect, 0.0, Color32::WHITE);
        let key_w = rect.width() / WHITE_KEYS as f32;
        for i in 1..WHITE_KEYS {
            let x = rect.left() + key_w * i as f32;
            painter.line_segment(
                [Pos2::new(x, rect.top()), Pos2::new(x, rect.bottom())],
                Stroke::new(1.0, Color32::from_gray(100)),
            );
        }
        // Black keys sit on the C-D, D-E, F-G, G-A and A-B boundaries.
        for octave in 0..2 {
            for white in [0, 1, 3, 4, 5] {
                let x = rect.left() + key_w * (octave * 7 + white + 1) as f32;
                let black = Rect::from_center_size(
                    Pos2::new(x, rect.top() + rect.height() * 0.3),
                    Vec2::new(key_w * 0.6, rect.height() * 0.6),
                );
                painter.rect_filled(black, 1.0, Color32::BLACK);
            }
        }
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
    }
}

// ---------------------------------------------------------------------------
// Console

#[derive(Debug)]
pub struct ConsoleView {
    base: WidgetBase,
    text: String,
}

impl ConsoleView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            text: String::new(),
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.text = desc.attrs.get_str_or("text", "").to_owned();
    }
}

impl WidgetView for ConsoleView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "console"
    }

    fn ui(&mut self, ui: &mut Ui, _sink: &mut dyn ParamSink) {
        let rect = ui.max_rect();
        ui.painter().rect_filled(rect, 2.0, Color32::from_gray(12));
        egui::ScrollArea::vertical()
            .auto_shrink([false; 2])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                ui.add(egui::Label::new(
                    RichText::new(self.text.as_str())
                        .monospace()
                        .color(Color32::from_gray(200)),
                ));
            });
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}

// ---------------------------------------------------------------------------
// XY pad

#[derive(Debug)]
pub struct XyPadView {
    base: WidgetBase,
    x: f32,
    y: f32,
    ball: Color32,
}

impl XyPadView {
    pub fn new(name: &str, desc: &WidgetDesc) -> Self {
        let mut view = Self {
            base: WidgetBase::new(name, desc),
            x: 0.5,
            y: 0.5,
            ball: Color32::from_rgb(100, 180, 220),
        };
        view.read(desc);
        view
    }

    fn read(&mut self, desc: &WidgetDesc) {
        self.x = desc.attrs.get_float_or("valuex", 0.5).clamp(0.0, 1.0);
        self.y = desc.attrs.get_float_or("valuey", 0.5).clamp(0.0, 1.0);
        self.ball = colour32(&desc.attrs, "colour", Color32::from_rgb(100, 180, 220));
    }

    pub fn position(&self) -> (f32, f32) {
        (self.x, self.y)
    }
}

impl WidgetView for XyPadView {
    fn base(&self) -> &WidgetBase {
        &self.base
    }
    fn base_mut(&mut self) -> &mut WidgetBase {
        &mut self.base
    }
    fn kind(&self) -> &'static str {
        "xypad"
    }

    fn ui(&mut self, ui: &mut Ui, sink: &mut dyn ParamSink) {
        let (rect, resp) = ui.allocate_exact_size(ui.available_size(), Sense::drag());

        if resp.drag_started() || resp.dragged() {
            if let Some(pos) = resp.interact_pointer_pos() {
                self.x = ((pos.x - rect.left()) / rect.width()).clamp(0.0, 1.0);
                self.y = ((pos.y - rect.top()) / rect.height()).clamp(0.0, 1.0);
                // Two parameters per pad, suffixed like range slider halves.
                for (suffix, value) in [("_x", self.x), ("_y", self.y)] {
                    let param = format!("{}{suffix}", self.base.name);
                    emit(sink, &param, value);
                }
            }
        }

        let painter = ui.painter();
        painter.rect_filled(rect, 2.0, Color32::from_gray(20));
        let ball = Pos2::new(
            rect.left() + rect.width() * self.x,
            rect.top() + rect.height() * self.y,
        );
        let cross = Stroke::new(1.0, Color32::from_gray(70));
        painter.line_segment(
            [Pos2::new(rect.left(), ball.y), Pos2::new(rect.right(), ball.y)],
            cross,
        );
        painter.line_segment(
            [Pos2::new(ball.x, rect.top()), Pos2::new(ball.x, rect.bottom())],
            cross,
        );
        painter.circle_filled(ball, 6.0, self.ball);
    }

    fn sync(&mut self, desc: &WidgetDesc) {
        self.base.sync(desc);
        self.read(desc);
    }
}
