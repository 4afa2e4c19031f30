use patchlab::cli::Args;
use patchlab::config;
use patchlab::core::event_bus::{downcast_event, EventBus};
use patchlab::entities::{AttrValue, ChannelLayout, InterfaceDesc, NodeId, PatchGraph, PatchNode, WidgetDesc};
use patchlab::widgets::interface::{InterfaceView, ParamSink, WidgetPropertyChangedEvent, WidgetRegistry};
use patchlab::widgets::layout_editor::{LayoutEditor, LayoutEvent};
use patchlab::widgets::patcher::patcher_events::{
    NodeRemovedEvent, ShowNodeInterfaceEvent, ShowNodeSourceEvent,
};
use patchlab::widgets::patcher::PatcherCanvas;

use clap::Parser;
use eframe::egui;
use indexmap::IndexMap;
use log::{debug, error, info};
use std::path::PathBuf;

/// Records parameter gestures from interface widgets. Stands in for the
/// audio host: values are kept for display, gestures go to the log.
#[derive(Default)]
struct ParamLog {
    values: IndexMap<String, f32>,
}

impl ParamSink for ParamLog {
    fn begin_gesture(&mut self, name: &str) {
        debug!("begin gesture '{}'", name);
    }

    fn set_value(&mut self, name: &str, value: f32) {
        debug!("set '{}' = {}", name, value);
        self.values.insert(name.to_owned(), value);
    }

    fn end_gesture(&mut self, name: &str) {
        debug!("end gesture '{}' ({} params tracked)", name, self.values.len());
    }
}

/// Floating plugin-interface window for one node.
struct InterfaceWindow {
    node: NodeId,
    title: String,
    view: InterfaceView,
    editor: LayoutEditor,
    sink: ParamLog,
    open: bool,
    raise: bool,
}

/// Read-only source view for one node.
struct SourceWindow {
    node: NodeId,
    title: String,
    source: String,
    open: bool,
    raise: bool,
}

/// Main application state
#[derive(serde::Deserialize, serde::Serialize)]
#[serde(default)]
struct PatchlabApp {
    #[serde(skip)]
    graph: PatchGraph,
    #[serde(skip)]
    canvas: PatcherCanvas,
    #[serde(skip)]
    event_bus: EventBus,
    #[serde(skip)]
    interface_windows: Vec<InterfaceWindow>,
    #[serde(skip)]
    source_windows: Vec<SourceWindow>,
    #[serde(skip)]
    error_msg: Option<String>,
    #[serde(skip)]
    show_about: bool,
    /// Layout edit mode (persistent)
    edit_mode: bool,
    /// Last save location for quick save (persistent)
    last_save_path: Option<PathBuf>,
}

impl Default for PatchlabApp {
    fn default() -> Self {
        Self {
            graph: PatchGraph::new(),
            canvas: PatcherCanvas::default(),
            event_bus: EventBus::new(),
            interface_windows: Vec::new(),
            source_windows: Vec::new(),
            error_msg: None,
            show_about: false,
            edit_mode: false,
            last_save_path: None,
        }
    }
}

impl PatchlabApp {
    /// Process all events from the event bus
    fn handle_events(&mut self) {
        let events = self.event_bus.poll();
        for event in events {
            if let Some(e) = downcast_event::<ShowNodeInterfaceEvent>(&event) {
                self.open_interface_window(e.node);
                continue;
            }
            if let Some(e) = downcast_event::<ShowNodeSourceEvent>(&event) {
                self.open_source_window(e.node);
                continue;
            }
            if let Some(e) = downcast_event::<NodeRemovedEvent>(&event) {
                self.interface_windows.retain(|w| w.node != e.node);
                self.source_windows.retain(|w| w.node != e.node);
                continue;
            }
            if let Some(e) = downcast_event::<WidgetPropertyChangedEvent>(&event) {
                debug!("widget '{}' on node {} changed: {}", e.widget, e.node, e.key);
                // Refresh any open interface view from its description
                if let Some(node) = self.graph.node(e.node) {
                    if let Some(win) = self
                        .interface_windows
                        .iter_mut()
                        .find(|w| w.node == e.node)
                    {
                        win.view.sync(&node.interface);
                    }
                }
                continue;
            }
        }
    }

    /// Open (or raise) the floating interface window for a node.
    fn open_interface_window(&mut self, node: NodeId) {
        if let Some(win) = self.interface_windows.iter_mut().find(|w| w.node == node) {
            win.open = true;
            win.raise = true;
            return;
        }
        let Some(n) = self.graph.node(node) else {
            return;
        };
        let view = InterfaceView::build(&n.interface, &WidgetRegistry::builtin());
        let title = if view.caption().is_empty() {
            n.name.clone()
        } else {
            view.caption().to_owned()
        };
        let mut editor = LayoutEditor::new();
        editor.set_enabled(self.edit_mode);
        editor.update_frames(&view);
        info!("Opening interface window for '{}'", n.name);
        self.interface_windows.push(InterfaceWindow {
            node,
            title,
            view,
            editor,
            sink: ParamLog::default(),
            open: true,
            raise: true,
        });
    }

    /// Open (or raise) the source view window for a node.
    fn open_source_window(&mut self, node: NodeId) {
        if let Some(win) = self.source_windows.iter_mut().find(|w| w.node == node) {
            win.open = true;
            win.raise = true;
            return;
        }
        let Some(n) = self.graph.node(node) else {
            return;
        };
        info!("Opening source window for '{}'", n.name);
        self.source_windows.push(SourceWindow {
            node,
            title: format!("{} - source", n.name),
            source: n.source_text.clone(),
            open: true,
            raise: true,
        });
    }

    /// Flip layout edit mode for every open interface window.
    fn set_edit_mode(&mut self, on: bool) {
        if self.edit_mode == on {
            return;
        }
        self.edit_mode = on;
        info!("Layout edit mode {}", if on { "on" } else { "off" });
        for win in &mut self.interface_windows {
            win.editor.set_enabled(on);
            if on {
                win.editor.update_frames(&win.view);
            }
        }
    }

    fn add_node(&mut self, proto: &str) {
        let count = self.graph.node_count();
        let position = [
            0.2 + 0.12 * ((count % 6) as f32),
            0.2 + 0.15 * (((count / 6) % 5) as f32),
        ];
        let id = self.graph.add_node(make_node(proto).with_position(position));
        info!("Added '{}' node {}", proto, id);
    }

    /// Save patch to JSON file
    fn save_patch(&mut self, path: PathBuf) {
        if let Err(e) = self.graph.to_json(&path) {
            error!("Failed to save patch: {:#}", e);
            self.error_msg = Some(format!("Save failed: {e}"));
        } else {
            info!("Saved patch to {}", path.display());
            self.last_save_path = Some(path);
            self.graph.take_changed();
            self.error_msg = None;
        }
    }

    /// Quick save - saves to last path or shows dialog
    fn quick_save(&mut self) {
        if let Some(path) = self.last_save_path.clone() {
            self.save_patch(path);
        } else {
            self.save_patch_dialog();
        }
    }

    fn save_patch_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Patch", &["json"])
            .set_file_name("patch.json")
            .save_file()
        {
            self.save_patch(path);
        }
    }

    fn open_patch_dialog(&mut self) {
        if let Some(path) = rfd::FileDialog::new()
            .add_filter("Patch", &["json"])
            .pick_file()
        {
            self.load_patch(path);
        }
    }

    /// Load patch from JSON file
    fn load_patch(&mut self, path: PathBuf) {
        match PatchGraph::from_json(&path) {
            Ok(graph) => {
                info!("Loaded patch from {}", path.display());
                self.graph = graph;
                // Stale views drop on the next reconcile pass; windows now
                self.interface_windows.clear();
                self.source_windows.clear();
                self.last_save_path = Some(path);
                self.error_msg = None;
            }
            Err(e) => {
                error!("Failed to load patch: {:#}", e);
                self.error_msg = Some(format!("Load failed: {e}"));
            }
        }
    }

    fn render_menu(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_strip").show(ctx, |ui| {
            egui::MenuBar::new().ui(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Open patch...").clicked() {
                        self.open_patch_dialog();
                    }
                    if ui.button("Save patch").clicked() {
                        self.quick_save();
                    }
                    if ui.button("Save patch as...").clicked() {
                        self.save_patch_dialog();
                    }
                    ui.separator();
                    if ui.button("Quit").clicked() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::Close);
                    }
                });
                ui.menu_button("Patch", |ui| {
                    for proto in NODE_PROTOTYPES {
                        if ui.button(format!("Add {proto}")).clicked() {
                            self.add_node(proto);
                        }
                    }
                });
                ui.menu_button("View", |ui| {
                    let mut edit = self.edit_mode;
                    if ui.checkbox(&mut edit, "Edit interface layouts").changed() {
                        self.set_edit_mode(edit);
                    }
                });
                ui.menu_button("Help", |ui| {
                    if ui.button("About").clicked() {
                        self.show_about = true;
                    }
                });
            });
        });
    }

    fn render_status(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::bottom("status_strip").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(format!("{} nodes", self.graph.node_count()));
                ui.separator();
                ui.label(format!("{} connections", self.graph.connection_count()));
                if self.graph.is_changed() {
                    ui.separator();
                    ui.label("modified");
                }
                if self.edit_mode {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(255, 200, 80), "EDIT");
                }
                if let Some(err) = &self.error_msg {
                    ui.separator();
                    ui.colored_label(egui::Color32::from_rgb(220, 80, 80), err);
                }
            });
        });
    }

    fn render_interface_windows(&mut self, ctx: &egui::Context) {
        // Geometry write-backs collected during layout, applied after
        let mut edits: Vec<(NodeId, String, egui::Rect)> = Vec::new();

        for win in &mut self.interface_windows {
            let mut open = win.open;
            let response = egui::Window::new(win.title.as_str())
                .id(egui::Id::new(("interface", win.node)))
                .resizable(false)
                .open(&mut open)
                .show(ctx, |ui| {
                    ui.set_min_size(win.view.size());
                    if win.editor.is_enabled() {
                        win.editor.update_frames(&win.view);
                    }
                    let surface = win.view.ui(ui, &mut win.sink);
                    for event in win.editor.show(ui, surface) {
                        match event {
                            LayoutEvent::Started { .. } => {}
                            LayoutEvent::Changed { widget, bounds } => {
                                // Widget follows the alias live
                                if let Some(child) = win.view.child_mut(&widget) {
                                    child.set_bounds(bounds);
                                }
                            }
                            LayoutEvent::Finished {
                                widget,
                                bounds,
                                changed,
                            } => {
                                if changed {
                                    if let Some(child) = win.view.child_mut(&widget) {
                                        child.set_bounds(bounds);
                                    }
                                    edits.push((win.node, widget, bounds));
                                }
                            }
                        }
                    }
                });
            win.open = open;
            if win.raise {
                if let Some(inner) = &response {
                    ctx.move_to_top(inner.response.layer_id);
                }
                win.raise = false;
            }
        }
        self.interface_windows.retain(|w| w.open);

        for (node, widget, bounds) in edits {
            if let Some(n) = self.graph.node_mut(node) {
                if let Some(desc) = n.interface.get_mut(&widget) {
                    desc.set_bounds([bounds.min.x, bounds.min.y, bounds.width(), bounds.height()]);
                }
            }
            self.graph.set_changed();
            self.event_bus.emit(WidgetPropertyChangedEvent {
                node,
                widget,
                key: "bounds".to_owned(),
            });
        }
    }

    fn render_source_windows(&mut self, ctx: &egui::Context) {
        for win in &mut self.source_windows {
            let mut open = win.open;
            let response = egui::Window::new(win.title.as_str())
                .id(egui::Id::new(("source", win.node)))
                .default_size(egui::vec2(520.0, 420.0))
                .vscroll(true)
                .open(&mut open)
                .show(ctx, |ui| {
                    let theme =
                        egui_extras::syntax_highlighting::CodeTheme::from_style(ui.style());
                    egui_extras::syntax_highlighting::code_view_ui(ui, &theme, &win.source, "csd");
                });
            win.open = open;
            if win.raise {
                if let Some(inner) = &response {
                    ctx.move_to_top(inner.response.layer_id);
                }
                win.raise = false;
            }
        }
        self.source_windows.retain(|w| w.open);
    }

    fn render_about(&mut self, ctx: &egui::Context) {
        if !self.show_about {
            return;
        }
        let mut open = self.show_about;
        egui::Window::new("About Patchlab")
            .collapsible(false)
            .resizable(false)
            .open(&mut open)
            .show(ctx, |ui| {
                ui.label(format!("Patchlab v{}", env!("CARGO_PKG_VERSION")));
                ui.label("Graphical editor for audio plugin graphs.");
                ui.separator();
                ui.label("Drag between pins to connect nodes.");
                ui.label("Drag a connector near an end to re-route it.");
                ui.label("Double-click a node for its plugin interface.");
            });
        self.show_about = open;
    }
}

impl eframe::App for PatchlabApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // Process all events from the event bus
        self.handle_events();

        self.render_menu(ctx);
        self.render_status(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            let emitter = self.event_bus.emitter();
            self.canvas.show(ui, &mut self.graph, &emitter);
        });

        self.render_interface_windows(ctx);
        self.render_source_windows(ctx);
        self.render_about(ctx);
    }

    fn save(&mut self, storage: &mut dyn eframe::Storage) {
        match serde_json::to_string(self) {
            Ok(json) => storage.set_string(eframe::APP_KEY, json),
            Err(e) => error!("Failed to serialize app state: {}", e),
        }
    }
}

/// Built-in node prototypes offered by the Patch menu.
const NODE_PROTOTYPES: &[&str] = &["Oscillator", "Filter", "Mixer", "Monitor"];

fn make_node(proto: &str) -> PatchNode {
    match proto {
        "Filter" => filter_node(),
        "Mixer" => mixer_node(),
        "Monitor" => monitor_node(),
        _ => oscillator_node(),
    }
}

fn oscillator_node() -> PatchNode {
    let mut iface = InterfaceDesc::with_form("Oscillator", 380.0, 260.0);

    let mut freq = WidgetDesc::new("rslider")
        .with("text", AttrValue::Str("freq".into()))
        .with("min", AttrValue::Float(20.0))
        .with("max", AttrValue::Float(8000.0))
        .with("value", AttrValue::Float(440.0));
    freq.set_bounds([20.0, 16.0, 90.0, 90.0]);
    iface.insert("freq", freq);

    let mut gain = WidgetDesc::new("rslider")
        .with("text", AttrValue::Str("gain".into()))
        .with("value", AttrValue::Float(0.5));
    gain.set_bounds([130.0, 16.0, 90.0, 90.0]);
    iface.insert("gain", gain);

    let mut wave = WidgetDesc::new("combobox")
        .with("items", AttrValue::Str("sine,saw,square,triangle".into()))
        .with("value", AttrValue::Int(1));
    wave.set_bounds([240.0, 40.0, 120.0, 24.0]);
    iface.insert("wave", wave);

    let mut keys = WidgetDesc::new("keyboard");
    keys.set_bounds([20.0, 130.0, 340.0, 110.0]);
    iface.insert("keys", keys);

    PatchNode::new("Oscillator", ChannelLayout::new(vec![]), ChannelLayout::stereo())
        .with_midi(true, false)
        .with_interface(iface)
        .with_source(OSCILLATOR_SOURCE)
}

fn filter_node() -> PatchNode {
    let mut iface = InterfaceDesc::with_form("Filter", 340.0, 220.0);

    let mut cutoff = WidgetDesc::new("hslider")
        .with("text", AttrValue::Str("cutoff".into()))
        .with("min", AttrValue::Float(20.0))
        .with("max", AttrValue::Float(20000.0))
        .with("value", AttrValue::Float(1200.0));
    cutoff.set_bounds([20.0, 20.0, 300.0, 24.0]);
    iface.insert("cutoff", cutoff);

    let mut res = WidgetDesc::new("hslider")
        .with("text", AttrValue::Str("resonance".into()))
        .with("value", AttrValue::Float(0.2));
    res.set_bounds([20.0, 54.0, 300.0, 24.0]);
    iface.insert("resonance", res);

    let mut morph = WidgetDesc::new("xypad")
        .with("valuex", AttrValue::Float(0.5))
        .with("valuey", AttrValue::Float(0.5));
    morph.set_bounds([20.0, 90.0, 120.0, 110.0]);
    iface.insert("morph", morph);

    let mut bypass = WidgetDesc::new("checkbox").with("text", AttrValue::Str("bypass".into()));
    bypass.set_bounds([160.0, 96.0, 120.0, 22.0]);
    iface.insert("bypass", bypass);

    PatchNode::new("Filter", ChannelLayout::stereo(), ChannelLayout::stereo())
        .with_interface(iface)
        .with_source(FILTER_SOURCE)
}

fn mixer_node() -> PatchNode {
    let mut iface = InterfaceDesc::with_form("Mixer", 320.0, 240.0);

    let mut frame = WidgetDesc::new("groupbox").with("text", AttrValue::Str("levels".into()));
    frame.set_bounds([12.0, 12.0, 200.0, 216.0]);
    iface.insert("frame", frame);

    let mut lev1 = WidgetDesc::new("vslider")
        .with("text", AttrValue::Str("bus 1".into()))
        .with("value", AttrValue::Float(0.8));
    lev1.set_bounds([30.0, 40.0, 60.0, 170.0]);
    iface.insert("lev1", lev1);

    let mut lev2 = WidgetDesc::new("vslider")
        .with("text", AttrValue::Str("bus 2".into()))
        .with("value", AttrValue::Float(0.8));
    lev2.set_bounds([110.0, 40.0, 60.0, 170.0]);
    iface.insert("lev2", lev2);

    let mut trim = WidgetDesc::new("numberbox")
        .with("min", AttrValue::Float(-24.0))
        .with("max", AttrValue::Float(24.0))
        .with("value", AttrValue::Float(0.0))
        .with("increment", AttrValue::Float(0.5));
    trim.set_bounds([230.0, 40.0, 70.0, 24.0]);
    iface.insert("trim", trim);

    let mut mute = WidgetDesc::new("button").with("text", AttrValue::Str("mute".into()));
    mute.set_bounds([230.0, 80.0, 70.0, 28.0]);
    iface.insert("mute", mute);

    PatchNode::new(
        "Mixer",
        ChannelLayout::new(vec![2, 2]),
        ChannelLayout::stereo(),
    )
    .with_interface(iface)
    .with_source(MIXER_SOURCE)
}

fn monitor_node() -> PatchNode {
    let mut iface = InterfaceDesc::with_form("Monitor", 420.0, 260.0);

    let mut level = WidgetDesc::new("label")
        .with("text", AttrValue::Str("input monitor".into()));
    level.set_bounds([20.0, 14.0, 380.0, 20.0]);
    iface.insert("heading", level);

    let mut scope = WidgetDesc::new("image")
        .with("shape", AttrValue::Str("square".into()))
        .with("corners", AttrValue::Float(4.0))
        .with("linethickness", AttrValue::Float(2.0))
        .with("colour", AttrValue::Colour([20, 30, 20, 255]))
        .with("outlinecolour", AttrValue::Colour([90, 160, 90, 255]));
    scope.set_bounds([20.0, 44.0, 380.0, 80.0]);
    iface.insert("scope", scope);

    let mut log = WidgetDesc::new("console");
    log.set_bounds([20.0, 136.0, 380.0, 108.0]);
    iface.insert("log", log);

    PatchNode::new("Monitor", ChannelLayout::stereo(), ChannelLayout::new(vec![]))
        .with_midi(true, false)
        .with_interface(iface)
        .with_source(MONITOR_SOURCE)
}

const OSCILLATOR_SOURCE: &str = r#"instr Oscillator
  kfreq chnget "freq"
  kgain chnget "gain"
  kwave chnget "wave"
  aout  vco2 kgain, kfreq, int(kwave) - 1
  outs  aout, aout
endin
"#;

const FILTER_SOURCE: &str = r#"instr Filter
  kcut  chnget "cutoff"
  kres  chnget "resonance"
  kbyp  chnget "bypass"
  aL, aR ins
  if kbyp == 0 then
    aL moogladder aL, kcut, kres
    aR moogladder aR, kcut, kres
  endif
  outs aL, aR
endin
"#;

const MIXER_SOURCE: &str = r#"instr Mixer
  k1 chnget "lev1"
  k2 chnget "lev2"
  ktrim chnget "trim"
  a1L, a1R, a2L, a2R ins
  kamp = ampdbfs(ktrim)
  outs (a1L*k1 + a2L*k2) * kamp, (a1R*k1 + a2R*k2) * kamp
endin
"#;

const MONITOR_SOURCE: &str = r#"instr Monitor
  aL, aR ins
  krms rms aL + aR
  printks "rms: %f\n", 0.25, krms
endin
"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse command-line arguments first (needed for log setup)
    let args = Args::parse();

    // Create path configuration from CLI args and environment
    let path_config = config::PathConfig::from_env_and_cli(args.config_dir.clone());

    // Ensure directories exist
    if let Err(e) = config::ensure_dirs(&path_config) {
        eprintln!("Warning: Failed to create application directories: {}", e);
    }

    // Determine log level based on verbosity flags
    // 0 (default) = warn, 1 (-v) = info, 2 (-vv) = debug, 3+ (-vvv) = trace
    let log_level = match args.verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    // Initialize logger based on --log flag
    if let Some(log_path_opt) = &args.log_file {
        // File logging with specified verbosity level
        let log_path = log_path_opt
            .as_ref()
            .cloned()
            .unwrap_or_else(|| config::data_file("patchlab.log", &path_config));

        let file = std::fs::File::create(&log_path).expect("Failed to create log file");

        env_logger::Builder::new()
            .filter_level(log_level)
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .format_timestamp_millis()
            .target(env_logger::Target::Pipe(Box::new(file)))
            .init();

        info!(
            "Logging to file: {} (level: {:?})",
            log_path.display(),
            log_level
        );
    } else {
        // Console logging with specified verbosity level (respects RUST_LOG if set)
        let default_level = match args.verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };

        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
            .filter_module("egui", log::LevelFilter::Info) // Suppress egui DEBUG spam
            .format_timestamp_millis()
            .init();
    }

    info!("Patchlab starting...");
    debug!("Command-line args: {:?}", args);
    info!(
        "Config path: {}",
        config::config_file("patchlab.json", &path_config).display()
    );

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!("Patchlab v{}", env!("CARGO_PKG_VERSION")))
            .with_inner_size(egui::vec2(1280.0, 800.0))
            .with_resizable(true),
        persist_window: true,
        #[cfg(not(target_arch = "wasm32"))]
        persistence_path: Some(config::config_file("patchlab.json", &path_config)),
        ..Default::default()
    };

    eframe::run_native(
        "Patchlab",
        native_options,
        Box::new(move |cc| {
            // Load persisted app state if available, otherwise create default
            let mut app: PatchlabApp = cc
                .storage
                .and_then(|storage| storage.get_string(eframe::APP_KEY))
                .and_then(|json| serde_json::from_str(&json).ok())
                .unwrap_or_else(|| {
                    info!("No persisted state found, creating default app");
                    PatchlabApp::default()
                });

            if args.edit_mode {
                app.edit_mode = true;
            }
            if let Some(path) = args.patch_path.clone() {
                app.load_patch(path);
            }

            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
