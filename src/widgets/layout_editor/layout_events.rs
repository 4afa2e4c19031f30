//! Hook values reported by layout-edit gestures.

use eframe::egui::Rect;

/// Lifecycle of one bounds edit. `Changed` fires continuously while the
/// pointer moves; `Finished` carries whether the final bounds actually
/// differ from the press snapshot.
#[derive(Clone, Debug, PartialEq)]
pub enum LayoutEvent {
    Started { widget: String, bounds: Rect },
    Changed { widget: String, bounds: Rect },
    Finished { widget: String, bounds: Rect, changed: bool },
}

impl LayoutEvent {
    pub fn widget(&self) -> &str {
        match self {
            LayoutEvent::Started { widget, .. }
            | LayoutEvent::Changed { widget, .. }
            | LayoutEvent::Finished { widget, .. } => widget,
        }
    }

    pub fn bounds(&self) -> Rect {
        match self {
            LayoutEvent::Started { bounds, .. }
            | LayoutEvent::Changed { bounds, .. }
            | LayoutEvent::Finished { bounds, .. } => *bounds,
        }
    }
}
