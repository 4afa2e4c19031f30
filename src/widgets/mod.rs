//! UI widgets - modular, reusable UI components
//!
//! Each widget is self-contained and communicates via EventBus

pub mod interface;
pub mod layout_editor;
pub mod patcher;
