//! Render state - data structure sent from App layer to UI for rendering

use crate::messages::ui_events::{Field, InputMode, OutputView, Panel, SaveField, SettingsField};
use crate::models::{Exchange, LogEntry, Request, ResolvedRequest};
use crate::tree::TreeNode;

/// One row of the settings view's variable table
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRow {
    pub variable: String,
    pub value: String,
}

/// Complete state needed by the UI to render
#[derive(Debug, Clone, Default)]
pub struct RenderState {
    // Tree
    pub tree: Vec<TreeNode>,
    pub tree_cursor: Option<usize>,

    // Draft request
    pub draft: Request,
    pub environment: String,
    pub preview: Option<ResolvedRequest>,

    // UI state
    pub active_panel: Panel,
    pub active_view: OutputView,
    pub input_mode: InputMode,
    pub editing: Option<Field>,
    /// Text of the field being edited, when it is a buffer rather than the draft
    pub edit_buffer: String,
    pub cursor_position: usize,

    // Headers panel
    pub selected_header: usize,

    // Response
    pub exchange: Option<Exchange>,
    pub response_message: String,
    pub response_scroll: u16,
    pub is_loading: bool,

    // Log
    pub log: Vec<LogEntry>,
    pub log_scroll: u16,

    // Settings view
    pub pattern: String,
    pub settings_environment: String,
    pub settings_variable: String,
    pub settings_value: String,
    pub settings_field: SettingsField,
    pub variables: Vec<VariableRow>,

    // Save view
    pub save_project: String,
    pub save_alias: String,
    pub save_field: SaveField,

    // Footer
    pub data_file: String,
    pub status: String,

    // Popups
    pub show_help: bool,
}
