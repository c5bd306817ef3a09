//! App state - the draft, the loaded document and everything the UI shows

use crate::config::AppConfig;
use crate::constants::DEFAULT_ENVIRONMENT;
use crate::events::EventBus;
use crate::messages::render::VariableRow;
use crate::messages::ui_events::{Field, InputMode, OutputView, Panel, SaveField, SettingsField};
use crate::messages::RenderState;
use crate::models::{Exchange, LogEntry, LogLevel, Request};
use crate::storage::{Document, Storage};
use crate::template;
use crate::tree::RequestTree;

/// Log lines kept for the log view
pub const MAX_LOG_ENTRIES: usize = 500;

/// What a change event asks the app to recompute
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    Tree,
    Environments,
}

/// Settings view input buffers
#[derive(Debug, Clone, Default)]
pub struct SettingsForm {
    pub pattern: String,
    pub environment: String,
    pub variable: String,
    pub value: String,
}

/// Save view input buffers
#[derive(Debug, Clone, Default)]
pub struct SaveForm {
    pub project: String,
    pub alias: String,
}

/// Main application state
pub struct AppState {
    // Persistence
    pub storage: Storage,
    pub document: Document,
    pub events: EventBus,

    // Draft request
    pub draft: Request,

    // Tree
    pub tree: RequestTree,

    // Contexts
    pub environments: Vec<String>,
    pub selected_env: String,

    // UI state
    pub active_panel: Panel,
    pub active_view: OutputView,
    pub input_mode: InputMode,
    pub editing: Option<Field>,
    pub cursor_position: usize,

    // Headers panel
    pub selected_header: usize,
    /// Key or value of the header being edited
    pub header_buffer: String,
    /// Key of the header being edited, as it was before editing
    pub header_original_key: Option<String>,

    // Settings and save forms
    pub settings: SettingsForm,
    pub settings_field: SettingsField,
    pub save_form: SaveForm,
    pub save_field: SaveField,

    // Response
    pub exchange: Option<Exchange>,
    pub response_message: String,
    pub response_scroll: u16,
    pub is_loading: bool,
    pub next_request_id: u64,
    pub pending_request_id: Option<u64>,

    // Log
    pub log: Vec<LogEntry>,
    pub log_scroll: u16,

    // Footer and popups
    pub status: String,
    pub show_help: bool,
}

impl AppState {
    pub fn new(config: &AppConfig) -> Self {
        let storage = Storage::new(config.data_file.clone());
        let document = storage.load();
        let tree = RequestTree::build(&document.grouped_by_project(), &document.config.pattern);
        let environments = document.context.list_environments();
        let settings = SettingsForm {
            pattern: document.config.pattern.clone(),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            ..SettingsForm::default()
        };

        AppState {
            storage,
            document,
            events: EventBus::new(),
            draft: Request::default(),
            tree,
            environments,
            selected_env: DEFAULT_ENVIRONMENT.to_string(),
            active_panel: Panel::Tree,
            active_view: OutputView::default(),
            input_mode: InputMode::Normal,
            editing: None,
            cursor_position: 0,
            selected_header: 0,
            header_buffer: String::new(),
            header_original_key: None,
            settings,
            settings_field: SettingsField::Pattern,
            save_form: SaveForm::default(),
            save_field: SaveField::Project,
            exchange: None,
            response_message: String::new(),
            response_scroll: 0,
            is_loading: false,
            next_request_id: 1,
            pending_request_id: None,
            log: Vec::new(),
            log_scroll: 0,
            status: String::new(),
            show_help: false,
        }
    }

    /// Generate a unique request ID
    pub fn next_id(&mut self) -> u64 {
        let id = self.next_request_id;
        self.next_request_id += 1;
        id
    }

    /// Append to the in-app log and mirror it to tracing
    pub fn log(&mut self, level: LogLevel, message: impl Into<String>) {
        let message = message.into();
        match level {
            LogLevel::Error => tracing::error!("{}", message),
            LogLevel::Warn => tracing::warn!("{}", message),
            LogLevel::Info => tracing::info!("{}", message),
            LogLevel::Debug => tracing::debug!("{}", message),
        }
        self.log.push(LogEntry {
            level,
            message,
            timestamp: chrono::Local::now(),
        });
        if self.log.len() > MAX_LOG_ENTRIES {
            let excess = self.log.len() - MAX_LOG_ENTRIES;
            self.log.drain(..excess);
        }
    }

    /// Recompute derived views after a change event
    pub fn refresh(&mut self, what: Refresh) {
        match what {
            Refresh::Tree => {
                self.tree
                    .rebuild(&self.document.grouped_by_project(), &self.document.config.pattern);
            }
            Refresh::Environments => {
                self.environments = self.document.context.list_environments();
                if !self.environments.contains(&self.selected_env) {
                    self.selected_env = DEFAULT_ENVIRONMENT.to_string();
                }
            }
        }
    }

    /// Header key at the headers panel cursor
    pub fn selected_header_key(&self) -> Option<String> {
        self.draft.headers.keys().nth(self.selected_header).cloned()
    }

    /// Get the current input field content
    pub fn current_input(&self) -> &str {
        match self.editing {
            Some(Field::Url) => self.draft.url.as_str(),
            Some(Field::Body) => &self.draft.body,
            Some(Field::HeaderKey) | Some(Field::HeaderValue) => &self.header_buffer,
            Some(Field::Pattern) => &self.settings.pattern,
            Some(Field::Environment) => &self.settings.environment,
            Some(Field::Variable) => &self.settings.variable,
            Some(Field::Value) => &self.settings.value,
            Some(Field::Project) => &self.save_form.project,
            Some(Field::Alias) => &self.save_form.alias,
            None => "",
        }
    }

    /// Get mutable reference to current input field
    pub fn current_input_mut(&mut self) -> Option<&mut String> {
        let input = match self.editing? {
            Field::Url => self.draft.url.as_mut_string(),
            Field::Body => &mut self.draft.body,
            Field::HeaderKey | Field::HeaderValue => &mut self.header_buffer,
            Field::Pattern => &mut self.settings.pattern,
            Field::Environment => &mut self.settings.environment,
            Field::Variable => &mut self.settings.variable,
            Field::Value => &mut self.settings.value,
            Field::Project => &mut self.save_form.project,
            Field::Alias => &mut self.save_form.alias,
        };
        Some(input)
    }

    /// Convert state to RenderState for UI
    pub fn to_render_state(&self) -> RenderState {
        let variables = self
            .document
            .context
            .variables(&self.settings.environment)
            .iter()
            .map(|v| VariableRow {
                variable: v.variable.clone(),
                value: v.value.clone(),
            })
            .collect();

        let preview = (!self.draft.url.is_empty()).then(|| {
            template::resolve(
                &self.draft,
                &self.document.context.all_key_values(&self.selected_env),
            )
        });

        let edit_buffer = match self.editing {
            Some(Field::Url) | Some(Field::Body) | None => String::new(),
            Some(_) => self.current_input().to_string(),
        };

        RenderState {
            tree: self.tree.nodes().to_vec(),
            tree_cursor: self.tree.cursor(),
            draft: self.draft.clone(),
            environment: self.selected_env.clone(),
            preview,
            active_panel: self.active_panel,
            active_view: self.active_view,
            input_mode: self.input_mode,
            editing: self.editing,
            edit_buffer,
            cursor_position: self.cursor_position,
            selected_header: self.selected_header,
            exchange: self.exchange.clone(),
            response_message: self.response_message.clone(),
            response_scroll: self.response_scroll,
            is_loading: self.is_loading,
            log: self.log.clone(),
            log_scroll: self.log_scroll,
            pattern: self.settings.pattern.clone(),
            settings_environment: self.settings.environment.clone(),
            settings_variable: self.settings.variable.clone(),
            settings_value: self.settings.value.clone(),
            settings_field: self.settings_field,
            variables,
            save_project: self.save_form.project.clone(),
            save_alias: self.save_form.alias.clone(),
            save_field: self.save_field,
            data_file: self.storage.path().display().to_string(),
            status: self.status.clone(),
            show_help: self.show_help,
        }
    }
}
