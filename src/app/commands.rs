//! Command handlers - business logic for processing UI events

use crate::app::AppState;
use crate::constants::{CONTENT_TYPES, DEFAULT_ENVIRONMENT};
use crate::messages::ui_events::{Field, InputMode, OutputView, Panel};
use crate::messages::{NetworkCommand, NetworkResponse};
use crate::models::{LogLevel, Request};
use crate::template;

const NEW_HEADER_KEY: &str = "X-Header";

/// `host` and `{host}` both name the `{host}` variable
fn variable_token(name: &str) -> String {
    let name = name.trim();
    if name.is_empty() || template::is_placeholder(name) {
        name.to_string()
    } else {
        format!("{{{}}}", name)
    }
}

impl AppState {
    // ========================
    // Navigation
    // ========================

    pub fn next_panel(&mut self) {
        self.active_panel = self.active_panel.next();
    }

    pub fn prev_panel(&mut self) {
        self.active_panel = self.active_panel.prev();
    }

    pub fn show_view(&mut self, view: OutputView) {
        self.active_view = view;
        if matches!(view, OutputView::Settings | OutputView::Save) {
            self.active_panel = Panel::Output;
        }
    }

    pub fn scroll_up(&mut self) {
        match self.active_view {
            OutputView::Log => self.log_scroll = self.log_scroll.saturating_sub(1),
            _ => self.response_scroll = self.response_scroll.saturating_sub(1),
        }
    }

    pub fn scroll_down(&mut self) {
        match self.active_view {
            OutputView::Log => self.log_scroll = self.log_scroll.saturating_add(1),
            _ => self.response_scroll = self.response_scroll.saturating_add(1),
        }
    }

    // ========================
    // Tree
    // ========================

    pub fn tree_next(&mut self) {
        if self.tree.next().is_some() {
            self.load_selected();
        }
    }

    pub fn tree_prev(&mut self) {
        if self.tree.previous().is_some() {
            self.load_selected();
        }
    }

    /// Copy the selected stored request into the draft
    fn load_selected(&mut self) {
        let Some(request) = self.tree.resolve(&self.document).cloned() else {
            self.status = "Request no longer stored".to_string();
            return;
        };
        self.status = request.key().to_string();
        self.replace_draft(request);
        self.active_view = OutputView::Preview;
    }

    fn replace_draft(&mut self, request: Request) {
        self.draft = request;
        self.selected_header = 0;
        self.response_scroll = 0;
        self.events.request_changed.publish(&self.draft);
    }

    // ========================
    // Input editing
    // ========================

    pub fn start_editing(&mut self) {
        let field = match self.active_panel {
            Panel::Url => Field::Url,
            Panel::Body => Field::Body,
            Panel::Headers => {
                let Some(key) = self.selected_header_key() else {
                    return;
                };
                self.header_buffer = key.clone();
                self.header_original_key = Some(key);
                Field::HeaderKey
            }
            Panel::Output => match self.active_view {
                OutputView::Settings => self.settings_field.field(),
                OutputView::Save => self.save_field.field(),
                _ => return,
            },
            Panel::Tree => return,
        };
        self.begin(field);
    }

    pub fn edit_header_value(&mut self) {
        let Some(key) = self.selected_header_key() else {
            return;
        };
        self.header_buffer = self.draft.headers.get(&key).cloned().unwrap_or_default();
        self.header_original_key = Some(key);
        self.begin(Field::HeaderValue);
    }

    fn begin(&mut self, field: Field) {
        self.editing = Some(field);
        self.input_mode = InputMode::Editing;
        self.cursor_position = self.current_input().len();
    }

    pub fn stop_editing(&mut self) {
        match self.editing {
            Some(Field::HeaderKey) => self.commit_header_key(),
            Some(Field::HeaderValue) => self.commit_header_value(),
            _ => {}
        }
        self.editing = None;
        self.input_mode = InputMode::Normal;
    }

    fn commit_header_key(&mut self) {
        let Some(original) = self.header_original_key.take() else {
            return;
        };
        let value = self.draft.headers.remove(&original).unwrap_or_default();
        let key = self.header_buffer.trim().to_string();
        if key.is_empty() {
            self.clamp_selected_header();
            return;
        }
        self.draft.headers.insert(key.clone(), value);
        self.select_header(&key);
    }

    fn commit_header_value(&mut self) {
        if let Some(key) = self.header_original_key.take() {
            self.draft.headers.insert(key, self.header_buffer.clone());
        }
    }

    pub fn move_cursor_left(&mut self) {
        let input = self.current_input();
        if self.cursor_position > 0 {
            let new_pos = input[..self.cursor_position]
                .char_indices()
                .last()
                .map(|(i, _)| i)
                .unwrap_or(0);
            self.cursor_position = new_pos;
        }
    }

    pub fn move_cursor_right(&mut self) {
        let input = self.current_input();
        if self.cursor_position < input.len() {
            let new_pos = input[self.cursor_position..]
                .char_indices()
                .nth(1)
                .map(|(i, _)| self.cursor_position + i)
                .unwrap_or(input.len());
            self.cursor_position = new_pos;
        }
    }

    pub fn enter_char(&mut self, c: char) {
        let cursor_pos = self.cursor_position;
        let Some(input) = self.current_input_mut() else {
            return;
        };
        if cursor_pos <= input.len() {
            input.insert(cursor_pos, c);
            self.cursor_position = cursor_pos + c.len_utf8();
        }
    }

    pub fn delete_char(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        let cursor_pos = self.cursor_position;
        let Some(input) = self.current_input_mut() else {
            return;
        };
        let prev_pos = input[..cursor_pos]
            .char_indices()
            .last()
            .map(|(i, _)| i)
            .unwrap_or(0);
        input.remove(prev_pos);
        self.cursor_position = prev_pos;
    }

    // ========================
    // Draft request
    // ========================

    pub fn cycle_method(&mut self) {
        if !self.is_loading {
            self.draft.method = self.draft.method.next();
        }
    }

    pub fn cycle_content_type(&mut self) {
        let next = CONTENT_TYPES
            .iter()
            .position(|ct| *ct == self.draft.content_type)
            .map(|i| CONTENT_TYPES[(i + 1) % CONTENT_TYPES.len()])
            .unwrap_or(CONTENT_TYPES[0]);
        self.draft.content_type = next.to_string();
    }

    pub fn cycle_context(&mut self) {
        if self.environments.is_empty() {
            return;
        }
        let next = self
            .environments
            .iter()
            .position(|env| *env == self.selected_env)
            .map(|i| (i + 1) % self.environments.len())
            .unwrap_or(0);
        self.selected_env = self.environments[next].clone();
        self.status = format!("Context: {}", self.selected_env);
    }

    pub fn new_request(&mut self) {
        self.stop_editing();
        self.replace_draft(Request::default());
        self.exchange = None;
        self.response_message.clear();
        self.active_panel = Panel::Url;
        self.status = "New request".to_string();
    }

    // ========================
    // Headers
    // ========================

    pub fn next_header(&mut self) {
        if !self.draft.headers.is_empty() {
            self.selected_header = (self.selected_header + 1) % self.draft.headers.len();
        }
    }

    pub fn prev_header(&mut self) {
        if !self.draft.headers.is_empty() {
            self.selected_header = self
                .selected_header
                .checked_sub(1)
                .unwrap_or(self.draft.headers.len() - 1);
        }
    }

    /// Add an empty header and start editing its name
    pub fn add_header(&mut self) {
        let mut key = NEW_HEADER_KEY.to_string();
        let mut n = 1;
        while self.draft.headers.contains_key(&key) {
            n += 1;
            key = format!("{}-{}", NEW_HEADER_KEY, n);
        }
        self.draft.headers.insert(key.clone(), String::new());
        self.select_header(&key);
        self.active_panel = Panel::Headers;
        self.start_editing();
    }

    pub fn delete_header(&mut self) {
        if let Some(key) = self.selected_header_key() {
            self.draft.headers.remove(&key);
            self.clamp_selected_header();
        }
    }

    fn select_header(&mut self, key: &str) {
        if let Some(i) = self.draft.headers.keys().position(|k| k == key) {
            self.selected_header = i;
        }
    }

    fn clamp_selected_header(&mut self) {
        self.selected_header = self
            .selected_header
            .min(self.draft.headers.len().saturating_sub(1));
    }

    // ========================
    // Settings and save forms
    // ========================

    pub fn next_field(&mut self) {
        match self.active_view {
            OutputView::Settings => self.settings_field = self.settings_field.next(),
            OutputView::Save => self.save_field = self.save_field.toggle(),
            _ => {}
        }
    }

    pub fn prev_field(&mut self) {
        match self.active_view {
            OutputView::Settings => self.settings_field = self.settings_field.prev(),
            OutputView::Save => self.save_field = self.save_field.toggle(),
            _ => {}
        }
    }

    fn settings_environment(&self) -> String {
        let env = self.settings.environment.trim();
        if env.is_empty() {
            DEFAULT_ENVIRONMENT.to_string()
        } else {
            env.to_lowercase()
        }
    }

    pub fn add_variable(&mut self) {
        self.stop_editing();
        let env = self.settings_environment();
        let variable = variable_token(&self.settings.variable);
        if variable.is_empty() {
            self.log(LogLevel::Warn, "A variable name is required.");
            return;
        }
        let value = self.settings.value.clone();

        let result = self.storage.update(|doc| doc.context.add(&env, &variable, &value));
        match result {
            Ok(document) => {
                self.document = document;
                self.settings.environment = env.clone();
                self.settings.variable.clear();
                self.settings.value.clear();
                self.log(LogLevel::Info, format!("Variable {} set in '{}'.", variable, env));
                self.events.context_changed.publish(&self.document.context);
            }
            Err(e) => self.log(LogLevel::Error, format!("Impossible to save the context: {}", e)),
        }
    }

    pub fn remove_variable(&mut self) {
        self.stop_editing();
        let env = self.settings_environment();
        let variable = variable_token(&self.settings.variable);
        if self.document.context.find(&env, &variable).is_none() {
            self.log(
                LogLevel::Warn,
                format!("'{}' has no variable {}.", env, variable),
            );
            return;
        }

        let result = self.storage.update(|doc| doc.context.remove(&env, &variable));
        match result {
            Ok(document) => {
                self.document = document;
                self.settings.variable.clear();
                self.settings.value.clear();
                self.log(LogLevel::Info, format!("Variable {} removed from '{}'.", variable, env));
                self.events.context_changed.publish(&self.document.context);
            }
            Err(e) => self.log(LogLevel::Error, format!("Impossible to save the context: {}", e)),
        }
    }

    pub fn apply_pattern(&mut self) {
        self.stop_editing();
        let pattern = self.settings.pattern.clone();

        let result = self.storage.update(|doc| doc.config.pattern = pattern);
        match result {
            Ok(document) => {
                self.document = document;
                self.log(LogLevel::Info, "Tree pattern updated.");
                self.events.config_changed.publish(&self.document.config);
            }
            Err(e) => self.log(LogLevel::Error, format!("Impossible to save the config: {}", e)),
        }
    }

    // ========================
    // Store
    // ========================

    pub fn open_save(&mut self) {
        self.stop_editing();
        self.save_form.project = self.draft.project_name.clone();
        self.save_form.alias = self.draft.alias.clone();
        self.save_field = Default::default();
        self.show_view(OutputView::Save);
    }

    /// Upsert the draft under the save form's project and alias
    pub fn save_request(&mut self) {
        self.stop_editing();
        if self.draft.url.is_empty() {
            self.log(LogLevel::Warn, "Nothing to save: the URL is empty.");
            return;
        }
        self.draft.project_name = self.save_form.project.trim().to_string();
        self.draft.alias = self.save_form.alias.trim().to_string();

        let request = self.draft.clone();
        let result = self.storage.update(|doc| doc.upsert(request));
        match result {
            Ok(document) => {
                self.document = document;
                self.status = format!("Saved {}", self.draft.key());
                self.log(LogLevel::Info, format!("Request {} saved.", self.draft.key()));
                self.events.request_changed.publish(&self.draft);
                self.show_view(OutputView::Preview);
            }
            Err(e) => self.log(LogLevel::Error, format!("Impossible to save the request: {}", e)),
        }
    }

    /// Remove the draft's (method, url) from the store. The draft itself is kept.
    pub fn delete_request(&mut self) {
        self.stop_editing();
        let key = self.draft.key();
        let missing = self
            .document
            .find(key.method.as_str(), key.url.as_str())
            .err();
        if let Some(e) = missing {
            self.log(LogLevel::Warn, e.to_string());
            return;
        }

        let request = self.draft.clone();
        let result = self.storage.update(|doc| doc.remove(&request));
        match result {
            Ok(document) => {
                self.document = document;
                self.status = format!("Deleted {}", key);
                self.log(LogLevel::Info, format!("Request {} deleted.", key));
                self.events.request_changed.publish(&self.draft);
            }
            Err(e) => self.log(LogLevel::Error, format!("Impossible to delete the request: {}", e)),
        }
    }

    // ========================
    // Popups
    // ========================

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn close_help(&mut self) {
        self.show_help = false;
    }

    // ========================
    // Request execution
    // ========================

    /// Resolve the draft against the selected context and hand it to the network layer
    pub fn execute(&mut self) -> Option<NetworkCommand> {
        if self.input_mode == InputMode::Editing {
            self.stop_editing();
        }
        if self.is_loading {
            return None;
        }
        if self.draft.url.is_empty() {
            self.log(LogLevel::Warn, "Nothing to execute: the URL is empty.");
            return None;
        }

        let context = self.document.context.all_key_values(&self.selected_env);
        let resolved = template::resolve(&self.draft, &context);

        let id = self.next_id();
        self.pending_request_id = Some(id);
        self.is_loading = true;
        self.exchange = None;
        self.response_message = String::from("Loading...");
        self.response_scroll = 0;
        self.active_view = OutputView::Response;

        self.log(LogLevel::Info, format!("[{}] {}", id, self.draft.to_log(&resolved.url)));
        let unresolved = template::placeholders(resolved.url.as_str());
        if !unresolved.is_empty() {
            self.log(
                LogLevel::Debug,
                format!("[{}] unresolved placeholders: {}", id, unresolved.join(", ")),
            );
        }

        Some(NetworkCommand::Execute {
            id,
            request: resolved,
        })
    }

    pub fn handle_response(&mut self, response: NetworkResponse) {
        let is_for_pending = self.pending_request_id == Some(response.id());

        match response {
            NetworkResponse::Completed { id, exchange } => {
                if is_for_pending {
                    self.log(
                        LogLevel::Info,
                        format!("[{}] {} ({} ms)", id, exchange.status, exchange.time_ms),
                    );
                    self.response_message.clear();
                    self.exchange = Some(exchange);
                    self.finalize_request();
                }
            }
            NetworkResponse::Failed { id, message, time_ms } => {
                if is_for_pending {
                    self.log(LogLevel::Error, format!("[{}] {}", id, message));
                    self.response_message = format!("{}\n\nafter {} ms", message, time_ms);
                    self.exchange = None;
                    self.finalize_request();
                }
            }
            NetworkResponse::Log { id, level, message } => {
                self.log(level, format!("[{}] {}", id, message));
            }
        }
    }

    fn finalize_request(&mut self) {
        self.is_loading = false;
        self.pending_request_id = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::Refresh;
    use crate::config::AppConfig;
    use crate::models::Exchange;
    use crate::storage::Storage;
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    fn state(dir: &TempDir) -> AppState {
        let config = AppConfig {
            data_file: dir.path().join("data.json"),
            ..AppConfig::default()
        };
        AppState::new(&config)
    }

    fn type_text(state: &mut AppState, text: &str) {
        for c in text.chars() {
            state.enter_char(c);
        }
    }

    #[test]
    fn test_variable_token() {
        assert_eq!(variable_token("host"), "{host}");
        assert_eq!(variable_token(" {host} "), "{host}");
        assert_eq!(variable_token(""), "");
    }

    #[test]
    fn test_edit_url_with_multibyte_chars() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.active_panel = Panel::Url;
        state.start_editing();
        type_text(&mut state, "http://é/x");
        state.move_cursor_left();
        state.move_cursor_left();
        state.delete_char();
        state.stop_editing();

        assert_eq!(state.draft.url.as_str(), "http:///x");
        assert_eq!(state.input_mode, InputMode::Normal);
    }

    #[test]
    fn test_header_rename_and_value_edit() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.add_header();
        assert_eq!(state.editing, Some(Field::HeaderKey));
        for _ in 0.."X-Header".len() {
            state.delete_char();
        }
        type_text(&mut state, "Accept");
        state.stop_editing();

        state.edit_header_value();
        type_text(&mut state, "text/plain");
        state.stop_editing();

        assert_eq!(state.draft.headers.len(), 1);
        assert_eq!(state.draft.headers["Accept"], "text/plain");

        state.delete_header();
        assert!(state.draft.headers.is_empty());
        assert_eq!(state.selected_header, 0);
    }

    #[test]
    fn test_save_then_delete_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.draft = Request::new("GET", "http://api/{id}").with_header("{id}", "1");
        state.open_save();
        assert_eq!(state.active_view, OutputView::Save);
        state.save_form.project = "api".to_string();
        state.save_request();

        let stored = Storage::new(dir.path().join("data.json")).load();
        assert_eq!(stored.data.len(), 1);
        assert_eq!(stored.data[0].project_name, "api");

        state.refresh(Refresh::Tree);
        assert_eq!(state.tree.len(), 2);

        state.delete_request();
        let stored = Storage::new(dir.path().join("data.json")).load();
        assert!(stored.data.is_empty());
        assert_eq!(state.draft.url.as_str(), "http://api/{id}");
    }

    #[test]
    fn test_save_publishes_request_changed() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        state
            .events
            .request_changed
            .subscribe(move |r: &Request| sink.lock().unwrap().push(r.key().to_string()));

        state.draft = Request::new("POST", "http://x/items");
        state.save_request();

        assert_eq!(*seen.lock().unwrap(), vec!["POST http://x/items"]);
    }

    #[test]
    fn test_save_merges_external_edits() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        let storage = Storage::new(dir.path().join("data.json"));
        storage
            .update(|doc| doc.upsert(Request::new("GET", "http://external")))
            .unwrap();

        state.draft = Request::new("GET", "http://mine");
        state.save_request();

        assert_eq!(storage.load().data.len(), 2);
    }

    #[test]
    fn test_variables_and_context_cycle() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.settings.environment = "PROD".to_string();
        state.settings.variable = "host".to_string();
        state.settings.value = "api.example.com".to_string();
        state.add_variable();
        state.refresh(Refresh::Environments);

        assert_eq!(state.environments, vec!["default", "prod"]);
        assert_eq!(
            state.document.context.find("prod", "{host}").unwrap().value,
            "api.example.com"
        );

        state.cycle_context();
        assert_eq!(state.selected_env, "prod");

        state.settings.variable = "{host}".to_string();
        state.remove_variable();
        state.refresh(Refresh::Environments);
        assert_eq!(state.environments, vec!["default"]);
        assert_eq!(state.selected_env, "default");
    }

    #[test]
    fn test_apply_pattern_persists() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.settings.pattern = "{m} {a}|{u}".to_string();
        state.apply_pattern();

        let stored = Storage::new(dir.path().join("data.json")).load();
        assert_eq!(stored.config.pattern, "{m} {a}|{u}");
    }

    #[test]
    fn test_execute_resolves_against_selected_context() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.document.context.add("default", "{host}", "localhost:8080");
        state.draft = Request::new("GET", "http://{host}/users/{id}")
            .with_header("{id}", "42")
            .with_header("Authorization", "{token}");

        let Some(NetworkCommand::Execute { id, request }) = state.execute() else {
            panic!("expected an execute command");
        };

        assert_eq!(id, 1);
        assert_eq!(request.url.as_str(), "http://localhost:8080/users/42");
        assert!(request.headers.is_empty());
        assert!(state.is_loading);
        assert!(state.execute().is_none());
    }

    #[test]
    fn test_stale_responses_are_ignored() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.draft = Request::new("GET", "http://x");
        state.execute();

        state.handle_response(NetworkResponse::Failed {
            id: 99,
            message: "old".to_string(),
            time_ms: 1,
        });
        assert!(state.is_loading);

        state.handle_response(NetworkResponse::Completed {
            id: 1,
            exchange: Exchange {
                status: "200 OK".to_string(),
                status_code: 200,
                ..Exchange::default()
            },
        });
        assert!(!state.is_loading);
        assert_eq!(state.exchange.as_ref().unwrap().status_code, 200);
    }

    #[test]
    fn test_failure_keeps_draft() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.draft = Request::new("GET", "http://x").with_body("payload");
        state.execute();
        state.handle_response(NetworkResponse::Failed {
            id: 1,
            message: "Connection failed".to_string(),
            time_ms: 3,
        });

        assert!(state.response_message.starts_with("Connection failed"));
        assert_eq!(state.draft.body, "payload");
        assert_eq!(state.log.last().unwrap().level, LogLevel::Error);
    }

    #[test]
    fn test_tree_selection_loads_draft() {
        let dir = TempDir::new().unwrap();
        let mut state = state(&dir);
        state.draft = Request::new("PUT", "http://x/items/1").with_alias("update");
        state.open_save();
        state.save_request();
        state.new_request();
        state.refresh(Refresh::Tree);

        state.tree_next(); // project header
        state.tree_next();
        assert_eq!(state.draft.alias, "update");
        assert_eq!(state.active_view, OutputView::Preview);
    }
}
