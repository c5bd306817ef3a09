//! App actor - message loop processing UI events and network responses

use tokio::sync::mpsc;

use crate::app::state::{AppState, Refresh};
use crate::config::AppConfig;
use crate::events::EventBus;
use crate::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use crate::models::LogLevel;

/// App actor that processes UI events and network responses
pub struct AppActor {
    state: AppState,
    network_tx: mpsc::UnboundedSender<NetworkCommand>,
    render_tx: mpsc::UnboundedSender<RenderState>,
    refresh_rx: mpsc::UnboundedReceiver<Refresh>,
}

/// Change events turn into refresh requests handled by the actor loop
fn subscribe_refresh(events: &mut EventBus, refresh_tx: mpsc::UnboundedSender<Refresh>) {
    let tx = refresh_tx.clone();
    events.request_changed.subscribe(move |_| {
        let _ = tx.send(Refresh::Tree);
    });
    let tx = refresh_tx.clone();
    events.config_changed.subscribe(move |_| {
        let _ = tx.send(Refresh::Tree);
    });
    events.context_changed.subscribe(move |_| {
        let _ = refresh_tx.send(Refresh::Environments);
    });
}

impl AppActor {
    pub fn new(
        config: &AppConfig,
        network_tx: mpsc::UnboundedSender<NetworkCommand>,
        render_tx: mpsc::UnboundedSender<RenderState>,
    ) -> Self {
        let mut state = AppState::new(config);
        let (refresh_tx, refresh_rx) = mpsc::unbounded_channel();
        subscribe_refresh(&mut state.events, refresh_tx);

        let loaded = format!(
            "{} requests loaded from {}",
            state.document.data.len(),
            state.storage.path().display()
        );
        state.log(LogLevel::Info, loaded);

        AppActor {
            state,
            network_tx,
            render_tx,
            refresh_rx,
        }
    }

    /// Run the actor message loop
    pub async fn run(
        mut self,
        mut ui_rx: mpsc::UnboundedReceiver<UiEvent>,
        mut net_rx: mpsc::UnboundedReceiver<NetworkResponse>,
    ) {
        // Send initial render state
        let _ = self.render_tx.send(self.state.to_render_state());

        loop {
            tokio::select! {
                Some(event) = ui_rx.recv() => {
                    if self.handle_ui_event(event) {
                        // Quit signal received
                        let _ = self.network_tx.send(NetworkCommand::Shutdown);
                        break;
                    }
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(response) = net_rx.recv() => {
                    self.state.handle_response(response);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                Some(what) = self.refresh_rx.recv() => {
                    self.state.refresh(what);
                    let _ = self.render_tx.send(self.state.to_render_state());
                }
                else => break,
            }
        }
    }

    /// Handle a UI event, returns true if quit was requested
    fn handle_ui_event(&mut self, event: UiEvent) -> bool {
        match event {
            // Panel and view navigation
            UiEvent::NextPanel => self.state.next_panel(),
            UiEvent::PrevPanel => self.state.prev_panel(),
            UiEvent::ShowView(view) => self.state.show_view(view),
            UiEvent::ScrollUp => self.state.scroll_up(),
            UiEvent::ScrollDown => self.state.scroll_down(),

            // Tree
            UiEvent::TreeNext => self.state.tree_next(),
            UiEvent::TreePrev => self.state.tree_prev(),

            // Input editing
            UiEvent::StartEditing => self.state.start_editing(),
            UiEvent::StopEditing => self.state.stop_editing(),
            UiEvent::CharInput(c) => self.state.enter_char(c),
            UiEvent::Backspace => self.state.delete_char(),
            UiEvent::CursorLeft => self.state.move_cursor_left(),
            UiEvent::CursorRight => self.state.move_cursor_right(),

            // Draft request
            UiEvent::Execute => {
                if let Some(cmd) = self.state.execute() {
                    let _ = self.network_tx.send(cmd);
                }
            }
            UiEvent::NewRequest => self.state.new_request(),
            UiEvent::OpenSave => self.state.open_save(),
            UiEvent::SaveRequest => self.state.save_request(),
            UiEvent::DeleteRequest => self.state.delete_request(),
            UiEvent::CycleMethod => self.state.cycle_method(),
            UiEvent::CycleContentType => self.state.cycle_content_type(),
            UiEvent::CycleContext => self.state.cycle_context(),

            // Headers
            UiEvent::NextHeader => self.state.next_header(),
            UiEvent::PrevHeader => self.state.prev_header(),
            UiEvent::AddHeader => self.state.add_header(),
            UiEvent::DeleteHeader => self.state.delete_header(),
            UiEvent::EditHeaderValue => self.state.edit_header_value(),

            // Settings and save forms
            UiEvent::NextField => self.state.next_field(),
            UiEvent::PrevField => self.state.prev_field(),
            UiEvent::AddVariable => self.state.add_variable(),
            UiEvent::RemoveVariable => self.state.remove_variable(),
            UiEvent::ApplyPattern => self.state.apply_pattern(),

            // Popups
            UiEvent::ToggleHelp => self.state.toggle_help(),
            UiEvent::CloseHelp => self.state.close_help(),

            // System
            UiEvent::Quit => return true,
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Request;
    use crate::storage::Storage;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_save_refreshes_tree_through_events() {
        let dir = TempDir::new().unwrap();
        let data_file = dir.path().join("data.json");
        Storage::new(&data_file)
            .update(|doc| doc.upsert(Request::new("GET", "http://x/items").with_project("shop")))
            .unwrap();

        let config = AppConfig {
            data_file,
            ..AppConfig::default()
        };
        let (network_tx, _network_rx) = mpsc::unbounded_channel();
        let (render_tx, mut render_rx) = mpsc::unbounded_channel();
        let (ui_tx, ui_rx) = mpsc::unbounded_channel();
        let (_net_tx, net_rx) = mpsc::unbounded_channel();

        let actor = AppActor::new(&config, network_tx, render_tx);
        let handle = tokio::spawn(actor.run(ui_rx, net_rx));

        let initial = render_rx.recv().await.unwrap();
        assert_eq!(initial.tree.len(), 2);

        ui_tx.send(UiEvent::NewRequest).unwrap();
        ui_tx.send(UiEvent::StartEditing).unwrap();
        for c in "http://x/new".chars() {
            ui_tx.send(UiEvent::CharInput(c)).unwrap();
        }
        ui_tx.send(UiEvent::StopEditing).unwrap();
        ui_tx.send(UiEvent::OpenSave).unwrap();
        ui_tx.send(UiEvent::StartEditing).unwrap();
        for c in "shop".chars() {
            ui_tx.send(UiEvent::CharInput(c)).unwrap();
        }
        ui_tx.send(UiEvent::SaveRequest).unwrap();

        let mut tree_len = 0;
        while let Some(render) = render_rx.recv().await {
            tree_len = render.tree.len();
            if tree_len == 3 {
                break;
            }
        }
        assert_eq!(tree_len, 3);

        ui_tx.send(UiEvent::Quit).unwrap();
        handle.await.unwrap();
    }
}
