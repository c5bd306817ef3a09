//! reqtree - terminal HTTP client with a project tree of saved requests
//!
//! Architecture:
//! - UI Layer (Ratatui) - synchronous terminal rendering
//! - App Layer - owns the draft, the request store and the tree
//! - Network Layer (Tokio) - async HTTP execution

use std::io;
use std::time::Duration;

use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{prelude::*, widgets::*};
use tokio::sync::mpsc;
use tracing_appender::non_blocking::WorkerGuard;

use reqtree::config::AppConfig;
use reqtree::constants::{APP_NAME, APP_VERSION, EXAMPLE_TREE_PATTERN};
use reqtree::messages::ui_events::{
    key_to_ui_event, Field, InputMode, OutputView, Panel, SaveField, SettingsField,
};
use reqtree::messages::{NetworkCommand, NetworkResponse, RenderState, UiEvent};
use reqtree::tree::TreeNode;
use reqtree::ui::{
    self, highlight_json, level_color, method_color, panel_block, status_color, styled_line,
};
use reqtree::{AppActor, NetworkActor};

/// Terminal cleanup guard
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// File logging, only when enabled. The log file is truncated on start.
fn init_logging(config: &AppConfig) -> Option<WorkerGuard> {
    let path = config.log_file.as_ref()?;
    let _ = std::fs::remove_file(path);

    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| std::path::Path::new("."));
    let file_name = path.file_name()?;

    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_max_level(config.log_level)
        .init();
    Some(guard)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env();
    let _log_guard = init_logging(&config);
    tracing::info!(data_file = %config.data_file.display(), "starting {} {}", APP_NAME, APP_VERSION);

    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create channels
    let (ui_tx, ui_rx) = mpsc::unbounded_channel::<UiEvent>();
    let (net_cmd_tx, net_cmd_rx) = mpsc::unbounded_channel::<NetworkCommand>();
    let (net_resp_tx, net_resp_rx) = mpsc::unbounded_channel::<NetworkResponse>();
    let (render_tx, mut render_rx) = mpsc::unbounded_channel::<RenderState>();

    // Spawn network actor
    let network_actor = NetworkActor::new(net_resp_tx, config.timeout, config.log_response_bodies);
    tokio::spawn(network_actor.run(net_cmd_rx));

    // Spawn app actor
    let app_actor = AppActor::new(&config, net_cmd_tx, render_tx);
    tokio::spawn(app_actor.run(ui_rx, net_resp_rx));

    // Run UI loop (synchronous with async polling)
    run_ui_loop(&mut terminal, ui_tx, &mut render_rx).await?;

    tracing::info!("bye");
    Ok(())
}

/// Run the synchronous UI rendering loop
async fn run_ui_loop(
    terminal: &mut Terminal<impl Backend>,
    ui_tx: mpsc::UnboundedSender<UiEvent>,
    render_rx: &mut mpsc::UnboundedReceiver<RenderState>,
) -> anyhow::Result<()> {
    let mut current_state = RenderState::default();

    loop {
        terminal.draw(|f| draw_ui(f, &current_state))?;

        // Poll for events with timeout
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                if let Some(event) = key_to_ui_event(
                    key,
                    current_state.active_panel,
                    current_state.active_view,
                    current_state.input_mode,
                    current_state.show_help,
                ) {
                    let quit = matches!(event, UiEvent::Quit);
                    let _ = ui_tx.send(event);
                    if quit {
                        break;
                    }
                }
            }
        }

        // Check for state updates (non-blocking)
        while let Ok(state) = render_rx.try_recv() {
            current_state = state;
        }
    }

    Ok(())
}

// ============================================================================
// UI Drawing Functions
// ============================================================================

fn draw_ui(f: &mut Frame, state: &RenderState) {
    let area = f.area();

    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Content
            Constraint::Length(1), // Status bar
        ])
        .split(area);

    draw_title_bar(f, state, main_chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(main_chunks[1]);

    draw_tree(f, state, columns[0]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Method + URL
            Constraint::Length(8), // Headers + Body
            Constraint::Min(5),    // Output
        ])
        .split(columns[1]);

    draw_request_bar(f, state, right[0]);

    let middle = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(right[1]);
    draw_headers_panel(f, state, middle[0]);
    draw_body_panel(f, state, middle[1]);

    draw_output(f, state, right[2]);
    draw_status_bar(f, state, main_chunks[2]);

    if state.show_help {
        draw_help_popup(f, area);
    }
}

fn is_editing(state: &RenderState, field: Field) -> bool {
    state.input_mode == InputMode::Editing && state.editing == Some(field)
}

/// Place the terminal cursor `offset` columns into a bordered row
fn place_cursor(f: &mut Frame, area: Rect, row: u16, offset: usize) {
    let max_x = area.x + area.width.saturating_sub(2);
    let cursor_x = (area.x + 1 + offset as u16).min(max_x);
    f.set_cursor_position(Position::new(cursor_x, area.y + 1 + row));
}

fn draw_title_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let line = Line::from(vec![
        Span::styled(
            format!(" {} {} ", APP_NAME, APP_VERSION),
            Style::default().fg(Color::Black).bg(Color::Cyan).bold(),
        ),
        Span::raw("  context: "),
        Span::styled(state.environment.clone(), Style::default().fg(Color::Yellow).bold()),
    ]);
    f.render_widget(Paragraph::new(line), area);
}

fn draw_tree(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Tree;

    let items: Vec<ListItem> = state
        .tree
        .iter()
        .map(|node| match node {
            TreeNode::Project { label } => ListItem::new(Line::from(Span::styled(
                format!(" {} ", label),
                Style::default().fg(Color::Black).bg(Color::White).bold(),
            ))),
            TreeNode::Leaf { label, .. } => ListItem::new(styled_line(label)),
        })
        .collect();

    let title = format!(" Requests ({}) ", state.tree.iter().filter(|n| !n.is_project()).count());
    let list = List::new(items)
        .block(panel_block(title, is_focused, false))
        .highlight_symbol("► ")
        .highlight_spacing(HighlightSpacing::Always)
        .highlight_style(Style::default().add_modifier(Modifier::BOLD));

    let mut list_state = ListState::default().with_selected(state.tree_cursor);
    f.render_stateful_widget(list, area, &mut list_state);
}

fn draw_request_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Url;
    let editing = is_editing(state, Field::Url);
    let method = state.draft.method.as_str();

    let loading = if state.is_loading { " [...]" } else { "" };
    let alias = if state.draft.alias.is_empty() {
        String::new()
    } else {
        format!(" {}", state.draft.alias)
    };

    let block = panel_block(
        Line::from(vec![
            Span::styled(format!(" {}", method), Style::default().fg(method_color(method)).bold()),
            Span::raw(format!("{}{} ", loading, alias)),
        ]),
        is_focused,
        editing,
    )
    .title_bottom(
        Line::from(format!(" {} | {} ", state.draft.content_type, state.environment)).right_aligned(),
    );

    let input = Paragraph::new(state.draft.url.as_str()).block(block);
    f.render_widget(input, area);

    if editing {
        let before = state.draft.url.as_str().get(..state.cursor_position).unwrap_or_default();
        place_cursor(f, area, 0, before.chars().count());
    }
}

fn draw_headers_panel(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Headers;
    let editing_key = is_editing(state, Field::HeaderKey);
    let editing_value = is_editing(state, Field::HeaderValue);

    let items: Vec<ListItem> = state
        .draft
        .headers
        .iter()
        .enumerate()
        .map(|(i, (key, value))| {
            let selected = i == state.selected_header;
            let key = if selected && editing_key { state.edit_buffer.as_str() } else { key.as_str() };
            let value = if selected && editing_value { state.edit_buffer.as_str() } else { value.as_str() };

            let style = if is_focused && selected {
                Style::default().fg(Color::Yellow).bold()
            } else if reqtree::template::is_placeholder(key) {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default()
            };
            ListItem::new(format!("{}: {}", key, value)).style(style)
        })
        .collect();

    let list = List::new(items).block(panel_block(
        " Headers (a:add e:key v:value d:del) ",
        is_focused,
        editing_key || editing_value,
    ));
    f.render_widget(list, area);

    if editing_key || editing_value {
        let prefix = match (editing_key, state.draft.headers.keys().nth(state.selected_header)) {
            (false, Some(key)) => key.chars().count() + 2,
            _ => 0,
        };
        let typed = state.edit_buffer[..state.cursor_position.min(state.edit_buffer.len())].chars().count();
        place_cursor(f, area, state.selected_header as u16, prefix + typed);
    }
}

fn draw_body_panel(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Body;
    let editing = is_editing(state, Field::Body);

    let title = if state.draft.method.has_body() { " Body " } else { " Body (not usual for this method) " };
    let body = Paragraph::new(state.draft.body.as_str())
        .block(panel_block(title, is_focused, editing))
        .wrap(Wrap { trim: false });
    f.render_widget(body, area);

    if editing {
        let before = &state.draft.body[..state.cursor_position.min(state.draft.body.len())];
        let row = before.matches('\n').count() as u16;
        let col = before.rsplit('\n').next().unwrap_or("").chars().count();
        place_cursor(f, area, row, col);
    }
}

fn draw_output(f: &mut Frame, state: &RenderState, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(1)])
        .split(area);

    let titles: Vec<&str> = OutputView::ALL.iter().map(OutputView::title).collect();
    f.render_widget(ui::render_tabs(&titles, state.active_view.index()), chunks[0]);

    match state.active_view {
        OutputView::Response => draw_response(f, state, chunks[1]),
        OutputView::Preview => draw_preview(f, state, chunks[1]),
        OutputView::Log => draw_log(f, state, chunks[1]),
        OutputView::Settings => draw_settings(f, state, chunks[1]),
        OutputView::Save => draw_save(f, state, chunks[1]),
    }
}

fn header_lines(prefix: &'static str, headers: &reqtree::models::HeaderMap, color: Color) -> Vec<Line<'static>> {
    headers
        .iter()
        .map(|(k, v)| {
            Line::from(vec![
                Span::styled(format!("{}{}", prefix, k), Style::default().fg(color)),
                Span::raw(format!(": {}", v)),
            ])
        })
        .collect()
}

fn draw_response(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Output;

    let Some(exchange) = &state.exchange else {
        let text = if state.response_message.is_empty() {
            "Press 's' to execute the request."
        } else {
            state.response_message.as_str()
        };
        let color = if state.response_message.is_empty() {
            Color::DarkGray
        } else if state.is_loading {
            Color::Yellow
        } else {
            Color::Red
        };
        let paragraph = Paragraph::new(text)
            .style(Style::default().fg(color))
            .block(panel_block(" Response ", is_focused, false))
            .wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
        return;
    };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", exchange.method), Style::default().fg(method_color(&exchange.method)).bold()),
            Span::raw(exchange.url.clone()),
        ]),
        Line::from(format!("Host: {}", exchange.host)),
    ];
    lines.extend(header_lines("> ", &exchange.request_headers, Color::Cyan));
    if !exchange.request_body.is_empty() {
        lines.push(Line::from(""));
        lines.extend(exchange.request_body.lines().map(|l| Line::from(l.to_string())));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("{} {}", exchange.http_version, exchange.status),
        Style::default().fg(status_color(exchange.status_code)).bold(),
    )));
    lines.extend(header_lines("< ", &exchange.response_headers, Color::Magenta));
    lines.push(Line::from(""));
    lines.extend(highlight_json(&exchange.body));

    let length = exchange
        .content_length
        .map(|n| format!("{} bytes | ", n))
        .unwrap_or_default();
    let block = panel_block(
        Span::styled(
            format!(" {} ", exchange.status_code),
            Style::default().fg(status_color(exchange.status_code)).bold(),
        ),
        is_focused,
        false,
    )
    .title_bottom(Line::from(format!(" {}{} ms ", length, exchange.time_ms)).right_aligned());

    let response = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((state.response_scroll, 0));
    f.render_widget(response, area);
}

fn draw_preview(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Output;
    let title = format!(" Preview ({}) ", state.environment);

    let Some(preview) = &state.preview else {
        let paragraph = Paragraph::new("Enter a URL or pick a request in the tree.")
            .style(Style::default().fg(Color::DarkGray))
            .block(panel_block(title, is_focused, false));
        f.render_widget(paragraph, area);
        return;
    };

    let project = if state.draft.project_name.is_empty() {
        "-".to_string()
    } else {
        state.draft.project_name.clone()
    };
    let mut lines = vec![
        Line::from(vec![
            Span::styled(format!("{} ", preview.method), Style::default().fg(method_color(preview.method.as_str())).bold()),
            Span::raw(preview.url.to_string()),
        ]),
        Line::from(format!("project: {}  alias: {}", project, state.draft.alias)),
        Line::from(vec![
            Span::styled("Content-Type", Style::default().fg(Color::Cyan)),
            Span::raw(format!(": {}", preview.content_type)),
        ]),
    ];
    lines.extend(header_lines("", &preview.headers, Color::Cyan));

    let unresolved = reqtree::template::placeholders(preview.url.as_str());
    if !unresolved.is_empty() {
        lines.push(Line::from(Span::styled(
            format!("unresolved: {}", unresolved.join(" ")),
            Style::default().fg(Color::Yellow),
        )));
    }
    if !preview.body.is_empty() {
        lines.push(Line::from(""));
        lines.extend(highlight_json(&String::from_utf8_lossy(&preview.body)));
    }

    let paragraph = Paragraph::new(lines)
        .block(panel_block(title, is_focused, false))
        .wrap(Wrap { trim: false })
        .scroll((state.response_scroll, 0));
    f.render_widget(paragraph, area);
}

fn draw_log(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Output;

    let lines: Vec<Line> = state
        .log
        .iter()
        .map(|entry| {
            Line::from(vec![
                Span::styled(
                    entry.timestamp.to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!(" {:<5} ", entry.level.as_str()),
                    Style::default().fg(level_color(entry.level)),
                ),
                Span::raw(entry.message.clone()),
            ])
        })
        .collect();

    let paragraph = Paragraph::new(lines)
        .block(panel_block(" Log ", is_focused, false))
        .scroll((state.log_scroll, 0));
    f.render_widget(paragraph, area);
}

fn form_row(label: &str, value: &str, selected: bool, editing: bool) -> Line<'static> {
    let label_style = if selected {
        Style::default().fg(Color::Yellow).bold()
    } else {
        Style::default().fg(Color::Cyan)
    };
    let value_style = if editing {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::styled(format!("{:<12}", label), label_style),
        Span::styled(value.to_string(), value_style),
    ])
}

/// Cursor inside a form row whose label is 12 columns wide
fn place_form_cursor(f: &mut Frame, area: Rect, row: u16, value: &str, cursor: usize) {
    let typed = value[..cursor.min(value.len())].chars().count();
    place_cursor(f, area, row, 12 + typed);
}

fn draw_settings(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Output;
    let editing = state.input_mode == InputMode::Editing;

    let rows = [
        (SettingsField::Pattern, "Pattern", state.pattern.as_str()),
        (SettingsField::Environment, "Context", state.settings_environment.as_str()),
        (SettingsField::Variable, "Variable", state.settings_variable.as_str()),
        (SettingsField::Value, "Value", state.settings_value.as_str()),
    ];

    let mut lines: Vec<Line> = rows
        .iter()
        .map(|(field, label, value)| {
            let selected = is_focused && state.settings_field == *field;
            form_row(label, value, selected, selected && editing)
        })
        .collect();
    lines.push(Line::from(Span::styled(
        format!("e.g. {}", EXAMPLE_TREE_PATTERN),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Variables of '{}'", state.settings_environment),
        Style::default().bold(),
    )));
    if state.variables.is_empty() {
        lines.push(Line::from(Span::styled("  (none)", Style::default().fg(Color::DarkGray))));
    }
    for row in &state.variables {
        lines.push(Line::from(vec![
            Span::styled(format!("  {}", row.variable), Style::default().fg(Color::Cyan)),
            Span::raw(format!(" = {}", row.value)),
        ]));
    }

    let title = " Settings (e:edit a:set var d:remove var p:apply pattern) ";
    let paragraph = Paragraph::new(lines).block(panel_block(title, is_focused, editing));
    f.render_widget(paragraph, area);

    if is_focused && editing {
        if let Some(index) = rows.iter().position(|(field, _, _)| *field == state.settings_field) {
            place_form_cursor(f, area, index as u16, rows[index].2, state.cursor_position);
        }
    }
}

fn draw_save(f: &mut Frame, state: &RenderState, area: Rect) {
    let is_focused = state.active_panel == Panel::Output;
    let editing = state.input_mode == InputMode::Editing;

    let rows = [
        (SaveField::Project, "Project", state.save_project.as_str()),
        (SaveField::Alias, "Alias", state.save_alias.as_str()),
    ];

    let mut lines: Vec<Line> = rows
        .iter()
        .map(|(field, label, value)| {
            let selected = is_focused && state.save_field == *field;
            form_row(label, value, selected, selected && editing)
        })
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(format!(
        "Saves {} {}",
        state.draft.method, state.draft.url
    )));

    let paragraph = Paragraph::new(lines).block(panel_block(" Save (e:edit Enter:save) ", is_focused, editing));
    f.render_widget(paragraph, area);

    if is_focused && editing {
        if let Some(index) = rows.iter().position(|(field, _, _)| *field == state.save_field) {
            place_form_cursor(f, area, index as u16, rows[index].2, state.cursor_position);
        }
    }
}

fn draw_status_bar(f: &mut Frame, state: &RenderState, area: Rect) {
    let hints = if state.is_loading {
        " Loading... ".to_string()
    } else if state.input_mode == InputMode::Editing {
        " ESC:stop editing | arrows:move ".to_string()
    } else if !state.status.is_empty() {
        format!(" {} ", state.status)
    } else {
        " Tab:panel | s:send | w:save | n:new | x:context | ?:help | q:quit ".to_string()
    };

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(state.data_file.chars().count() as u16 + 2)])
        .split(area);

    f.render_widget(Paragraph::new(hints).style(Style::default().fg(Color::DarkGray)), chunks[0]);
    f.render_widget(
        Paragraph::new(format!("{} ", state.data_file))
            .style(Style::default().fg(Color::DarkGray))
            .right_aligned(),
        chunks[1],
    );
}

fn draw_help_popup(f: &mut Frame, area: Rect) {
    let popup_area = centered_rect(60, 80, area);

    let help_text = r#"
 REQTREE - Keyboard Shortcuts

 NAVIGATION
   Tab / Shift+Tab    Switch panels
   ↑ / ↓              Tree, headers, form fields, scrolling
   1..5               Response, Preview, Log, Settings, Save

 REQUEST
   e / Enter          Edit focused field (Enter in URL sends)
   s                  Send request
   m                  Cycle HTTP method
   t                  Cycle content type
   x                  Cycle context
   n                  New request
   w                  Save (project + alias)
   D                  Delete the stored request

 HEADERS
   a / d              Add / delete header
   e / v              Edit key / value

 SETTINGS
   a / d              Set / remove context variable
   p                  Apply tree pattern

 GENERAL
   ?                  Toggle this help
   q / Ctrl+C         Quit

 Press any key to close...
"#;

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Help ")
        .style(Style::default().bg(Color::Black));

    let help = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: false });

    f.render_widget(Clear, popup_area);
    f.render_widget(help, popup_area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
