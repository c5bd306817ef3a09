//! UI events - messages from UI layer to App layer

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Events generated from user input in the UI layer
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    // Panel and view navigation
    NextPanel,
    PrevPanel,
    ShowView(OutputView),
    ScrollUp,
    ScrollDown,

    // Tree
    TreeNext,
    TreePrev,

    // Input editing
    StartEditing,
    StopEditing,
    CharInput(char),
    Backspace,
    CursorLeft,
    CursorRight,

    // Draft request
    Execute,
    NewRequest,
    OpenSave,
    SaveRequest,
    DeleteRequest,
    CycleMethod,
    CycleContentType,
    CycleContext,

    // Headers
    NextHeader,
    PrevHeader,
    AddHeader,
    DeleteHeader,
    EditHeaderValue,

    // Settings and save forms
    NextField,
    PrevField,
    AddVariable,
    RemoveVariable,
    ApplyPattern,

    // Popups
    ToggleHelp,
    CloseHelp,

    // System
    Quit,
}

/// Focusable panels, in Tab order
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum Panel {
    #[default]
    Tree,
    Url,
    Headers,
    Body,
    Output,
}

impl Panel {
    pub fn next(&self) -> Panel {
        match self {
            Panel::Tree => Panel::Url,
            Panel::Url => Panel::Headers,
            Panel::Headers => Panel::Body,
            Panel::Body => Panel::Output,
            Panel::Output => Panel::Tree,
        }
    }

    pub fn prev(&self) -> Panel {
        match self {
            Panel::Tree => Panel::Output,
            Panel::Url => Panel::Tree,
            Panel::Headers => Panel::Url,
            Panel::Body => Panel::Headers,
            Panel::Output => Panel::Body,
        }
    }
}

/// Views of the output panel
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum OutputView {
    #[default]
    Settings,
    Response,
    Preview,
    Log,
    Save,
}

impl OutputView {
    pub const ALL: [OutputView; 5] = [
        OutputView::Response,
        OutputView::Preview,
        OutputView::Log,
        OutputView::Settings,
        OutputView::Save,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            OutputView::Response => "1:Response",
            OutputView::Preview => "2:Preview",
            OutputView::Log => "3:Log",
            OutputView::Settings => "4:Settings",
            OutputView::Save => "5:Save",
        }
    }

    pub fn index(&self) -> usize {
        Self::ALL.iter().position(|v| v == self).unwrap_or(0)
    }
}

/// Input mode
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

/// Text field being edited
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Field {
    Url,
    Body,
    HeaderKey,
    HeaderValue,
    Pattern,
    Environment,
    Variable,
    Value,
    Project,
    Alias,
}

/// Rows of the settings form
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SettingsField {
    #[default]
    Pattern,
    Environment,
    Variable,
    Value,
}

impl SettingsField {
    pub fn next(&self) -> SettingsField {
        match self {
            SettingsField::Pattern => SettingsField::Environment,
            SettingsField::Environment => SettingsField::Variable,
            SettingsField::Variable => SettingsField::Value,
            SettingsField::Value => SettingsField::Pattern,
        }
    }

    pub fn prev(&self) -> SettingsField {
        match self {
            SettingsField::Pattern => SettingsField::Value,
            SettingsField::Environment => SettingsField::Pattern,
            SettingsField::Variable => SettingsField::Environment,
            SettingsField::Value => SettingsField::Variable,
        }
    }

    pub fn field(&self) -> Field {
        match self {
            SettingsField::Pattern => Field::Pattern,
            SettingsField::Environment => Field::Environment,
            SettingsField::Variable => Field::Variable,
            SettingsField::Value => Field::Value,
        }
    }
}

/// Rows of the save form
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum SaveField {
    #[default]
    Project,
    Alias,
}

impl SaveField {
    pub fn toggle(&self) -> SaveField {
        match self {
            SaveField::Project => SaveField::Alias,
            SaveField::Alias => SaveField::Project,
        }
    }

    pub fn field(&self) -> Field {
        match self {
            SaveField::Project => Field::Project,
            SaveField::Alias => Field::Alias,
        }
    }
}

/// Convert a key event to a UiEvent based on current UI context
pub fn key_to_ui_event(
    key: KeyEvent,
    active_panel: Panel,
    active_view: OutputView,
    input_mode: InputMode,
    show_help: bool,
) -> Option<UiEvent> {
    if key.kind != KeyEventKind::Press {
        return None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        if let KeyCode::Char('c') = key.code {
            return Some(UiEvent::Quit);
        }
    }

    if show_help {
        return Some(UiEvent::CloseHelp);
    }

    match input_mode {
        InputMode::Editing => editing_keys(key, active_panel),
        InputMode::Normal => normal_keys(key, active_panel, active_view),
    }
}

fn editing_keys(key: KeyEvent, active_panel: Panel) -> Option<UiEvent> {
    match key.code {
        KeyCode::Esc => Some(UiEvent::StopEditing),
        KeyCode::Left => Some(UiEvent::CursorLeft),
        KeyCode::Right => Some(UiEvent::CursorRight),
        KeyCode::Backspace => Some(UiEvent::Backspace),
        KeyCode::Char(c) => Some(UiEvent::CharInput(c)),
        KeyCode::Enter if active_panel == Panel::Url => Some(UiEvent::Execute),
        KeyCode::Enter => Some(UiEvent::StopEditing),
        _ => None,
    }
}

fn normal_keys(key: KeyEvent, active_panel: Panel, active_view: OutputView) -> Option<UiEvent> {
    // Global keys
    match key.code {
        KeyCode::Char('q') => return Some(UiEvent::Quit),
        KeyCode::Char('?') => return Some(UiEvent::ToggleHelp),
        KeyCode::Tab => return Some(UiEvent::NextPanel),
        KeyCode::BackTab => return Some(UiEvent::PrevPanel),
        KeyCode::Char('s') => return Some(UiEvent::Execute),
        KeyCode::Char('n') => return Some(UiEvent::NewRequest),
        KeyCode::Char('w') => return Some(UiEvent::OpenSave),
        KeyCode::Char('D') => return Some(UiEvent::DeleteRequest),
        KeyCode::Char('m') => return Some(UiEvent::CycleMethod),
        KeyCode::Char('t') => return Some(UiEvent::CycleContentType),
        KeyCode::Char('x') => return Some(UiEvent::CycleContext),
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            return Some(UiEvent::ShowView(OutputView::ALL[index]));
        }
        _ => {}
    }

    match active_panel {
        Panel::Tree => match key.code {
            KeyCode::Down | KeyCode::Char('j') => Some(UiEvent::TreeNext),
            KeyCode::Up | KeyCode::Char('k') => Some(UiEvent::TreePrev),
            _ => None,
        },
        Panel::Url | Panel::Body => match key.code {
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            _ => None,
        },
        Panel::Headers => match key.code {
            KeyCode::Down => Some(UiEvent::NextHeader),
            KeyCode::Up => Some(UiEvent::PrevHeader),
            KeyCode::Char('a') => Some(UiEvent::AddHeader),
            KeyCode::Char('d') => Some(UiEvent::DeleteHeader),
            KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
            KeyCode::Char('v') => Some(UiEvent::EditHeaderValue),
            _ => None,
        },
        Panel::Output => match active_view {
            OutputView::Response | OutputView::Preview | OutputView::Log => match key.code {
                KeyCode::Down => Some(UiEvent::ScrollDown),
                KeyCode::Up => Some(UiEvent::ScrollUp),
                _ => None,
            },
            OutputView::Settings => match key.code {
                KeyCode::Down => Some(UiEvent::NextField),
                KeyCode::Up => Some(UiEvent::PrevField),
                KeyCode::Char('e') | KeyCode::Enter => Some(UiEvent::StartEditing),
                KeyCode::Char('a') => Some(UiEvent::AddVariable),
                KeyCode::Char('d') => Some(UiEvent::RemoveVariable),
                KeyCode::Char('p') => Some(UiEvent::ApplyPattern),
                _ => None,
            },
            OutputView::Save => match key.code {
                KeyCode::Down => Some(UiEvent::NextField),
                KeyCode::Up => Some(UiEvent::PrevField),
                KeyCode::Char('e') => Some(UiEvent::StartEditing),
                KeyCode::Enter => Some(UiEvent::SaveRequest),
                _ => None,
            },
        },
    }
}
