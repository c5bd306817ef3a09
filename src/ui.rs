use ratatui::{prelude::*, widgets::*};

/// Bordered block for a panel, highlighted when focused or being edited
pub fn panel_block<'a>(title: impl Into<Line<'a>>, is_focused: bool, is_editing: bool) -> Block<'a> {
    let style = if is_focused && is_editing {
        Style::default().fg(Color::Yellow)
    } else if is_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default()
    };

    Block::default()
        .borders(Borders::ALL)
        .border_style(style)
        .title(title)
}

/// Renders tabs
pub fn render_tabs<'a>(titles: &[&'a str], selected: usize) -> Tabs<'a> {
    let titles: Vec<Line> = titles.iter().map(|t| Line::from(*t)).collect();

    Tabs::new(titles)
        .select(selected)
        .style(Style::default().fg(Color::DarkGray))
        .highlight_style(Style::default().fg(Color::Yellow).bold())
        .divider("|")
}

/// Named, `#RRGGBB` or `-` (reset) colour of a label tag
fn tag_color(name: &str) -> Option<Option<Color>> {
    let color = match name.to_ascii_lowercase().as_str() {
        "" | "-" => return Some(None),
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" | "purple" => Color::Magenta,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" => Color::Gray,
        "darkgray" | "darkgrey" => Color::DarkGray,
        "orange" => Color::Rgb(255, 165, 0),
        hex if hex.len() == 7 && hex.starts_with('#') => {
            let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
            Color::Rgb(channel(1)?, channel(3)?, channel(5)?)
        }
        _ => return None,
    };
    Some(Some(color))
}

/// Parse `[fg:bg]` tag into a style; `None` when the text is not a colour tag
fn parse_tag(tag: &str) -> Option<Style> {
    let (fg, bg) = tag.split_once(':')?;
    let mut style = Style::default();
    if let Some(fg) = tag_color(fg)? {
        style = style.fg(fg);
    }
    if let Some(bg) = tag_color(bg)? {
        style = style.bg(bg);
    }
    Some(style)
}

/// Render a tree label, turning `[fg:bg]` colour tags into styled spans.
///
/// A tag styles everything up to the next tag. Brackets that are not colour
/// tags stay in the text.
pub fn styled_line(label: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut style = Style::default();
    let mut text = String::new();
    let mut rest = label;

    while let Some(open) = rest.find('[') {
        let Some(close) = rest[open..].find(']').map(|i| open + i) else {
            break;
        };
        match parse_tag(&rest[open + 1..close]) {
            Some(next) => {
                text.push_str(&rest[..open]);
                if !text.is_empty() {
                    spans.push(Span::styled(std::mem::take(&mut text), style));
                }
                style = next;
            }
            None => text.push_str(&rest[..=close]),
        }
        rest = &rest[close + 1..];
    }
    text.push_str(rest);
    if !text.is_empty() {
        spans.push(Span::styled(text, style));
    }

    Line::from(spans)
}

/// JSON syntax highlighting, line by line
pub fn highlight_json(text: &str) -> Vec<Line<'static>> {
    text.lines().map(highlight_json_line).collect()
}

fn highlight_json_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut rest = line;

    while let Some(c) = rest.chars().next() {
        let len = match c {
            '"' => {
                let len = json_string_len(rest);
                let is_key = rest[len..].trim_start().starts_with(':');
                let color = if is_key { Color::Cyan } else { Color::Green };
                spans.push(Span::styled(rest[..len].to_string(), Style::default().fg(color)));
                len
            }
            '{' | '}' | '[' | ']' => {
                spans.push(Span::styled(c.to_string(), Style::default().fg(Color::Yellow)));
                1
            }
            ':' => {
                spans.push(Span::styled(":", Style::default().fg(Color::White)));
                1
            }
            _ => {
                let len = rest
                    .find(|c: char| matches!(c, '"' | '{' | '}' | '[' | ']' | ':' | ','))
                    .unwrap_or(rest.len())
                    .max(c.len_utf8());
                push_json_scalar(&mut spans, &rest[..len]);
                len
            }
        };
        rest = &rest[len..];
    }

    Line::from(spans)
}

/// Byte length of the string literal at the start of `text`, closing quote included
fn json_string_len(text: &str) -> usize {
    let mut escaped = false;
    for (i, c) in text.char_indices().skip(1) {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '"' => return i + 1,
            _ => {}
        }
    }
    text.len()
}

/// Literal, number or punctuation between strings and brackets
fn push_json_scalar(spans: &mut Vec<Span<'static>>, token: &str) {
    let word = token.trim();
    let Some(start) = token.find(word).filter(|_| !word.is_empty()) else {
        spans.push(Span::raw(token.to_string()));
        return;
    };
    let end = start + word.len();

    let style = match word {
        "true" | "false" | "null" => Style::default().fg(Color::Magenta),
        _ if word.parse::<f64>().is_ok() => Style::default().fg(Color::Yellow),
        _ => Style::default(),
    };
    if start > 0 {
        spans.push(Span::raw(token[..start].to_string()));
    }
    spans.push(Span::styled(word.to_string(), style));
    if end < token.len() {
        spans.push(Span::raw(token[end..].to_string()));
    }
}

/// Status code color
pub fn status_color(code: u16) -> Color {
    match code {
        200..=299 => Color::Green,
        300..=399 => Color::Cyan,
        400..=499 => Color::Red,
        500..=599 => Color::Magenta,
        _ => Color::Yellow,
    }
}

/// Method color, matching the tree's `{color}` tags
pub fn method_color(method: &str) -> Color {
    match method {
        "GET" => Color::Blue,
        "POST" => Color::Green,
        "PUT" => Color::Rgb(255, 165, 0),
        "PATCH" => Color::Cyan,
        "DELETE" => Color::Red,
        _ => Color::White,
    }
}

/// Log level color
pub fn level_color(level: crate::models::LogLevel) -> Color {
    use crate::models::LogLevel;
    match level {
        LogLevel::Error => Color::Red,
        LogLevel::Warn => Color::Yellow,
        LogLevel::Info => Color::Green,
        LogLevel::Debug => Color::DarkGray,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(line: &Line) -> Vec<String> {
        line.spans.iter().map(|s| s.content.to_string()).collect()
    }

    #[test]
    fn test_styled_line_applies_tags() {
        let line = styled_line("[blue:]GET    [white:] ~/users");
        assert_eq!(texts(&line), vec!["GET    ", " ~/users"]);
        assert_eq!(line.spans[0].style.fg, Some(Color::Blue));
        assert_eq!(line.spans[1].style.fg, Some(Color::White));
    }

    #[test]
    fn test_styled_line_hex_background_and_reset() {
        let line = styled_line("[white:#2B2B2B]a[-:-]b");
        assert_eq!(line.spans[0].style.bg, Some(Color::Rgb(0x2b, 0x2b, 0x2b)));
        assert_eq!(line.spans[1].style, Style::default());
    }

    #[test]
    fn test_styled_line_keeps_non_tags() {
        let line = styled_line("list [v2] items [unclosed");
        assert_eq!(texts(&line), vec!["list [v2] items [unclosed"]);

        let line = styled_line("[nope:] x");
        assert_eq!(texts(&line), vec!["[nope:] x"]);
    }

    #[test]
    fn test_highlight_json_colors_keys_and_values() {
        let lines = highlight_json("{\n  \"id\": 7,\n  \"ok\": true\n}");
        assert_eq!(lines.len(), 4);
        let key = &lines[1].spans[1];
        assert_eq!(key.content, "\"id\"");
        assert_eq!(key.style.fg, Some(Color::Cyan));
        assert!(lines[2]
            .spans
            .iter()
            .any(|s| s.content == "true" && s.style.fg == Some(Color::Magenta)));
    }

    #[test]
    fn test_styled_line_non_ascii_hex_tag_is_text() {
        let label = crate::template::tree_label(
            &crate::models::Request::new("GET", "http://x/a").with_alias("[#1é234:]list"),
            "{color}{m} {a}|{u}",
        );
        let line = styled_line(&label);
        assert_eq!(line.spans[0].style.fg, Some(Color::Blue));
        assert_eq!(texts(&line).concat(), "GET     [#1é234:]list");
        assert_eq!(tag_color("#é1234"), None);
    }

    #[test]
    fn test_highlight_json_string_values_and_escapes() {
        let lines = highlight_json(r#"  "name": "a \"b\" c", "n": -1.5e3, "x": null"#);
        let spans = &lines[0].spans;
        let value = spans.iter().find(|s| s.content.starts_with("\"a")).unwrap();
        assert_eq!(value.content, r#""a \"b\" c""#);
        assert_eq!(value.style.fg, Some(Color::Green));
        assert!(spans
            .iter()
            .any(|s| s.content == "-1.5e3" && s.style.fg == Some(Color::Yellow)));
        assert!(spans
            .iter()
            .any(|s| s.content == "null" && s.style.fg == Some(Color::Magenta)));
    }

    #[test]
    fn test_status_color_ranges() {
        assert_eq!(status_color(204), Color::Green);
        assert_eq!(status_color(404), Color::Red);
        assert_eq!(status_color(503), Color::Magenta);
    }
}
