use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
};
use ansi_to_tui::IntoText;

/// Helper function to create a centered rect using percentage of the available area
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
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

/// Parse one line of terminal text into styled spans, optionally painting
/// a background over every span
pub fn parse_ansi_line(text: &str, bg_color: Option<Color>) -> Line<'static> {
    match text.as_bytes().into_text() {
        Ok(parsed_text) => {
            let spans = parsed_text
                .lines
                .into_iter()
                .flat_map(|line| line.spans)
                .map(|span| match bg_color {
                    Some(bg) => Span::styled(span.content, span.style.bg(bg)),
                    None => span,
                })
                .collect::<Vec<_>>();
            let line = Line::from(spans);
            match bg_color {
                Some(bg) => line.style(Style::default().bg(bg)),
                None => line,
            }
        }
        Err(_) => {
            // Failed to parse ANSI, fall back to plain text
            let plain = strip_ansi_escapes::strip_str(text);
            let style = bg_color.map(|bg| Style::default().bg(bg)).unwrap_or_default();
            Line::from(Span::styled(plain, style))
        }
    }
}
