use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::surface::NoticeLevel;
use crate::ui::app::App;

fn key(label: &'static str) -> Span<'static> {
    Span::styled(
        label,
        Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    )
}

fn hint(text: &'static str) -> Span<'static> {
    Span::styled(text, Style::default().fg(Color::Gray))
}

/// Draw the footer: the latest notice, or key hints when there is none
pub fn draw_status_bar(f: &mut Frame, area: Rect, app: &App) {
    let line = match app.controller.notifier().current() {
        Some((message, level)) => {
            let color = match level {
                NoticeLevel::Success => Color::Green,
                NoticeLevel::Error => Color::Red,
                NoticeLevel::Info => Color::Yellow,
            };
            Line::from(vec![Span::styled(message.to_string(), Style::default().fg(color))])
        }
        None => Line::from(vec![
            key("F1"),
            hint(" help  "),
            key("F2"),
            hint(" namespace  "),
            key("F5"),
            hint(" connect  "),
            key("F6"),
            hint(" disconnect  "),
            key("Ctrl+Q"),
            hint(" quit"),
        ]),
    };

    let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Rgb(30, 30, 30)));
    f.render_widget(paragraph, area);
}
