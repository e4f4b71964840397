use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use crate::ui::utils::centered_rect;

fn section(title: &'static str) -> Line<'static> {
    Line::from(vec![Span::styled(title, Style::default().add_modifier(Modifier::BOLD))])
}

fn binding(keys: &'static str, description: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<12}", keys), Style::default().fg(Color::Yellow)),
        Span::raw(description),
    ])
}

/// Draw the help overlay with scroll support
pub fn draw_help_overlay(f: &mut Frame, scroll_offset: u16) {
    let help_text = vec![
        Line::from(vec![Span::styled(
            "kubeterm Help",
            Style::default().add_modifier(Modifier::BOLD),
        )]),
        Line::from(""),
        section("Session:"),
        binding("F5", "Connect / reconnect in the current namespace"),
        binding("F6", "Disconnect"),
        binding("F2", "Switch to the next namespace"),
        binding("F7", "Clear the terminal"),
        binding("Ctrl+Q", "Quit"),
        Line::from(""),
        section("Typing:"),
        binding("Enter", "Run the current line as a kubectl command"),
        binding("Ctrl+C", "Copy selection, or interrupt the running command"),
        binding("Ctrl+V", "Paste from the clipboard"),
        Line::from(""),
        section("Scrollback:"),
        binding("PgUp/PgDn", "Scroll by a page"),
        binding("Mouse wheel", "Scroll three lines"),
        binding("Drag", "Select lines"),
        binding("Esc", "Clear selection and jump to the latest output"),
        Line::from(""),
        Line::from(vec![
            Span::styled("↑/↓", Style::default().fg(Color::Yellow)),
            Span::raw(" scroll | "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(" or "),
            Span::styled("F1", Style::default().fg(Color::Yellow)),
            Span::raw(" to close"),
        ]),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let paragraph = Paragraph::new(help_text)
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((scroll_offset, 0));

    let area = centered_rect(60, 80, f.area());

    // Clear the area behind the popup
    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}
