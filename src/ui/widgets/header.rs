use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::session::ConnectionState;
use crate::ui::app::App;

pub fn state_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Open => Color::Green,
        ConnectionState::Connecting | ConnectionState::Closing => Color::Yellow,
        ConnectionState::Errored => Color::Red,
        ConnectionState::Idle | ConnectionState::Closed => Color::DarkGray,
    }
}

/// Draw the session header: cluster, namespace and connection state
pub fn draw_header(f: &mut Frame, area: Rect, app: &App) {
    let session = app.controller.session();
    let state = app.controller.state();
    let separator = Span::styled(" │ ", Style::default().fg(Color::DarkGray));

    let line = Line::from(vec![
        Span::styled(
            "kubeterm",
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ),
        separator.clone(),
        Span::styled("cluster: ", Style::default().fg(Color::Gray)),
        Span::raw(session.target.clone().unwrap_or_else(|| "(none)".to_string())),
        separator.clone(),
        Span::styled("namespace: ", Style::default().fg(Color::Gray)),
        Span::styled(session.namespace.clone(), Style::default().fg(Color::Yellow)),
        separator,
        Span::styled(
            format!("[{}]", state),
            Style::default().fg(state_color(state)).add_modifier(Modifier::BOLD),
        ),
    ]);

    let paragraph = Paragraph::new(vec![line]).block(Block::default().borders(Borders::BOTTOM));
    f.render_widget(paragraph, area);
}
