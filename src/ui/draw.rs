use ratatui::{
    layout::{Constraint, Direction, Layout},
    Frame,
};

use super::app::App;
use super::overlays::draw_help_overlay;
use super::widgets::{draw_header, draw_status_bar, draw_terminal_pane};

/// Draw the UI to the terminal
pub fn draw(f: &mut Frame, app: &mut App) {
    // Header, terminal pane, status line
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(f.area());

    app.regions.header_area = Some(chunks[0]);
    app.regions.status_area = Some(chunks[2]);

    draw_header(f, chunks[0], app);
    draw_terminal_pane(f, chunks[1], app);
    draw_status_bar(f, chunks[2], app);

    // Must be last so it's on top
    if app.show_help {
        draw_help_overlay(f, app.help_scroll_offset);
    }
}
