use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::ui::app::App;
use crate::ui::utils::parse_ansi_line;

const SELECTION_BG: Color = Color::Rgb(50, 60, 90);

/// Draw the terminal output pane and record its inner area
pub fn draw_terminal_pane(f: &mut Frame, area: Rect, app: &mut App) {
    let view = app.view();
    let mut block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" terminal ");
    if !view.is_following() {
        block = block.title_bottom(Line::from(vec![Span::styled(
            format!(" [SCROLL +{}] ", view.scroll_offset()),
            Style::default().fg(Color::Yellow),
        )]));
    }

    let inner = block.inner(area);
    let lines: Vec<Line> = view
        .visible_range(inner.height as usize)
        .filter_map(|id| {
            let text = view.line(id)?;
            let bg = view.is_selected(id).then_some(SELECTION_BG);
            Some(parse_ansi_line(text, bg))
        })
        .collect();

    f.render_widget(Paragraph::new(lines).block(block), area);
    app.regions.terminal_area = Some(inner);
}
