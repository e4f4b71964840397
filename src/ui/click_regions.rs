use ratatui::layout::Rect;

/// Screen areas recorded during the last draw, for mouse hit-testing
#[derive(Debug, Default, Clone, Copy)]
pub struct ClickRegions {
    /// Area of the header bar
    pub header_area: Option<Rect>,
    /// Inner area of the terminal pane (inside its border)
    pub terminal_area: Option<Rect>,
    /// Area of the footer status line
    pub status_area: Option<Rect>,
}

impl ClickRegions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Terminal row under a screen position, relative to the pane's top
    pub fn terminal_row(&self, column: u16, row: u16) -> Option<u16> {
        let area = self.terminal_area?;
        area.contains(ratatui::layout::Position::new(column, row))
            .then(|| row - area.y)
    }
}
