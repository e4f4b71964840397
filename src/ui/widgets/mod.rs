mod header;
mod status_bar;
mod terminal_pane;

pub use header::{draw_header, state_color};
pub use status_bar::draw_status_bar;
pub use terminal_pane::draw_terminal_pane;
