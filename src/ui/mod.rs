mod app;
mod click_regions;
mod draw;
mod overlays;
mod status_line;
mod terminal_view;
mod utils;
mod widgets;

pub use app::{App, TerminalController};
pub use click_regions::ClickRegions;
pub use draw::draw;
pub use status_line::{StatusLine, STATUS_TTL};
pub use terminal_view::TerminalView;
pub use utils::{centered_rect, parse_ansi_line};
pub use widgets::state_color;
