use std::time::{Duration, Instant};

use crate::session::{ResizeOutcome, SessionController};
use super::click_regions::ClickRegions;
use super::status_line::{StatusLine, STATUS_TTL};
use super::terminal_view::TerminalView;

/// Session controller as wired into the TUI
pub type TerminalController = SessionController<TerminalView, StatusLine>;

/// Application state for the TUI
pub struct App {
    /// The terminal session; owns the view and the status line
    pub controller: TerminalController,
    /// Namespaces F2 cycles through
    pub namespaces: Vec<String>,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Whether to show the help overlay
    pub show_help: bool,
    /// Scroll offset for help overlay
    pub help_scroll_offset: u16,
    /// Layout from the last draw
    pub regions: ClickRegions,
    /// Line under the mouse when the left button went down
    pub press_line: Option<u64>,
    /// Size the terminal view was last fitted to
    fitted: Option<(u16, u16)>,
}

impl App {
    pub fn new(controller: TerminalController, namespaces: Vec<String>) -> Self {
        Self {
            controller,
            namespaces,
            should_quit: false,
            show_help: false,
            help_scroll_offset: 0,
            regions: ClickRegions::new(),
            press_line: None,
            fitted: None,
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
        self.help_scroll_offset = 0;
    }

    pub fn scroll_help_up(&mut self) {
        self.help_scroll_offset = self.help_scroll_offset.saturating_sub(1);
    }

    pub fn scroll_help_down(&mut self) {
        self.help_scroll_offset = self.help_scroll_offset.saturating_add(1);
    }

    pub fn view(&self) -> &TerminalView {
        self.controller.surface()
    }

    pub fn view_mut(&mut self) -> &mut TerminalView {
        self.controller.surface_mut()
    }

    /// Namespace after the current one, wrapping around
    pub fn next_namespace(&self) -> Option<&str> {
        let current = &self.controller.session().namespace;
        let next = match self.namespaces.iter().position(|ns| ns == current) {
            Some(i) => (i + 1) % self.namespaces.len(),
            None => 0,
        };
        self.namespaces.get(next).map(String::as_str)
    }

    pub fn cycle_namespace(&mut self) {
        if let Some(next) = self.next_namespace().map(str::to_string) {
            self.controller.change_namespace(next);
        }
    }

    /// Connect, or reconnect, in the current namespace
    pub fn reconnect(&mut self) {
        let namespace = self.controller.session().namespace.clone();
        if let Err(e) = self.controller.connect(namespace) {
            // Already reported on screen by the controller
            tracing::warn!(error = %e, "connect failed");
        }
    }

    /// Fit the view to the pane drawn last, if its size changed. Returns a
    /// delay when the pane has no size yet and the fit should be retried.
    pub fn sync_size(&mut self) -> Option<Duration> {
        let area = self.regions.terminal_area?;
        let size = (area.width, area.height);
        if self.fitted == Some(size) {
            return None;
        }
        match self.controller.resize(size.0, size.1) {
            ResizeOutcome::Fitted { cols, rows } => {
                self.fitted = Some((cols, rows));
                None
            }
            ResizeOutcome::RetryAfter(delay) => Some(delay),
            ResizeOutcome::Ignored => None,
        }
    }

    /// Forget the fitted size so the next `sync_size` fits again
    pub fn invalidate_size(&mut self) {
        self.fitted = None;
    }

    /// Periodic housekeeping between events
    pub fn tick(&mut self, now: Instant) {
        self.controller.notifier_mut().expire(now, STATUS_TTL);
    }
}
