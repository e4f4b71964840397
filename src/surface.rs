//! Seams between the session core and whatever displays it.

/// Whether a fit request could be honoured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitOutcome {
    Fitted { cols: u16, rows: u16 },
    /// The surface has no size yet; try again shortly
    Deferred,
}

/// Terminal emulation widget the session writes into
pub trait RenderSurface {
    /// Write raw text (may contain ANSI sequences, `\r` and `\n`)
    fn write(&mut self, text: &str);

    /// Write text followed by a line break
    fn write_line(&mut self, text: &str) {
        self.write(text);
        self.write("\r\n");
    }

    /// Wipe all content
    fn clear(&mut self);

    fn has_selection(&self) -> bool;

    /// Selected text with escape sequences removed
    fn selection(&self) -> Option<String>;

    /// Lay the surface out for the given size. Zero in either dimension defers.
    fn fit(&mut self, cols: u16, rows: u16) -> FitOutcome;
}

/// Severity of an application-level notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
    Info,
}

/// Sink for short success/error/info notices owned by the host application
pub trait Notifier {
    fn notify(&mut self, level: NoticeLevel, message: &str);
}
