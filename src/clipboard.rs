use arboard::Clipboard;

use crate::error::{SessionError, SessionResult};

/// Read/write access to the system clipboard
pub trait ClipboardProvider {
    fn read_text(&mut self) -> SessionResult<String>;
    fn write_text(&mut self, text: &str) -> SessionResult<()>;
}

/// System clipboard via arboard, opened per call
#[derive(Debug, Default)]
pub struct SystemClipboard;

impl ClipboardProvider for SystemClipboard {
    fn read_text(&mut self) -> SessionResult<String> {
        let mut clipboard = Clipboard::new().map_err(denied)?;
        clipboard.get_text().map_err(denied)
    }

    fn write_text(&mut self, text: &str) -> SessionResult<()> {
        let mut clipboard = Clipboard::new().map_err(denied)?;
        clipboard.set_text(text).map_err(denied)
    }
}

fn denied(err: arboard::Error) -> SessionError {
    SessionError::ClipboardDenied(err.to_string())
}
