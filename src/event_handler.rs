use crossterm::event::{
    KeyCode, KeyEvent, KeyEventKind, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::clipboard::ClipboardProvider;
use crate::surface::RenderSurface;
use crate::ui::App;

/// Lines moved per mouse wheel notch
const WHEEL_LINES: usize = 3;

/// Raw bytes a terminal would send for a key, if it sends any
pub fn key_to_input(key: &KeyEvent) -> Option<String> {
    let input = match key.code {
        KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => {
            if !c.is_ascii_alphabetic() {
                return None;
            }
            let code = c.to_ascii_lowercase() as u8 - b'a' + 1;
            char::from(code).to_string()
        }
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "\r".to_string(),
        KeyCode::Backspace => "\u{7f}".to_string(),
        KeyCode::Tab => "\t".to_string(),
        KeyCode::Up => "\u{1b}[A".to_string(),
        KeyCode::Down => "\u{1b}[B".to_string(),
        KeyCode::Right => "\u{1b}[C".to_string(),
        KeyCode::Left => "\u{1b}[D".to_string(),
        KeyCode::Delete => "\u{1b}[3~".to_string(),
        _ => return None,
    };
    Some(input)
}

pub struct EventHandler<'a> {
    app: &'a mut App,
    clipboard: &'a mut dyn ClipboardProvider,
}

impl<'a> EventHandler<'a> {
    pub fn new(app: &'a mut App, clipboard: &'a mut dyn ClipboardProvider) -> Self {
        Self { app, clipboard }
    }

    /// Returns true if the app should quit
    pub fn handle_key_event(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

        match key.code {
            KeyCode::Char('q') if ctrl => {
                self.app.quit();
                return true;
            }
            KeyCode::F(1) => self.app.toggle_help(),
            // Help overlay takes navigation keys while open
            KeyCode::Esc if self.app.show_help => self.app.toggle_help(),
            KeyCode::Up if self.app.show_help => self.app.scroll_help_up(),
            KeyCode::Down if self.app.show_help => self.app.scroll_help_down(),
            _ if self.app.show_help => {}
            KeyCode::F(2) => self.app.cycle_namespace(),
            KeyCode::F(5) => self.app.reconnect(),
            KeyCode::F(6) => self.app.controller.disconnect(),
            KeyCode::F(7) => self.app.controller.clear_surface(),
            KeyCode::Char('c') if ctrl => self.handle_ctrl_c(),
            KeyCode::Char('v') if ctrl => {
                self.app.controller.paste_from_clipboard(&mut *self.clipboard);
            }
            KeyCode::PageUp => self.app.view_mut().page_up(),
            KeyCode::PageDown => self.app.view_mut().page_down(),
            KeyCode::Esc => {
                let view = self.app.view_mut();
                view.clear_selection();
                view.scroll_to_bottom();
            }
            _ => {
                if let Some(input) = key_to_input(&key) {
                    self.app.view_mut().scroll_to_bottom();
                    self.app.controller.handle_key(&input);
                }
            }
        }
        false
    }

    /// Ctrl+C copies when lines are selected, otherwise interrupts
    fn handle_ctrl_c(&mut self) {
        if self.app.controller.copy_selection(&mut *self.clipboard) {
            self.app.view_mut().clear_selection();
        } else {
            self.app.controller.handle_key("\u{3}");
        }
    }

    /// Bracketed paste from the host terminal
    pub fn handle_paste(&mut self, text: &str) {
        self.app.controller.paste_text(text);
    }

    pub fn handle_mouse_event(&mut self, mouse: MouseEvent) {
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.app.view_mut().clear_selection();
                self.app.press_line = self.line_under(mouse.column, mouse.row);
            }
            MouseEventKind::Drag(MouseButton::Left) => {
                let Some(origin) = self.app.press_line else {
                    return;
                };
                if let Some(id) = self.line_under(mouse.column, mouse.row) {
                    let view = self.app.view_mut();
                    if !view.has_selection() {
                        view.begin_selection(origin);
                    }
                    view.extend_selection(id);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.app.press_line = None;
            }
            MouseEventKind::ScrollUp => self.app.view_mut().scroll_up(WHEEL_LINES),
            MouseEventKind::ScrollDown => self.app.view_mut().scroll_down(WHEEL_LINES),
            _ => {}
        }
    }

    fn line_under(&self, column: u16, row: u16) -> Option<u64> {
        let area = self.app.regions.terminal_area?;
        let row = self.app.regions.terminal_row(column, row)?;
        self.app.view().line_at_row(row, area.height as usize)
    }
}
