/// Raw byte codes the line buffer reacts to
const CTRL_C: char = '\u{3}';
const CARRIAGE_RETURN: char = '\r';
const ESCAPE: char = '\u{1b}';
const DELETE: char = '\u{7f}';

/// Byte sent to the remote when the user deletes a character
pub const BACKSPACE: &str = "\u{7f}";

/// What a raw keystroke means for the pending line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyClass {
    /// Codes 32-126: appended to the line and echoed remotely
    Printable,
    /// Code 127
    Backspace,
    /// Code 13
    Submit,
    /// Code 3
    Interrupt,
    /// Escape (27), other C0 controls and anything outside ASCII
    Ignored,
}

impl KeyClass {
    /// Classify raw key data by its first character.
    ///
    /// Multi-character data is only printable when every character is.
    pub fn of(data: &str) -> Self {
        let Some(first) = data.chars().next() else {
            return KeyClass::Ignored;
        };

        match first {
            CARRIAGE_RETURN => KeyClass::Submit,
            DELETE => KeyClass::Backspace,
            CTRL_C => KeyClass::Interrupt,
            ESCAPE => KeyClass::Ignored,
            _ if data.chars().all(is_printable) => KeyClass::Printable,
            _ => KeyClass::Ignored,
        }
    }
}

fn is_printable(c: char) -> bool {
    (' '..='~').contains(&c)
}

/// Outcome of feeding a keystroke to the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineEdit {
    /// Forward these bytes as an `input` frame
    Forward(String),
    /// Submit this (trimmed) line as a `command` frame
    Submit(String),
    /// The line was discarded by Ctrl+C
    Interrupt,
    /// Nothing to send
    Nothing,
}

/// Local shadow of the line the user is typing.
///
/// The remote shell owns echo and cursor position; this copy only decides
/// what a `command` frame carries and when a backspace is worth forwarding.
#[derive(Debug, Default, Clone)]
pub struct LineBuffer {
    line: String,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one raw keystroke and report what should go over the wire
    pub fn apply(&mut self, data: &str) -> LineEdit {
        match KeyClass::of(data) {
            KeyClass::Printable => {
                self.line.push_str(data);
                LineEdit::Forward(data.to_string())
            }
            KeyClass::Backspace => {
                if self.line.pop().is_some() {
                    LineEdit::Forward(BACKSPACE.to_string())
                } else {
                    LineEdit::Nothing
                }
            }
            KeyClass::Submit => LineEdit::Submit(self.take()),
            KeyClass::Interrupt => {
                self.clear();
                LineEdit::Interrupt
            }
            KeyClass::Ignored => LineEdit::Nothing,
        }
    }

    /// Take the trimmed line, leaving the buffer empty
    pub fn take(&mut self) -> String {
        let line = std::mem::take(&mut self.line);
        line.trim().to_string()
    }

    pub fn clear(&mut self) {
        self.line.clear();
    }

    pub fn as_str(&self) -> &str {
        &self.line
    }

    pub fn is_empty(&self) -> bool {
        self.line.is_empty()
    }

    pub fn len(&self) -> usize {
        self.line.len()
    }
}
