use std::collections::VecDeque;
use std::ops::Range;

use unicode_width::UnicodeWidthStr;

use crate::surface::{FitOutcome, RenderSurface};

const TAB_STOP: usize = 8;
/// Longest CSI parameter string kept before the sequence is abandoned
const MAX_CSI_LEN: usize = 32;

/// Where the escape-sequence scanner is between writes
#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Scan {
    #[default]
    Ground,
    Escape,
    Csi(String),
    /// Operating system command, ended by BEL or ESC \
    Osc,
}

/// Scrollback buffer that behaves enough like a terminal for line-oriented
/// kubectl output.
///
/// Colour (SGR) sequences are kept in the text and rendered later; cursor
/// movement is reduced to `\r` (rewrite the current line) and backspace.
/// Every line has a stable id so selections survive scrollback trimming.
#[derive(Debug)]
pub struct TerminalView {
    lines: VecDeque<String>,
    /// Line being written; always shown below `lines`
    current: String,
    /// Id of `lines[0]`
    first_id: u64,
    scrollback: usize,
    scan: Scan,
    /// A bare `\r` was seen; the next text replaces the current line
    carriage: bool,
    size: Option<(u16, u16)>,
    /// Lines scrolled back from the bottom; 0 follows new output
    scroll_offset: usize,
    selection_anchor: Option<u64>,
    selection_end: Option<u64>,
}

impl TerminalView {
    pub fn new(scrollback: usize) -> Self {
        Self {
            lines: VecDeque::new(),
            current: String::new(),
            first_id: 0,
            scrollback: scrollback.max(1),
            scan: Scan::Ground,
            carriage: false,
            size: None,
            scroll_offset: 0,
            selection_anchor: None,
            selection_end: None,
        }
    }

    /// Completed lines plus the line in progress
    pub fn line_count(&self) -> usize {
        self.lines.len() + 1
    }

    /// Size from the last successful fit
    pub fn size(&self) -> Option<(u16, u16)> {
        self.size
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }

    pub fn is_following(&self) -> bool {
        self.scroll_offset == 0
    }

    /// Raw text (escape sequences included) of a line by id
    pub fn line(&self, id: u64) -> Option<&str> {
        let index = id.checked_sub(self.first_id)? as usize;
        match index.cmp(&self.lines.len()) {
            std::cmp::Ordering::Less => self.lines.get(index).map(String::as_str),
            std::cmp::Ordering::Equal => Some(&self.current),
            std::cmp::Ordering::Greater => None,
        }
    }

    /// Ids of the lines shown in a viewport `rows` high
    pub fn visible_range(&self, rows: usize) -> Range<u64> {
        let end = self.first_id + (self.line_count() - self.scroll_offset.min(self.line_count())) as u64;
        let start = end.saturating_sub(rows as u64).max(self.first_id);
        start..end
    }

    /// Line id under a viewport row, if that row shows a line
    pub fn line_at_row(&self, row: u16, rows: usize) -> Option<u64> {
        let range = self.visible_range(rows);
        let id = range.start + row as u64;
        range.contains(&id).then_some(id)
    }

    fn page_rows(&self) -> usize {
        self.size.map(|(_, rows)| rows as usize).unwrap_or(1)
    }

    fn max_offset(&self) -> usize {
        self.line_count().saturating_sub(self.page_rows())
    }

    pub fn scroll_up(&mut self, lines: usize) {
        self.scroll_offset = (self.scroll_offset + lines).min(self.max_offset());
    }

    pub fn scroll_down(&mut self, lines: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(lines);
    }

    pub fn page_up(&mut self) {
        self.scroll_up(self.page_rows().saturating_sub(1).max(1));
    }

    pub fn page_down(&mut self) {
        self.scroll_down(self.page_rows().saturating_sub(1).max(1));
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = 0;
    }

    /// Start a line selection at `id`, dropping any previous one
    pub fn begin_selection(&mut self, id: u64) {
        self.selection_anchor = Some(id);
        self.selection_end = Some(id);
    }

    pub fn extend_selection(&mut self, id: u64) {
        if self.selection_anchor.is_some() {
            self.selection_end = Some(id);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selection_anchor = None;
        self.selection_end = None;
    }

    fn selection_bounds(&self) -> Option<(u64, u64)> {
        let (anchor, end) = (self.selection_anchor?, self.selection_end?);
        Some((anchor.min(end), anchor.max(end)))
    }

    pub fn is_selected(&self, id: u64) -> bool {
        self.selection_bounds()
            .is_some_and(|(start, end)| (start..=end).contains(&id))
    }

    fn push_line(&mut self) {
        let line = std::mem::take(&mut self.current);
        self.lines.push_back(line);
        if self.lines.len() > self.scrollback {
            self.lines.pop_front();
            self.first_id += 1;
        }
        // Keep a scrolled-back view on the same text
        if self.scroll_offset > 0 {
            self.scroll_offset = (self.scroll_offset + 1).min(self.max_offset());
        }
    }

    fn begin_text(&mut self) {
        if self.carriage {
            self.current.clear();
            self.carriage = false;
        }
    }

    fn ground(&mut self, c: char) {
        match c {
            '\u{1b}' => self.scan = Scan::Escape,
            '\n' => {
                self.carriage = false;
                self.push_line();
            }
            '\r' => self.carriage = true,
            '\u{8}' => {
                self.carriage = false;
                pop_visible(&mut self.current);
            }
            '\t' => {
                self.begin_text();
                let width = visible_width(&self.current);
                let pad = TAB_STOP - width % TAB_STOP;
                self.current.extend(std::iter::repeat_n(' ', pad));
            }
            c if c.is_control() => {}
            c => {
                self.begin_text();
                self.current.push(c);
            }
        }
    }

    fn csi(&mut self, params: &str, action: char) {
        match action {
            'm' => {
                self.begin_text();
                self.current.push_str("\u{1b}[");
                self.current.push_str(params);
                self.current.push('m');
            }
            // Erase in line: the cursor sits at the end unless a \r moved it home
            'K' => self.begin_text(),
            'J' if matches!(params, "2" | "3") => self.clear(),
            _ => {}
        }
    }

    fn feed(&mut self, c: char) {
        match std::mem::take(&mut self.scan) {
            Scan::Ground => self.ground(c),
            Scan::Escape => {
                self.scan = match c {
                    '[' => Scan::Csi(String::new()),
                    ']' => Scan::Osc,
                    _ => Scan::Ground,
                };
            }
            Scan::Csi(mut params) => {
                if ('\u{40}'..='\u{7e}').contains(&c) {
                    self.csi(&params, c);
                } else if params.len() < MAX_CSI_LEN {
                    params.push(c);
                    self.scan = Scan::Csi(params);
                }
            }
            Scan::Osc => {
                self.scan = match c {
                    '\u{7}' => Scan::Ground,
                    '\u{1b}' => Scan::Escape,
                    _ => Scan::Osc,
                };
            }
        }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new(5000)
    }
}

impl RenderSurface for TerminalView {
    fn write(&mut self, text: &str) {
        for c in text.chars() {
            self.feed(c);
        }
    }

    fn clear(&mut self) {
        self.first_id += self.line_count() as u64;
        self.lines.clear();
        self.current.clear();
        self.carriage = false;
        self.scroll_offset = 0;
        self.clear_selection();
    }

    fn has_selection(&self) -> bool {
        self.selection().is_some()
    }

    fn selection(&self) -> Option<String> {
        let (start, end) = self.selection_bounds()?;
        let text: Vec<String> = (start..=end)
            .filter_map(|id| self.line(id))
            .map(|line| strip_ansi_escapes::strip_str(line).trim_end().to_string())
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text.join("\n"))
        }
    }

    fn fit(&mut self, cols: u16, rows: u16) -> FitOutcome {
        if cols == 0 || rows == 0 {
            return FitOutcome::Deferred;
        }
        self.size = Some((cols, rows));
        self.scroll_offset = self.scroll_offset.min(self.max_offset());
        FitOutcome::Fitted { cols, rows }
    }
}

fn visible_width(text: &str) -> usize {
    strip_ansi_escapes::strip_str(text).width()
}

/// Remove the last visible character, keeping trailing colour sequences
fn pop_visible(line: &mut String) {
    let mut styles = String::new();
    while let Some(start) = trailing_sgr(line) {
        styles.insert_str(0, &line[start..]);
        line.truncate(start);
    }
    line.pop();
    line.push_str(&styles);
}

fn trailing_sgr(line: &str) -> Option<usize> {
    if !line.ends_with('m') {
        return None;
    }
    let start = line.rfind("\u{1b}[")?;
    let params = &line[start + 2..line.len() - 1];
    params
        .chars()
        .all(|c| c.is_ascii_digit() || c == ';')
        .then_some(start)
}
