//! Cursor movement and edit operations
//!
//! [`Screen`] borrows the pieces of a session the interpreter works on (state,
//! settings and display sink) for the length of one `feed` call, and keeps the
//! cursor invariant: `col < terminal_width`, `row < line_count`.

use unicode_width::UnicodeWidthChar;

use super::sink::DisplaySink;
use super::state::{CellAttrs, CursorState, TerminalState};
use crate::config::Settings;

/// ED / EL parameter
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EraseMode {
    ToEnd,
    ToStart,
    All,
}

impl EraseMode {
    pub fn from_param(param: u16) -> Option<Self> {
        match param {
            0 => Some(EraseMode::ToEnd),
            1 => Some(EraseMode::ToStart),
            2 => Some(EraseMode::All),
            _ => None,
        }
    }
}

pub struct Screen<'a, S: DisplaySink + ?Sized> {
    pub state: &'a mut TerminalState,
    pub settings: &'a Settings,
    pub sink: &'a mut S,
}

impl<'a, S: DisplaySink + ?Sized> Screen<'a, S> {
    pub fn new(state: &'a mut TerminalState, settings: &'a Settings, sink: &'a mut S) -> Self {
        Self {
            state,
            settings,
            sink,
        }
    }

    fn width(&self) -> usize {
        self.settings.terminal_width.max(1)
    }

    fn last_row(&self) -> usize {
        self.sink.line_count().saturating_sub(1)
    }

    /// Column where the sink writes next
    fn sink_col(&self) -> usize {
        self.state.cursor.col + usize::from(self.state.cursor.wrap_pending)
    }

    /// Clamp and move the cursor, padding the target line with blanks if
    /// it is shorter than the target column
    pub fn move_to(&mut self, col: usize, row: usize) {
        let col = col.min(self.width() - 1);
        let row = row.min(self.last_row());

        let extent = self.sink.line_extent(row);
        if col > extent {
            self.sink.set_cursor(extent, row);
            self.sink
                .write(&" ".repeat(col - extent), &CellAttrs::default());
        }

        self.state.cursor = CursorState {
            col,
            row,
            wrap_pending: false,
        };
        self.sink.set_cursor(col, row);
    }

    pub fn cursor_up(&mut self, n: usize) {
        let CursorState { col, row, .. } = self.state.cursor;
        self.move_to(col, row.saturating_sub(n));
    }

    pub fn cursor_down(&mut self, n: usize) {
        let CursorState { col, row, .. } = self.state.cursor;
        self.move_to(col, row.saturating_add(n));
    }

    pub fn cursor_forward(&mut self, n: usize) {
        let CursorState { col, row, .. } = self.state.cursor;
        self.move_to(col.saturating_add(n), row);
    }

    pub fn cursor_backward(&mut self, n: usize) {
        let CursorState { col, row, .. } = self.state.cursor;
        self.move_to(col.saturating_sub(n), row);
    }

    /// Set cursor position (1-indexed parameters)
    pub fn cursor_position(&mut self, row: usize, col: usize) {
        self.move_to(col.saturating_sub(1), row.saturating_sub(1));
    }

    /// Write printable text at the cursor with the current attributes
    pub fn write_text(&mut self, text: &str) {
        let width = self.width();
        let attrs = self.state.current_attrs;
        let mut run = String::new();
        let mut start = self.sink_col();

        for ch in text.chars() {
            if ch.width() == Some(0) {
                run.push(ch);
                continue;
            }

            if self.state.cursor.wrap_pending {
                self.flush_run(&mut run, start, &attrs);
                self.newline();
                start = 0;
            }

            run.push(ch);
            let cursor = &mut self.state.cursor;
            if cursor.col + 1 >= width {
                cursor.wrap_pending = true;
            } else {
                cursor.col += 1;
            }
        }

        self.flush_run(&mut run, start, &attrs);
    }

    fn flush_run(&mut self, run: &mut String, start: usize, attrs: &CellAttrs) {
        if run.is_empty() {
            return;
        }
        let row = self.state.cursor.row;
        self.sink.set_cursor(start, row);
        self.sink.write(run, attrs);
        run.clear();
        self.sink.set_cursor(self.sink_col(), row);
    }

    /// Next line, column 0; appends a line at the bottom
    pub fn newline(&mut self) {
        let row = self.state.cursor.row + 1;
        if row >= self.sink.line_count() {
            self.sink.append_line();
        }
        self.move_to(0, row);
    }

    /// Next line, same column
    pub fn line_feed(&mut self) {
        let CursorState { col, row, .. } = self.state.cursor;
        if row + 1 >= self.sink.line_count() {
            self.sink.append_line();
        }
        self.move_to(col, row + 1);
    }

    pub fn carriage_return(&mut self) {
        let row = self.state.cursor.row;
        self.move_to(0, row);
    }

    pub fn backspace(&mut self) {
        self.cursor_backward(1);
    }

    /// Advance to the next multiple of the tab size
    pub fn horizontal_tab(&mut self) {
        let tab = self.settings.tab_size.max(1);
        let CursorState { col, row, .. } = self.state.cursor;
        self.move_to((col / tab + 1) * tab, row);
    }

    pub fn erase_in_display(&mut self, mode: EraseMode) {
        let CursorState { col, row, .. } = self.state.cursor;
        let extent = self.sink.line_extent(row);
        let (from, to) = match mode {
            EraseMode::ToEnd => (self.sink.offset(col.min(extent), row), self.sink.text_len()),
            EraseMode::ToStart => (0, self.sink.offset((col + 1).min(extent), row)),
            EraseMode::All => (0, self.sink.text_len()),
        };
        self.sink.clear_range(from, to);
        self.sink.set_cursor(self.sink_col(), row);
    }

    pub fn erase_in_line(&mut self, mode: EraseMode) {
        let CursorState { col, row, .. } = self.state.cursor;
        let extent = self.sink.line_extent(row);
        let line_start = self.sink.offset(0, row);
        let (from, to) = match mode {
            EraseMode::ToEnd => (line_start + col.min(extent), line_start + extent),
            EraseMode::ToStart => (line_start, line_start + (col + 1).min(extent)),
            EraseMode::All => (line_start, line_start + extent),
        };
        self.sink.clear_range(from, to);
        self.sink.set_cursor(self.sink_col(), row);
    }

    pub fn save_cursor(&mut self) {
        self.state.save_cursor();
    }

    pub fn restore_cursor(&mut self) {
        let saved = self.state.restore_cursor();
        self.move_to(saved.col, saved.row);
        // A pending wrap only survives if the column is still the last one
        if saved.wrap_pending && saved.col == self.width() - 1 {
            self.state.cursor.wrap_pending = true;
            self.sink.set_cursor(self.sink_col(), self.state.cursor.row);
        }
    }

    /// RIS - reset state, clear the display, home the cursor
    pub fn reset(&mut self) {
        self.state.reset();
        self.erase_in_display(EraseMode::All);
        self.move_to(0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::term::GridSink;

    struct Fixture {
        state: TerminalState,
        settings: Settings,
        sink: GridSink,
    }

    impl Fixture {
        fn new(width: usize) -> Self {
            Self {
                state: TerminalState::new(),
                settings: Settings {
                    terminal_width: width,
                    ..Settings::default()
                },
                sink: GridSink::new(),
            }
        }

        fn screen(&mut self) -> Screen<'_, GridSink> {
            Screen::new(&mut self.state, &self.settings, &mut self.sink)
        }
    }

    #[test]
    fn test_write_wraps_at_width() {
        let mut fx = Fixture::new(4);
        fx.screen().write_text("abcd");
        assert_eq!(fx.state.cursor.col, 3);
        assert!(fx.state.cursor.wrap_pending);
        assert_eq!(fx.sink.line_count(), 1);

        fx.screen().write_text("ef");
        assert_eq!(fx.sink.line_text(0), "abcd");
        assert_eq!(fx.sink.line_text(1), "ef");
        assert_eq!((fx.state.cursor.col, fx.state.cursor.row), (2, 1));
    }

    #[test]
    fn test_restore_keeps_pending_wrap() {
        let mut fx = Fixture::new(4);
        fx.screen().write_text("abcd");
        fx.screen().save_cursor();
        fx.screen().restore_cursor();
        assert!(fx.state.cursor.wrap_pending);

        fx.screen().write_text("X");
        assert_eq!(fx.sink.text(), "abcd\nX");

        // Saved at the edge, restored after moving away: still wraps
        fx.screen().move_to(0, 0);
        fx.screen().restore_cursor();
        assert_eq!((fx.state.cursor.col, fx.state.cursor.row), (3, 0));
        assert!(fx.state.cursor.wrap_pending);
    }

    #[test]
    fn test_restore_after_widening_drops_wrap() {
        let mut fx = Fixture::new(4);
        fx.screen().write_text("abcd");
        fx.screen().save_cursor();
        fx.settings.terminal_width = 10;
        fx.screen().restore_cursor();
        assert_eq!(fx.state.cursor.col, 3);
        assert!(!fx.state.cursor.wrap_pending);
    }

    #[test]
    fn test_move_pads_with_plain_blanks() {
        let mut fx = Fixture::new(80);
        fx.state.current_attrs.fg = crate::core::term::Color::RED;
        fx.screen().write_text("ab");
        fx.screen().move_to(5, 0);
        assert_eq!(fx.sink.line_text(0), "ab   ");
        assert!(fx.sink.cell(3, 0).map_or(false, |c| c.attrs.is_default()));
        assert_eq!(fx.state.cursor.col, 5);
    }

    #[test]
    fn test_rows_clamped_to_line_count() {
        let mut fx = Fixture::new(80);
        fx.screen().cursor_down(5);
        assert_eq!(fx.state.cursor.row, 0);
        fx.screen().newline();
        fx.screen().newline();
        fx.screen().cursor_up(10);
        assert_eq!(fx.state.cursor.row, 0);
        fx.screen().cursor_position(99, 99);
        assert_eq!((fx.state.cursor.col, fx.state.cursor.row), (79, 2));
    }

    #[test]
    fn test_tab_stops() {
        let mut fx = Fixture::new(20);
        fx.settings.tab_size = 4;
        fx.screen().write_text("ab");
        fx.screen().horizontal_tab();
        assert_eq!(fx.state.cursor.col, 4);
        assert_eq!(fx.sink.line_text(0), "ab  ");
        fx.screen().horizontal_tab();
        fx.screen().horizontal_tab();
        fx.screen().horizontal_tab();
        fx.screen().horizontal_tab();
        assert_eq!(fx.state.cursor.col, 19);
    }

    #[test]
    fn test_erase_in_line_modes() {
        let mut fx = Fixture::new(80);
        fx.screen().write_text("abcdef");
        fx.screen().move_to(2, 0);
        fx.screen().erase_in_line(EraseMode::ToStart);
        assert_eq!(fx.sink.line_text(0), "   def");
        fx.screen().move_to(4, 0);
        fx.screen().erase_in_line(EraseMode::ToEnd);
        assert_eq!(fx.sink.line_text(0), "   d");
        fx.screen().erase_in_line(EraseMode::All);
        assert_eq!(fx.sink.line_text(0), "");
    }

    #[test]
    fn test_erase_in_display_to_start() {
        let mut fx = Fixture::new(80);
        fx.screen().write_text("one");
        fx.screen().newline();
        fx.screen().write_text("two");
        fx.screen().newline();
        fx.screen().write_text("three");
        fx.screen().move_to(1, 1);
        fx.screen().erase_in_display(EraseMode::ToStart);
        assert_eq!(fx.sink.text(), "\n  o\nthree");
    }

    #[test]
    fn test_erase_mode_params() {
        assert_eq!(EraseMode::from_param(0), Some(EraseMode::ToEnd));
        assert_eq!(EraseMode::from_param(2), Some(EraseMode::All));
        assert_eq!(EraseMode::from_param(3), None);
    }
}
