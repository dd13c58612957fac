//! Display sink
//!
//! The text grid the interpreter draws on. Hosts supply their own
//! implementation; [`GridSink`] keeps everything in memory and backs the
//! renderer and the tests.

use unicode_width::UnicodeWidthChar;

use super::state::CellAttrs;

/// Abstract text-grid surface.
///
/// Lines grow as text is written; offsets used by [`clear_range`] are linear
/// positions in the buffer where every line break counts as one position.
///
/// [`clear_range`]: DisplaySink::clear_range
pub trait DisplaySink {
    /// Number of lines, at least 1
    fn line_count(&self) -> usize;

    /// Populated cells in `row`
    fn line_extent(&self, row: usize) -> usize;

    fn set_cursor(&mut self, col: usize, row: usize);

    /// Write at the cursor, overwriting existing cells and advancing the
    /// cursor. Writing past the line extent pads with unattributed blanks.
    /// Zero-width characters join the previous cell.
    fn write(&mut self, text: &str, attrs: &CellAttrs);

    /// Erase linear positions `from..to`. Erased cells at the end of a line
    /// are removed; erased cells before remaining text become blanks.
    fn clear_range(&mut self, from: usize, to: usize);

    /// Add an empty line at the bottom
    fn append_line(&mut self);

    /// Linear offset of `(col, row)`
    fn offset(&self, col: usize, row: usize) -> usize {
        (0..row.min(self.line_count()))
            .map(|r| self.line_extent(r) + 1)
            .sum::<usize>()
            + col
    }

    /// Total length in linear positions
    fn text_len(&self) -> usize {
        let lines = self.line_count();
        (0..lines).map(|r| self.line_extent(r)).sum::<usize>() + lines.saturating_sub(1)
    }
}

/// A single cell
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Cell {
    pub grapheme: String,
    pub attrs: CellAttrs,
}

impl Cell {
    pub fn blank() -> Self {
        Self {
            grapheme: " ".to_string(),
            attrs: CellAttrs::default(),
        }
    }

    /// First character (space if empty)
    pub fn c(&self) -> char {
        self.grapheme.chars().next().unwrap_or(' ')
    }
}

/// A single line
#[derive(Clone, Debug, Default)]
pub struct Line {
    pub cells: Vec<Cell>,
}

impl Line {
    pub fn text(&self) -> String {
        self.cells.iter().map(|c| c.grapheme.as_str()).collect()
    }
}

/// In-memory display sink
#[derive(Clone, Debug)]
pub struct GridSink {
    lines: Vec<Line>,
    cursor: (usize, usize),
}

impl Default for GridSink {
    fn default() -> Self {
        Self::new()
    }
}

impl GridSink {
    pub fn new() -> Self {
        Self {
            lines: vec![Line::default()],
            cursor: (0, 0),
        }
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Current sink cursor `(col, row)`
    pub fn cursor(&self) -> (usize, usize) {
        self.cursor
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<&Cell> {
        self.lines.get(row).and_then(|line| line.cells.get(col))
    }

    pub fn line_text(&self, row: usize) -> String {
        self.lines.get(row).map(Line::text).unwrap_or_default()
    }

    /// Whole buffer, lines joined by `\n`
    pub fn text(&self) -> String {
        self.lines
            .iter()
            .map(Line::text)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn is_blank(&self) -> bool {
        self.lines.iter().all(|line| line.cells.is_empty())
    }

    fn ensure_row(&mut self, row: usize) {
        while self.lines.len() <= row {
            self.lines.push(Line::default());
        }
    }
}

impl DisplaySink for GridSink {
    fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn line_extent(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |line| line.cells.len())
    }

    fn set_cursor(&mut self, col: usize, row: usize) {
        self.cursor = (col, row);
    }

    fn write(&mut self, text: &str, attrs: &CellAttrs) {
        let (mut col, row) = self.cursor;
        self.ensure_row(row);
        let cells = &mut self.lines[row].cells;

        for ch in text.chars() {
            if ch.width() == Some(0) {
                if let Some(prev) = col.checked_sub(1).and_then(|c| cells.get_mut(c)) {
                    prev.grapheme.push(ch);
                }
                continue;
            }

            if cells.len() < col {
                cells.resize(col, Cell::blank());
            }
            let cell = Cell {
                grapheme: ch.to_string(),
                attrs: *attrs,
            };
            if col < cells.len() {
                cells[col] = cell;
            } else {
                cells.push(cell);
            }
            col += 1;
        }

        self.cursor = (col, row);
    }

    fn clear_range(&mut self, from: usize, to: usize) {
        if from >= to {
            return;
        }

        let mut start = 0;
        for line in &mut self.lines {
            let len = line.cells.len();
            let end = start + len;
            let a = from.max(start);
            let b = to.min(end);

            if a < b {
                let (a, b) = (a - start, b - start);
                if b == len {
                    line.cells.truncate(a);
                } else {
                    for cell in &mut line.cells[a..b] {
                        *cell = Cell::blank();
                    }
                }
            }

            start = end + 1;
            if start >= to {
                break;
            }
        }
    }

    fn append_line(&mut self) {
        self.lines.push(Line::default());
    }
}
