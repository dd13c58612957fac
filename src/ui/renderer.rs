//! Grid renderer using crossterm
//!
//! Writes the contents of a [`GridSink`] to a terminal with colors mapped
//! through a [`ColorScheme`].

use std::io::{self, Write};

use crossterm::{
    queue,
    style::{Attribute, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor},
};
use unicode_width::UnicodeWidthStr;

use crate::config::ColorScheme;
use crate::core::term::{AttrFlags, CellAttrs, Color, GridSink};

/// Terminal renderer
pub struct Renderer {
    scheme: ColorScheme,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(ColorScheme::default())
    }
}

impl Renderer {
    pub fn new(scheme: ColorScheme) -> Self {
        Self { scheme }
    }

    fn color(&self, color: Color) -> Option<crossterm::style::Color> {
        match color {
            Color::Default => None,
            Color::Indexed(n) => self.scheme.ansi.get(n as usize).map(|rgb| rgb.to_crossterm()),
        }
    }

    fn apply_attrs<W: Write>(&self, out: &mut W, attrs: &CellAttrs) -> io::Result<()> {
        queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;

        let (mut fg, mut bg) = (attrs.fg, attrs.bg);
        if attrs.flags.contains(AttrFlags::INVERSE) {
            std::mem::swap(&mut fg, &mut bg);
        }
        let fg = self.color(fg).unwrap_or_else(|| {
            if attrs.flags.contains(AttrFlags::INVERSE) {
                self.scheme.background.to_crossterm()
            } else {
                self.scheme.foreground.to_crossterm()
            }
        });
        queue!(out, SetForegroundColor(fg))?;
        if let Some(bg) = self.color(bg) {
            queue!(out, SetBackgroundColor(bg))?;
        } else if attrs.flags.contains(AttrFlags::INVERSE) {
            queue!(out, SetBackgroundColor(self.scheme.foreground.to_crossterm()))?;
        }

        if attrs.flags.contains(AttrFlags::BOLD) {
            queue!(out, SetAttribute(Attribute::Bold))?;
        }
        if attrs.flags.contains(AttrFlags::UNDERLINE) {
            queue!(out, SetAttribute(Attribute::Underlined))?;
        }
        if attrs.flags.contains(AttrFlags::BLINK) {
            queue!(out, SetAttribute(Attribute::SlowBlink))?;
        }
        Ok(())
    }

    /// Render every line of the grid, switching styles only between runs
    pub fn render<W: Write>(&self, grid: &GridSink, out: &mut W) -> io::Result<()> {
        for line in grid.lines() {
            let mut current: Option<CellAttrs> = None;
            for cell in &line.cells {
                if current != Some(cell.attrs) {
                    self.apply_attrs(out, &cell.attrs)?;
                    current = Some(cell.attrs);
                }
                queue!(out, Print(&cell.grapheme))?;
            }
            queue!(out, SetAttribute(Attribute::Reset), ResetColor, Print("\r\n"))?;
        }
        out.flush()
    }
}

/// Plain-text dump of a grid, for debugging
pub struct DebugRenderer;

impl DebugRenderer {
    /// Render grid to string, cursor marked with `█`
    pub fn render(grid: &GridSink, cursor: (usize, usize)) -> String {
        let width = grid
            .lines()
            .iter()
            .map(|line| line.text().width())
            .max()
            .unwrap_or(0)
            .max(cursor.0 + 1);
        let rule = "─".repeat(width + 1);

        let mut output = String::new();
        output.push_str(&format!(
            "=== {} lines, cursor ({}, {}) ===\n",
            grid.lines().len(),
            cursor.0,
            cursor.1
        ));
        output.push_str(&rule);
        output.push('\n');

        for (row_idx, line) in grid.lines().iter().enumerate() {
            let indicator = if row_idx == cursor.1 { '>' } else { ' ' };
            output.push(indicator);

            let mut chars: Vec<String> = line.cells.iter().map(|c| c.grapheme.clone()).collect();
            if row_idx == cursor.1 {
                if chars.len() <= cursor.0 {
                    chars.resize(cursor.0 + 1, " ".to_string());
                }
                chars[cursor.0] = "█".to_string();
            }
            output.push_str(&chars.concat());
            output.push('\n');
        }

        output.push_str(&rule);
        output.push('\n');
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::core::session::Session;

    fn grid(text: &str) -> GridSink {
        let mut session = Session::new(GridSink::new(), Settings::default()).unwrap();
        session.output(text);
        session.sink().clone()
    }

    #[test]
    fn test_render_emits_text_and_colors() {
        let grid = grid("\x1b[31mred\x1b[0m plain\r\nnext");
        let mut out = Vec::new();
        Renderer::new(ColorScheme::default_scheme())
            .render(&grid, &mut out)
            .unwrap();
        let out = String::from_utf8(out).unwrap();

        assert!(out.contains("red"));
        assert!(out.contains(" plain"));
        assert!(out.contains("next"));
        // Default scheme red is 170,0,0
        assert!(out.contains("38;2;170;0;0"));
    }

    #[test]
    fn test_debug_render_marks_cursor() {
        let grid = grid("ab\r\ncd");
        let dump = DebugRenderer::render(&grid, (2, 1));
        assert!(dump.contains(" ab\n"));
        assert!(dump.contains(">cd█\n"));
    }
}
