//! Terminal state
//!
//! Cursor position, the saved cursor snapshot, current text attributes and
//! the mode switches toggled by escape sequences. The display contents live
//! in the [`DisplaySink`](super::sink::DisplaySink); this is only the
//! interpreter's side of the session.

use bitflags::bitflags;

/// Terminal state owned by a single session
#[derive(Clone, Debug, Default)]
pub struct TerminalState {
    pub cursor: CursorState,
    /// Snapshot taken by DECSC (`ESC 7` / `ESC [ s`)
    pub saved: Option<SavedCursor>,
    pub current_attrs: CellAttrs,
    pub modes: TerminalModes,
}

impl TerminalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save cursor position and attributes
    pub fn save_cursor(&mut self) {
        self.saved = Some(SavedCursor {
            col: self.cursor.col,
            row: self.cursor.row,
            wrap_pending: self.cursor.wrap_pending,
            attrs: self.current_attrs,
        });
    }

    /// Restore cursor position and attributes.
    ///
    /// Without a prior save the cursor goes home with default attributes,
    /// as on a real VT100. Returns the saved cursor; the caller clamps its
    /// position against the display.
    pub fn restore_cursor(&mut self) -> CursorState {
        let saved = self.saved.unwrap_or_default();
        self.current_attrs = saved.attrs;
        CursorState {
            col: saved.col,
            row: saved.row,
            wrap_pending: saved.wrap_pending,
        }
    }

    /// RIS - everything back to power-on defaults
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Cursor position (0-based)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CursorState {
    pub col: usize,
    pub row: usize,
    /// Last column was written; the next printable wraps first
    pub wrap_pending: bool,
}

/// Saved cursor state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SavedCursor {
    pub col: usize,
    pub row: usize,
    /// Last column written, wrap deferred
    pub wrap_pending: bool,
    pub attrs: CellAttrs,
}

/// Cell attributes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellAttrs {
    pub fg: Color,
    pub bg: Color,
    pub flags: AttrFlags,
}

impl CellAttrs {
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }

    pub fn bold(&self) -> bool {
        self.flags.contains(AttrFlags::BOLD)
    }

    pub fn underline(&self) -> bool {
        self.flags.contains(AttrFlags::UNDERLINE)
    }

    /// Apply SGR parameters left to right. Missing or non-numeric
    /// parameters read as 0.
    pub fn apply_sgr(&mut self, params: &[Option<u16>]) {
        if params.is_empty() {
            self.reset();
            return;
        }

        for param in params {
            match param.unwrap_or(0) {
                0 => self.reset(),
                1 => self.flags |= AttrFlags::BOLD,
                4 => self.flags |= AttrFlags::UNDERLINE,
                5 => self.flags |= AttrFlags::BLINK,
                7 => self.flags |= AttrFlags::INVERSE,

                22 => self.flags &= !AttrFlags::BOLD,
                24 => self.flags &= !AttrFlags::UNDERLINE,
                25 => self.flags &= !AttrFlags::BLINK,
                27 => self.flags &= !AttrFlags::INVERSE,

                n @ 30..=37 => self.fg = Color::Indexed((n - 30) as u8),
                39 => self.fg = Color::Default,
                n @ 40..=47 => self.bg = Color::Indexed((n - 40) as u8),
                49 => self.bg = Color::Default,

                other => {
                    tracing::debug!("Unsupported SGR parameter: {}", other);
                }
            }
        }
    }
}

/// Color from the 8-entry ANSI palette
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Color {
    #[default]
    Default,
    Indexed(u8),
}

impl Color {
    pub const BLACK: Color = Color::Indexed(0);
    pub const RED: Color = Color::Indexed(1);
    pub const GREEN: Color = Color::Indexed(2);
    pub const YELLOW: Color = Color::Indexed(3);
    pub const BLUE: Color = Color::Indexed(4);
    pub const MAGENTA: Color = Color::Indexed(5);
    pub const CYAN: Color = Color::Indexed(6);
    pub const WHITE: Color = Color::Indexed(7);

    /// Palette name, `None` for the default color
    pub fn name(&self) -> Option<&'static str> {
        const NAMES: [&str; 8] = [
            "black", "red", "green", "yellow", "blue", "magenta", "cyan", "white",
        ];
        match self {
            Color::Default => None,
            Color::Indexed(n) => NAMES.get(*n as usize).copied(),
        }
    }
}

bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct AttrFlags: u8 {
        const BOLD      = 0b0000_0001;
        const UNDERLINE = 0b0000_0010;
        const BLINK     = 0b0000_0100;
        const INVERSE   = 0b0000_1000;
    }
}

/// Terminal modes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TerminalModes {
    /// DECCKM - cursor keys send `ESC O x` instead of `ESC [ x`
    pub application_cursor: bool,
    /// DECKPAM / DECKPNM
    pub application_keypad: bool,
    /// LNM - LF also returns the carriage, Return sends CR LF
    pub linefeed_newline: bool,
}

impl TerminalModes {
    pub fn set_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            20 => self.linefeed_newline = enable,
            other => tracing::debug!("Unsupported mode: {}", other),
        }
    }

    pub fn set_private_mode(&mut self, mode: u16, enable: bool) {
        match mode {
            1 => self.application_cursor = enable,
            other => tracing::debug!("Unsupported private mode: ?{}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sgr_sets_and_clears() {
        let mut attrs = CellAttrs::default();
        attrs.apply_sgr(&[Some(1), Some(4), Some(31), Some(44)]);
        assert!(attrs.bold());
        assert!(attrs.underline());
        assert_eq!(attrs.fg, Color::RED);
        assert_eq!(attrs.bg, Color::BLUE);

        attrs.apply_sgr(&[Some(22), Some(39)]);
        assert!(!attrs.bold());
        assert!(attrs.underline());
        assert_eq!(attrs.fg, Color::Default);

        attrs.apply_sgr(&[]);
        assert!(attrs.is_default());
    }

    #[test]
    fn test_sgr_missing_param_resets() {
        let mut attrs = CellAttrs::default();
        attrs.apply_sgr(&[Some(1), None, Some(32)]);
        assert!(!attrs.bold());
        assert_eq!(attrs.fg, Color::GREEN);
    }

    #[test]
    fn test_restore_without_save_goes_home() {
        let mut state = TerminalState::new();
        state.current_attrs.flags |= AttrFlags::BOLD;
        assert_eq!(state.restore_cursor(), CursorState::default());
        assert!(state.current_attrs.is_default());
    }

    #[test]
    fn test_color_names() {
        assert_eq!(Color::MAGENTA.name(), Some("magenta"));
        assert_eq!(Color::Default.name(), None);
    }
}
