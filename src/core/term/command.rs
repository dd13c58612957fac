//! Escape sequence recognizer and command interpreter
//!
//! [`recognize`] is asked about the pending sequence after every character;
//! once it reports [`Recognition::Complete`], [`execute`] applies the command
//! to the screen.

use super::screen::{EraseMode, Screen};
use super::sink::DisplaySink;

pub const ESC: char = '\x1b';

/// Longest sequence accepted before giving up on it
pub const MAX_SEQUENCE_LEN: usize = 64;

/// Response that needs to be sent back to the remote end
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Cursor position report: ESC [ row ; col R
    CursorPosition(usize, usize),
    /// Status report: terminal OK
    StatusOk,
}

impl Response {
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            Response::CursorPosition(row, col) => format!("\x1b[{};{}R", row, col).into_bytes(),
            Response::StatusOk => b"\x1b[0n".to_vec(),
        }
    }
}

/// Result of looking at a pending sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recognition {
    /// Needs more characters
    Incomplete,
    Complete(Command),
    /// Cannot become a valid sequence; discard
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CursorUp(u16),
    CursorDown(u16),
    CursorForward(u16),
    CursorBackward(u16),
    /// CNL
    CursorNextLine(u16),
    /// CPL
    CursorPrevLine(u16),
    /// CHA (1-based)
    CursorColumn(u16),
    /// CUP / HVP (1-based)
    CursorPosition { row: u16, col: u16 },
    EraseInDisplay(EraseMode),
    EraseInLine(EraseMode),
    /// SGR
    SetGraphics(Vec<Option<u16>>),
    SaveCursor,
    RestoreCursor,
    /// DSR
    DeviceStatus(u16),
    SetMode { params: Vec<u16>, private: bool, enable: bool },
    /// DECKPAM (true) / DECKPNM (false)
    Keypad(bool),
    Home,
    /// RIS
    Reset,
    /// Charset designation, SS3, line size: accepted without effect
    Ignored(String),
    /// Well-formed but unsupported
    Unsupported(String),
}

/// Classify a pending sequence starting with ESC
pub fn recognize(seq: &str) -> Recognition {
    let mut chars = seq.chars();
    if chars.next() != Some(ESC) {
        return Recognition::Invalid;
    }
    let Some(intro) = chars.next() else {
        return Recognition::Incomplete;
    };

    let command = match intro {
        '[' => return recognize_csi(&seq[2..]),
        '(' | ')' | 'O' | '#' => {
            return match chars.next() {
                None => Recognition::Incomplete,
                Some(c) if c.is_control() => Recognition::Invalid,
                Some(_) => Recognition::Complete(Command::Ignored(seq.to_string())),
            };
        }
        '7' => Command::SaveCursor,
        '8' => Command::RestoreCursor,
        // VT52 cursor movement
        'A' => Command::CursorUp(1),
        'B' => Command::CursorDown(1),
        'C' => Command::CursorForward(1),
        'D' => Command::CursorBackward(1),
        'H' => Command::Home,
        'J' => Command::EraseInDisplay(EraseMode::ToEnd),
        'K' => Command::EraseInLine(EraseMode::ToEnd),
        '=' => Command::Keypad(true),
        '>' => Command::Keypad(false),
        'c' => Command::Reset,
        _ => return Recognition::Invalid,
    };

    if chars.next().is_some() {
        return Recognition::Invalid;
    }
    Recognition::Complete(command)
}

fn recognize_csi(body: &str) -> Recognition {
    for (i, ch) in body.char_indices() {
        match ch {
            // Parameter and intermediate bytes
            '\x20'..='\x3f' => {}
            '\x40'..='\x7e' => {
                if i + 1 != body.len() {
                    return Recognition::Invalid;
                }
                return Recognition::Complete(parse_csi(&body[..i], ch));
            }
            _ => return Recognition::Invalid,
        }
    }

    if body.len() + 2 > MAX_SEQUENCE_LEN {
        Recognition::Invalid
    } else {
        Recognition::Incomplete
    }
}

/// Split `;`-separated parameters. Empty or non-numeric ones are `None`;
/// digit runs saturate at `u16::MAX`.
fn parse_params(raw: &str) -> Vec<Option<u16>> {
    if raw.is_empty() {
        return Vec::new();
    }
    raw.split(';').map(parse_param).collect()
}

fn parse_param(p: &str) -> Option<u16> {
    if p.is_empty() || !p.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(p.bytes().fold(0u16, |acc, b| {
        acc.saturating_mul(10).saturating_add(u16::from(b - b'0'))
    }))
}

fn parse_csi(raw: &str, final_char: char) -> Command {
    let (private, raw_params) = match raw.strip_prefix('?') {
        Some(rest) => (true, rest),
        None => (false, raw),
    };

    let has_intermediate = raw_params.contains(|c: char| ('\x20'..='\x2f').contains(&c));
    if has_intermediate {
        return Command::Unsupported(format!("CSI {}{}", raw, final_char));
    }

    let params = parse_params(raw_params);
    let param = |i: usize| params.get(i).copied().flatten();
    let count = param(0).unwrap_or(1).max(1);

    match (private, final_char) {
        (false, 'A') => Command::CursorUp(count),
        (false, 'B') => Command::CursorDown(count),
        (false, 'C') => Command::CursorForward(count),
        (false, 'D') => Command::CursorBackward(count),
        (false, 'E') => Command::CursorNextLine(count),
        (false, 'F') => Command::CursorPrevLine(count),
        (false, 'G') => Command::CursorColumn(count),
        (false, 'H') | (false, 'f') => Command::CursorPosition {
            row: count,
            col: param(1).unwrap_or(1).max(1),
        },
        (false, 'J') => match EraseMode::from_param(param(0).unwrap_or(0)) {
            Some(mode) => Command::EraseInDisplay(mode),
            None => Command::Unsupported(format!("CSI {}J", raw)),
        },
        (false, 'K') => match EraseMode::from_param(param(0).unwrap_or(0)) {
            Some(mode) => Command::EraseInLine(mode),
            None => Command::Unsupported(format!("CSI {}K", raw)),
        },
        (false, 'm') => Command::SetGraphics(params),
        (false, 's') => Command::SaveCursor,
        (false, 'u') => Command::RestoreCursor,
        (false, 'n') => Command::DeviceStatus(param(0).unwrap_or(0)),
        (_, 'h') | (_, 'l') => Command::SetMode {
            params: params.iter().map(|p| p.unwrap_or(0)).collect(),
            private,
            enable: final_char == 'h',
        },
        _ => Command::Unsupported(format!("CSI {}{}", raw, final_char)),
    }
}

/// Apply a recognized command
pub fn execute<S: DisplaySink + ?Sized>(
    command: &Command,
    screen: &mut Screen<'_, S>,
) -> Option<Response> {
    match command {
        Command::CursorUp(n) => screen.cursor_up(usize::from(*n)),
        Command::CursorDown(n) => screen.cursor_down(usize::from(*n)),
        Command::CursorForward(n) => screen.cursor_forward(usize::from(*n)),
        Command::CursorBackward(n) => screen.cursor_backward(usize::from(*n)),
        Command::CursorNextLine(n) => {
            screen.cursor_down(usize::from(*n));
            screen.carriage_return();
        }
        Command::CursorPrevLine(n) => {
            screen.cursor_up(usize::from(*n));
            screen.carriage_return();
        }
        Command::CursorColumn(col) => {
            let row = screen.state.cursor.row;
            screen.move_to(usize::from(*col).saturating_sub(1), row);
        }
        Command::CursorPosition { row, col } => {
            screen.cursor_position(usize::from(*row), usize::from(*col));
        }
        Command::Home => screen.move_to(0, 0),
        Command::EraseInDisplay(mode) => screen.erase_in_display(*mode),
        Command::EraseInLine(mode) => screen.erase_in_line(*mode),
        Command::SetGraphics(params) => screen.state.current_attrs.apply_sgr(params),
        Command::SaveCursor => screen.save_cursor(),
        Command::RestoreCursor => screen.restore_cursor(),
        Command::DeviceStatus(5) => return Some(Response::StatusOk),
        Command::DeviceStatus(6) => {
            let cursor = screen.state.cursor;
            return Some(Response::CursorPosition(cursor.row + 1, cursor.col + 1));
        }
        Command::DeviceStatus(other) => {
            tracing::debug!("Unsupported device status request: {}", other);
        }
        Command::SetMode {
            params,
            private,
            enable,
        } => {
            for &p in params {
                if *private {
                    screen.state.modes.set_private_mode(p, *enable);
                } else {
                    screen.state.modes.set_mode(p, *enable);
                }
            }
        }
        Command::Keypad(application) => screen.state.modes.application_keypad = *application,
        Command::Reset => screen.reset(),
        Command::Ignored(seq) => {
            tracing::trace!("Ignoring sequence {:?}", seq);
        }
        Command::Unsupported(seq) => {
            tracing::debug!("Unknown sequence: {}", seq);
        }
    }
    None
}
