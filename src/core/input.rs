//! Keystroke encoding and the outbound input buffer
//!
//! Characters become bytes according to the send-side newline mode and the
//! terminal's cursor key mode. Encoded bytes queue in a bounded
//! [`InputBuffer`] until the caller drains it.

use crate::config::NewlineMode;
use crate::core::term::TerminalModes;

/// Space kept free in the buffer; a character is refused once this close to
/// capacity
pub const HEADROOM: usize = 2;

/// A key press
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Up,
    Down,
    Right,
    Left,
}

/// Key encoder
pub struct InputEncoder;

impl InputEncoder {
    /// Encode a typed character. Return expands per the send mode (or to
    /// CR LF when the remote enabled new-line mode); everything else passes
    /// through as UTF-8.
    pub fn encode_char(ch: char, send: NewlineMode, modes: &TerminalModes) -> Vec<u8> {
        if ch == '\r' {
            if modes.linefeed_newline {
                return b"\r\n".to_vec();
            }
            return send.as_bytes().to_vec();
        }
        let mut buf = [0u8; 4];
        ch.encode_utf8(&mut buf).as_bytes().to_vec()
    }

    pub fn encode_key(key: Key, send: NewlineMode, modes: &TerminalModes) -> Vec<u8> {
        let arrow = |c: u8| {
            if modes.application_cursor {
                vec![0x1b, b'O', c]
            } else {
                vec![0x1b, b'[', c]
            }
        };

        match key {
            Key::Char(ch) => Self::encode_char(ch, send, modes),
            Key::Up => arrow(b'A'),
            Key::Down => arrow(b'B'),
            Key::Right => arrow(b'C'),
            Key::Left => arrow(b'D'),
        }
    }
}

/// Bounded queue of bytes waiting to go to the remote end
#[derive(Debug, Clone)]
pub struct InputBuffer {
    bytes: Vec<u8>,
    capacity: usize,
}

impl InputBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            bytes: Vec::with_capacity(capacity),
            capacity,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes that can still be queued
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.bytes.len())
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        self.bytes.truncate(capacity);
    }

    /// Queue an encoded keystroke. Refused (returns false) once the buffer
    /// is within [`HEADROOM`] bytes of capacity or the encoding does not fit.
    pub fn push(&mut self, encoded: &[u8]) -> bool {
        let remaining = self.remaining();
        if remaining <= HEADROOM || encoded.len() > remaining {
            tracing::debug!("Input buffer full, dropping {} bytes", encoded.len());
            return false;
        }
        self.bytes.extend_from_slice(encoded);
        true
    }

    /// Queue a terminal report; uses the headroom as well
    pub fn push_report(&mut self, bytes: &[u8]) -> bool {
        if bytes.len() > self.remaining() {
            tracing::debug!("No room for report of {} bytes", bytes.len());
            return false;
        }
        self.bytes.extend_from_slice(bytes);
        true
    }

    /// Copy out the queued bytes, emptying the buffer if `clear` is set
    pub fn take(&mut self, clear: bool) -> Vec<u8> {
        if clear {
            std::mem::take(&mut self.bytes)
        } else {
            self.bytes.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_return_per_send_mode() {
        let modes = TerminalModes::default();
        assert_eq!(InputEncoder::encode_char('\r', NewlineMode::Cr, &modes), b"\r");
        assert_eq!(InputEncoder::encode_char('\r', NewlineMode::Lf, &modes), b"\n");
        assert_eq!(InputEncoder::encode_char('\r', NewlineMode::CrLf, &modes), b"\r\n");
    }

    #[test]
    fn test_passthrough() {
        let modes = TerminalModes::default();
        assert_eq!(InputEncoder::encode_char('a', NewlineMode::CrLf, &modes), b"a");
        assert_eq!(InputEncoder::encode_char('\n', NewlineMode::CrLf, &modes), b"\n");
        assert_eq!(InputEncoder::encode_char('\x08', NewlineMode::Cr, &modes), b"\x08");
        assert_eq!(
            InputEncoder::encode_char('é', NewlineMode::Cr, &modes),
            "é".as_bytes()
        );
    }

    #[test]
    fn test_newline_mode_overrides_send() {
        let modes = TerminalModes {
            linefeed_newline: true,
            ..TerminalModes::default()
        };
        assert_eq!(InputEncoder::encode_char('\r', NewlineMode::Cr, &modes), b"\r\n");
    }

    #[test]
    fn test_cursor_keys() {
        let mut modes = TerminalModes::default();
        assert_eq!(InputEncoder::encode_key(Key::Up, NewlineMode::Cr, &modes), b"\x1b[A");
        modes.application_cursor = true;
        assert_eq!(InputEncoder::encode_key(Key::Left, NewlineMode::Cr, &modes), b"\x1bOD");
    }

    #[test]
    fn test_backpressure() {
        let mut buffer = InputBuffer::new(6);
        assert!(buffer.push(b"a"));
        assert!(buffer.push(b"b"));
        assert!(buffer.push(b"c"));
        assert!(buffer.push(b"d"));
        // 2 bytes left: refused
        assert!(!buffer.push(b"e"));
        assert_eq!(buffer.take(false), b"abcd");
        assert_eq!(buffer.len(), 4);
    }

    #[test]
    fn test_encoding_must_fit() {
        let mut buffer = InputBuffer::new(5);
        assert!(buffer.push(b"ab"));
        assert!(!buffer.push("😀".as_bytes()));
        assert!(buffer.push(b"\r\n"));
        assert_eq!(buffer.remaining(), 1);
    }

    #[test]
    fn test_take_and_clear() {
        let mut buffer = InputBuffer::new(16);
        buffer.push(b"hi");
        assert_eq!(buffer.take(true), b"hi");
        assert!(buffer.is_empty());
        assert!(buffer.push_report(b"\x1b[1;1R"));
    }
}
