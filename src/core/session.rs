//! Session management
//!
//! A session owns the terminal state, tokenizer, settings, display sink and
//! input buffer. Everything runs on the owning thread; other threads hand
//! output over through an [`OutputHandle`] and the owner applies it with
//! [`Session::process_output`].

use std::sync::mpsc::{self, Receiver, Sender, TryRecvError};

use thiserror::Error;
use tracing::debug;

use super::input::{InputBuffer, InputEncoder, Key};
use super::term::{hex, DisplaySink, Screen, TerminalState, VtParser};
use crate::config::{ConfigError, Settings};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Session has been dropped")]
    Closed,
}

/// Sends output to a session from any thread
#[derive(Clone, Debug)]
pub struct OutputHandle {
    tx: Sender<Vec<u8>>,
}

impl OutputHandle {
    pub fn output(&self, text: &str) -> Result<(), SessionError> {
        self.output_bytes(text.as_bytes())
    }

    pub fn output_bytes(&self, bytes: &[u8]) -> Result<(), SessionError> {
        self.tx
            .send(bytes.to_vec())
            .map_err(|_| SessionError::Closed)
    }
}

/// A terminal session
pub struct Session<S: DisplaySink> {
    /// Terminal state
    pub state: TerminalState,
    settings: Settings,
    /// VT parser
    parser: VtParser,
    sink: S,
    input: InputBuffer,
    /// Trailing bytes of an incomplete UTF-8 character
    utf8_remainder: Vec<u8>,
    output_tx: Sender<Vec<u8>>,
    output_rx: Receiver<Vec<u8>>,
}

impl<S: DisplaySink> Session<S> {
    /// Create a new session drawing on `sink`
    pub fn new(sink: S, settings: Settings) -> Result<Self, ConfigError> {
        settings.validate()?;
        let (output_tx, output_rx) = mpsc::channel();
        Ok(Self {
            state: TerminalState::new(),
            input: InputBuffer::new(settings.input_capacity),
            settings,
            parser: VtParser::new(),
            sink,
            utf8_remainder: Vec::new(),
            output_tx,
            output_rx,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Replace the settings; they apply to everything fed afterwards
    pub fn set_settings(&mut self, settings: Settings) -> Result<(), ConfigError> {
        settings.validate()?;
        if settings.input_capacity != self.input.capacity() {
            self.input.set_capacity(settings.input_capacity);
        }
        let resized = settings.terminal_width != self.settings.terminal_width;
        self.settings = settings;

        // Keep the cursor inside a narrower terminal
        if resized {
            let cursor = self.state.cursor;
            self.screen().move_to(cursor.col, cursor.row);
        }
        Ok(())
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn parser(&self) -> &VtParser {
        &self.parser
    }

    fn screen(&mut self) -> Screen<'_, S> {
        Screen::new(&mut self.state, &self.settings, &mut self.sink)
    }

    /// Type text. Returns how many characters were accepted; input stops at
    /// the first character the buffer refuses.
    pub fn input(&mut self, text: &str) -> usize {
        let mut accepted = 0;
        for ch in text.chars() {
            let encoded = InputEncoder::encode_char(ch, self.settings.newline_send, &self.state.modes);
            if !self.input.push(&encoded) {
                break;
            }
            accepted += 1;
        }

        if self.settings.local_echo && accepted > 0 {
            let echoed: String = text.chars().take(accepted).collect();
            let echoed = echoed.replace('\r', "\r\n");
            self.output(&echoed);
        }
        accepted
    }

    /// Press a key; false if the buffer refused it
    pub fn input_key(&mut self, key: Key) -> bool {
        let encoded = InputEncoder::encode_key(key, self.settings.newline_send, &self.state.modes);
        self.input.push(&encoded)
    }

    /// Copy out queued input bytes, emptying the queue if `clear` is set
    pub fn take_input(&mut self, clear: bool) -> Vec<u8> {
        self.input.take(clear)
    }

    pub fn input_buffer(&self) -> &InputBuffer {
        &self.input
    }

    /// Interpret terminal output
    pub fn output(&mut self, text: &str) {
        if self.settings.hex_output {
            self.write_hex(text.as_bytes());
            return;
        }

        let mut screen = Screen::new(&mut self.state, &self.settings, &mut self.sink);
        let responses = self.parser.feed(text, &mut screen);
        for response in responses {
            self.input.push_report(&response.to_bytes());
        }
    }

    /// Interpret raw output bytes. UTF-8 characters split across calls are
    /// reassembled; invalid bytes become U+FFFD.
    pub fn output_bytes(&mut self, bytes: &[u8]) {
        if self.settings.hex_output {
            self.write_hex(bytes);
            return;
        }

        let mut data = std::mem::take(&mut self.utf8_remainder);
        data.extend_from_slice(bytes);

        let mut rest = data.as_slice();
        let mut text = String::with_capacity(rest.len());
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    // Prefix up to valid_up_to always decodes
                    text.push_str(std::str::from_utf8(valid).unwrap_or_default());
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.utf8_remainder = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }

        self.output(&text);
    }

    fn write_hex(&mut self, bytes: &[u8]) {
        let mut screen = self.screen();
        for row in hex::format_rows(bytes) {
            screen.write_text(&row);
            screen.newline();
        }
    }

    /// Handle for writing output from other threads
    pub fn output_handle(&self) -> OutputHandle {
        OutputHandle {
            tx: self.output_tx.clone(),
        }
    }

    /// Apply output queued through [`OutputHandle`]s (non-blocking).
    /// Returns true if anything was processed.
    pub fn process_output(&mut self) -> bool {
        let mut all_data: Vec<Vec<u8>> = Vec::new();
        loop {
            match self.output_rx.try_recv() {
                Ok(data) => all_data.push(data),
                // The session holds a sender itself, so the channel never
                // disconnects while we are here
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        let processed = !all_data.is_empty();
        for data in all_data {
            debug!("Processing {} queued bytes", data.len());
            self.output_bytes(&data);
        }
        processed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NewlineMode;
    use crate::core::term::{Color, GridSink, ParserState};

    fn session() -> Session<GridSink> {
        Session::new(GridSink::new(), Settings::default()).unwrap()
    }

    #[test]
    fn test_rejects_invalid_settings() {
        let settings = Settings {
            terminal_width: 0,
            ..Settings::default()
        };
        assert!(matches!(
            Session::new(GridSink::new(), settings),
            Err(ConfigError::ZeroWidth)
        ));

        let mut s = session();
        let bad = Settings {
            tab_size: 0,
            ..Settings::default()
        };
        assert!(s.set_settings(bad).is_err());
        assert_eq!(s.settings().tab_size, 8);
    }

    #[test]
    fn test_input_encodes_return() {
        let mut s = session();
        s.set_settings(Settings {
            newline_send: NewlineMode::CrLf,
            ..Settings::default()
        })
        .unwrap();
        assert_eq!(s.input("ls\r"), 3);
        assert_eq!(s.take_input(true), b"ls\r\n");
        assert!(s.take_input(false).is_empty());
    }

    #[test]
    fn test_input_truncates_at_capacity() {
        let mut s = Session::new(
            GridSink::new(),
            Settings {
                input_capacity: 8,
                ..Settings::default()
            },
        )
        .unwrap();
        assert_eq!(s.input("abcdefghij"), 6);
        assert_eq!(s.take_input(false), b"abcdef");
        assert_eq!(s.input("x"), 0);
        s.take_input(true);
        assert_eq!(s.input("x"), 1);
    }

    #[test]
    fn test_local_echo() {
        let mut s = Session::new(
            GridSink::new(),
            Settings {
                local_echo: true,
                ..Settings::default()
            },
        )
        .unwrap();
        s.input("hi\rthere");
        assert_eq!(s.sink().text(), "hi\nthere");
        assert_eq!(s.take_input(true), b"hi\rthere");
    }

    #[test]
    fn test_cursor_keys_follow_mode() {
        let mut s = session();
        assert!(s.input_key(Key::Up));
        s.output("\x1b[?1h");
        assert!(s.input_key(Key::Up));
        assert_eq!(s.take_input(true), b"\x1b[A\x1bOA");
    }

    #[test]
    fn test_cursor_report_is_queued() {
        let mut s = session();
        s.output("abc\x1b[6n");
        assert_eq!(s.take_input(true), b"\x1b[1;4R");
    }

    #[test]
    fn test_hex_mode_bypasses_parser() {
        let mut s = Session::new(
            GridSink::new(),
            Settings {
                hex_output: true,
                ..Settings::default()
            },
        )
        .unwrap();
        s.output_bytes(b"ABC");
        let expected = format!("41 42 43{} | ABC", " ".repeat(3 * 13));
        assert_eq!(s.sink().line_text(0), expected);
        assert_eq!(s.sink().line_count(), 2);
        assert_eq!((s.state.cursor.col, s.state.cursor.row), (0, 1));

        s.output("\x1b[31m");
        assert_eq!(s.state.current_attrs.fg, Color::Default);
        assert_eq!(s.parser().state(), ParserState::Idle);
        assert!(s.sink().line_text(1).starts_with("1B 5B 33 31 6D "));
    }

    #[test]
    fn test_utf8_split_across_chunks() {
        let mut s = session();
        let bytes = "héllo".as_bytes();
        s.output_bytes(&bytes[..2]);
        s.output_bytes(&bytes[2..]);
        assert_eq!(s.sink().line_text(0), "héllo");

        s.output_bytes(b"\xffz");
        assert_eq!(s.sink().line_text(0), "héllo\u{fffd}z");
    }

    #[test]
    fn test_output_from_other_thread() {
        let mut s = session();
        let handle = s.output_handle();
        let worker = std::thread::spawn(move || {
            handle.output("\x1b[32mgreen").unwrap();
            handle.output_bytes(b"\r\nnext").unwrap();
        });
        worker.join().unwrap();

        assert!(s.process_output());
        assert_eq!(s.sink().text(), "green\nnext");
        assert_eq!(s.sink().cell(0, 0).unwrap().attrs.fg, Color::GREEN);
        assert!(!s.process_output());
    }

    #[test]
    fn test_same_width_keeps_pending_wrap() {
        let mut s = Session::new(
            GridSink::new(),
            Settings {
                terminal_width: 4,
                ..Settings::default()
            },
        )
        .unwrap();
        s.output("abcd");
        s.set_settings(Settings {
            terminal_width: 4,
            local_echo: true,
            ..Settings::default()
        })
        .unwrap();
        assert!(s.state.cursor.wrap_pending);
        s.output("X");
        assert_eq!(s.sink().text(), "abcd\nX");
    }

    #[test]
    fn test_narrowing_clamps_cursor() {
        let mut s = session();
        s.output("0123456789");
        s.set_settings(Settings {
            terminal_width: 5,
            ..Settings::default()
        })
        .unwrap();
        assert_eq!(s.state.cursor.col, 4);
    }
}
