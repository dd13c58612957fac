//! VT sequence tokenizer
//!
//! Splits inbound text into literal runs, C0 controls and escape sequences.
//! Literal runs go to the display in bulk; escape sequences accumulate until
//! the recognizer accepts or rejects them. A sequence cut off at the end of a
//! chunk stays pending until the next `feed`.

use tracing::debug;

use super::command::{self, Recognition, Response, ESC};
use super::screen::Screen;
use super::sink::DisplaySink;
use crate::config::NewlineMode;

/// Tokenizer state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ParserState {
    #[default]
    Idle,
    /// ESC seen, collecting a sequence
    Accumulating,
}

/// What a line-break character did, so its partner can complete it
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Break {
    Newline,
    CarriageReturn,
    LineFeed,
}

/// Parser state machine
#[derive(Debug, Default)]
pub struct VtParser {
    state: ParserState,
    pending: String,
    literal: String,
    /// Previous character if it was `\r` or `\n`
    last_break: Option<(char, Break)>,
}

impl VtParser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Sequence collected so far (empty when idle)
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Feed a chunk of text; returns reports to send back
    pub fn feed<S: DisplaySink + ?Sized>(
        &mut self,
        text: &str,
        screen: &mut Screen<'_, S>,
    ) -> Vec<Response> {
        let mut responses = Vec::new();
        for ch in text.chars() {
            if let Some(response) = self.feed_char(ch, screen) {
                responses.push(response);
            }
        }
        self.flush_literal(screen);
        responses
    }

    fn feed_char<S: DisplaySink + ?Sized>(
        &mut self,
        ch: char,
        screen: &mut Screen<'_, S>,
    ) -> Option<Response> {
        let last_break = self.last_break.take();

        if self.state == ParserState::Accumulating {
            return self.accumulate(ch, screen);
        }

        match ch {
            ESC => {
                self.flush_literal(screen);
                self.pending.clear();
                self.pending.push(ESC);
                self.state = ParserState::Accumulating;
            }
            '\r' | '\n' => {
                self.flush_literal(screen);
                self.line_break(ch, last_break, screen);
            }
            // VT, FF
            '\x0b' | '\x0c' => {
                self.flush_literal(screen);
                screen.line_feed();
            }
            '\x08' => {
                self.flush_literal(screen);
                screen.backspace();
            }
            '\t' => {
                self.flush_literal(screen);
                screen.horizontal_tab();
            }
            c if c.is_control() => {
                // BEL, NUL, DEL and friends
                self.flush_literal(screen);
            }
            c => self.literal.push(c),
        }
        None
    }

    fn accumulate<S: DisplaySink + ?Sized>(
        &mut self,
        ch: char,
        screen: &mut Screen<'_, S>,
    ) -> Option<Response> {
        if ch == ESC {
            debug!("Sequence {:?} restarted by ESC", self.pending);
            self.pending.clear();
            self.pending.push(ESC);
            return None;
        }

        // A control character cuts the sequence short and then runs as usual
        if ch.is_control() {
            debug!("Sequence {:?} interrupted by {:?}", self.pending, ch);
            self.reset();
            return self.feed_char(ch, screen);
        }

        self.pending.push(ch);
        match command::recognize(&self.pending) {
            Recognition::Incomplete => None,
            Recognition::Complete(cmd) => {
                self.reset();
                command::execute(&cmd, screen)
            }
            Recognition::Invalid => {
                debug!("Discarding malformed sequence {:?}", self.pending);
                self.reset();
                None
            }
        }
    }

    fn line_break<S: DisplaySink + ?Sized>(
        &mut self,
        ch: char,
        last_break: Option<(char, Break)>,
        screen: &mut Screen<'_, S>,
    ) {
        // Second half of a \r\n or \n\r pair: finish the newline
        if let Some((first, effect)) = last_break {
            if first != ch {
                match effect {
                    Break::Newline => {}
                    Break::CarriageReturn => screen.line_feed(),
                    Break::LineFeed => screen.carriage_return(),
                }
                return;
            }
        }

        let lnm = screen.state.modes.linefeed_newline;
        let effect = match (ch, screen.settings.newline_recv) {
            ('\r', NewlineMode::Cr) => Break::Newline,
            ('\r', _) => Break::CarriageReturn,
            ('\n', NewlineMode::Lf) => Break::Newline,
            ('\n', _) if lnm => Break::Newline,
            _ => Break::LineFeed,
        };

        match effect {
            Break::Newline => screen.newline(),
            Break::CarriageReturn => screen.carriage_return(),
            Break::LineFeed => screen.line_feed(),
        }
        self.last_break = Some((ch, effect));
    }

    fn flush_literal<S: DisplaySink + ?Sized>(&mut self, screen: &mut Screen<'_, S>) {
        if !self.literal.is_empty() {
            screen.write_text(&self.literal);
            self.literal.clear();
        }
    }

    fn reset(&mut self) {
        self.pending.clear();
        self.state = ParserState::Idle;
    }
}
