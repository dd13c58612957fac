//! Core terminal emulation components.
//!
//! - **term**: VT100 terminal state, escape sequence tokenizer and interpreter
//! - **input**: keystroke encoding and the bounded outbound buffer
//! - **session**: one terminal session tying the pieces to a display sink
//!
//! # Architecture
//!
//! ```text
//! Session
//! ├── InputBuffer (encoded keystrokes + reports)
//! ├── Settings
//! ├── VtParser (literal runs / controls / escape sequences)
//! │   └── command::recognize + command::execute
//! ├── TerminalState (cursor, saved cursor, attributes, modes)
//! └── DisplaySink (text grid supplied by the host)
//! ```

pub mod input;
pub mod session;
pub mod term;
