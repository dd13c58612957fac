//! vtterm - a VT100 escape-sequence interpreter
//!
//! Feeds terminal output through a tokenizer and command interpreter that
//! drive an abstract text grid (the [`DisplaySink`]), and encodes keystrokes
//! into a bounded outbound buffer.
//!
//! ```
//! use vtterm::{GridSink, Session, Settings};
//!
//! let mut session = Session::new(GridSink::new(), Settings::default()).unwrap();
//! session.output("\x1b[31mHello\x1b[0m, world");
//! assert_eq!(session.sink().line_text(0), "Hello, world");
//! ```

pub mod config;
pub mod core;
pub mod ui;

pub use crate::config::{Config, ConfigError, NewlineMode, Settings};
pub use crate::core::input::{InputBuffer, InputEncoder, Key};
pub use crate::core::session::{OutputHandle, Session, SessionError};
pub use crate::core::term::{CellAttrs, Color, DisplaySink, GridSink, TerminalState};
