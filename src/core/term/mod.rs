//! VT100 terminal state, tokenizer and command interpreter.

pub mod command;
pub mod hex;
pub mod parser;
pub mod screen;
pub mod sink;
pub mod state;

pub use command::{Command, Recognition, Response};
pub use parser::{ParserState, VtParser};
pub use screen::{EraseMode, Screen};
pub use sink::{Cell, DisplaySink, GridSink, Line};
pub use state::{AttrFlags, CellAttrs, Color, CursorState, SavedCursor, TerminalModes, TerminalState};
