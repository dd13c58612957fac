//! User interface rendering.
//!
//! - **renderer**: crossterm renderer for a [`GridSink`](crate::core::term::GridSink)
//!   and a plain debug dump

pub mod renderer;

pub use renderer::{DebugRenderer, Renderer};
