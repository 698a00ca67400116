//! bview - Terminal viewer for binary files
//!
//! This library provides the viewer core used by the `bview` binary:
//! byte source, render modes, raw terminal handling and the input loop.

pub mod app;
pub mod buffer;
pub mod error;
pub mod logging;
pub mod terminal;
pub mod ui;

pub use error::{Result, ViewerError};
