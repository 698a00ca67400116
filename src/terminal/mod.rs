//! Terminal control: geometry tracking, input thread and raw mode lifecycle.

mod geometry;
mod input;
mod raw;

pub use geometry::{Geometry, GeometryCell, ResizeHandler};
pub use input::{EventPump, INPUT_TIMEOUT, Input, KeySource, key_byte};
pub use raw::{RawState, RawTerminal, restore_on_panic};
