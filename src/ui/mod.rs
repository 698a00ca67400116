mod frame;
mod mode;

pub use frame::render_frame;
pub use mode::{CursorSlot, ModeCursors, ViewMode};
