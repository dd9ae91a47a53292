mod frame_loop;
mod runtime;

pub use frame_loop::{FrameCallback, FrameHandle, FrameLoop};
pub use runtime::{Runtime, Timing};
