//! Time subsystem.
//!
//! Provides a frame timer without coupling to the runtime.
//! Intended usage:
//! - one `Timer` per window (or per render loop)
//! - call `update()` once per presented frame, or `single_step()` to advance
//!   by a fixed amount while debugging

mod timer;

pub use timer::{FrameTime, Timer, DEFAULT_FIXED_STEP, DEFAULT_MAX_DELTA};
