//! Contracts between the runtime loop and game code.
//!
//! The runtime owns windows, GPU contexts, timers and the error log; the
//! game implements [`App`] and receives them through [`FrameCtx`].

mod app;
mod ctx;

pub use app::{App, AppControl};
pub use ctx::{FrameCtx, WindowCtx};
