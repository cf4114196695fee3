//! Window + runtime loop.
//!
//! Owns the `winit` event loop and windows, and wires each window to its
//! GPU context and frame timer.

mod runtime;

pub use runtime::{Runtime, RuntimeConfig, RuntimeCtx};
