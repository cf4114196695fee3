//! GPU side of the batching renderer.
//!
//! [`BatchRenderer`] turns the batches recorded by [`crate::batch::Batcher`]
//! into one instanced draw call each.
//!
//! Convention:
//! - Sprite geometry is in logical pixels (bottom-left origin, +Y up).
//! - The vertex shader applies an orthographic `transform_mat` uniform.

mod batch_renderer;
mod common;
mod ctx;

pub use batch_renderer::{BatchRenderer, RenderStats};
pub use ctx::{RenderCtx, RenderTarget};
