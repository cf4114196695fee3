//! Batched immediate-mode sprite accumulation.
//!
//! Callers append sprites during a frame; the [`Batcher`] groups consecutive
//! sprites that share a shader program into [`Batch`]es of bounded size.
//! A batch is closed when it is full or when the shader changes, and the
//! GPU side (`render::BatchRenderer`) issues one draw call per batch.
//!
//! Attributes are kept as parallel sequences (positions, dimensions, colors,
//! UVs); all sequences of a batch always have the same length.

mod batcher;
mod sprite;

pub use batcher::{Batch, BatchError, BatchStats, Batcher, DEFAULT_MAX_BATCH_SIZE};
pub use sprite::{ShaderKind, Sprite};
