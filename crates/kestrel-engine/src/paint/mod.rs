//! Color model shared by the batcher and renderers.

mod color;

pub use color::Color;
