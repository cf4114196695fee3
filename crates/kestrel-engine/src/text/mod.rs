//! Bitmap-font text.
//!
//! A [`BitmapFont`] is a glyph atlas texture plus per-character metrics.
//! [`TextLayout`] turns a string into glyph sprites by advancing a cursor
//! with those metrics and submits them to the batcher as textured sprites.

mod atlas;
mod font;
mod layout;

pub use atlas::ShelfPacker;
pub use font::{BitmapFont, FontLoadError, GlyphMetrics};
pub use layout::{GlyphSprite, TextLayout};
