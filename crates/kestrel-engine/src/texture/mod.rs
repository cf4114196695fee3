//! CPU-side texture storage.
//!
//! Textures live here as premultiplied RGBA8 images keyed by [`TextureId`].
//! The batch renderer uploads them to the GPU on first use and re-uploads
//! when an image is replaced (tracked by a per-texture generation).

mod store;

pub use store::{TextureId, TextureImage, TextureLoadError, TextureStore};
