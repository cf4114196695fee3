//! Coordinate types shared by the batcher, text layout and renderers.
//!
//! World space:
//! - Logical pixels (DPI-aware)
//! - Origin bottom-left
//! - +X right, +Y up
//!
//! The batch renderer maps world space to clip space with an orthographic
//! projection built from the viewport.

mod projection;
mod uv;
mod viewport;

pub use glam::{Mat4, Vec2, Vec4};
pub use projection::orthographic;
pub use uv::UvRect;
pub use viewport::Viewport;
