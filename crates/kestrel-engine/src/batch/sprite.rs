use crate::coords::{UvRect, Vec2, Vec4};
use crate::paint::Color;
use crate::texture::TextureId;

/// Shader program a sprite is drawn with.
///
/// Textured sprites with different textures cannot share a draw call, so the
/// texture is part of the program identity.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum ShaderKind {
    /// Flat vertex color.
    Color,
    /// Texture sampled and multiplied by the sprite color.
    Texture(TextureId),
}

impl ShaderKind {
    #[inline]
    pub fn texture(self) -> Option<TextureId> {
        match self {
            ShaderKind::Color => None,
            ShaderKind::Texture(id) => Some(id),
        }
    }
}

/// One point sprite: an axis-aligned quad centered on `position`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Sprite {
    /// Center in world space; `w` is passed through to clip space.
    pub position: Vec4,
    /// Width and height in logical pixels.
    pub size: Vec2,
    pub color: Color,
    /// Ignored by [`ShaderKind::Color`].
    pub uv: UvRect,
}

impl Sprite {
    /// Flat-colored sprite at `(x, y)` on the z = 0 plane.
    pub fn colored(position: Vec2, size: Vec2, color: Color) -> Self {
        Self {
            position: position.extend(0.0).extend(1.0),
            size,
            color,
            uv: UvRect::FULL,
        }
    }

    /// Textured sprite at `(x, y)` on the z = 0 plane, tinted by `tint`.
    pub fn textured(position: Vec2, size: Vec2, uv: UvRect, tint: Color) -> Self {
        Self {
            position: position.extend(0.0).extend(1.0),
            size,
            color: tint,
            uv,
        }
    }
}
