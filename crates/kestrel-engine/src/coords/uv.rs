use glam::Vec2;

/// Normalized texture region, `min` is the top-left texel corner.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UvRect {
    pub min: Vec2,
    pub max: Vec2,
}

impl UvRect {
    /// The whole texture.
    pub const FULL: UvRect = UvRect {
        min: Vec2::ZERO,
        max: Vec2::ONE,
    };

    #[inline]
    pub const fn new(u0: f32, v0: f32, u1: f32, v1: f32) -> Self {
        Self {
            min: Vec2::new(u0, v0),
            max: Vec2::new(u1, v1),
        }
    }

    /// Region of a `width` x `height` block at pixel `(x, y)` inside an atlas.
    pub fn from_atlas_region(
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        atlas_width: u32,
        atlas_height: u32,
    ) -> Self {
        let aw = atlas_width.max(1) as f32;
        let ah = atlas_height.max(1) as f32;
        let u0 = x as f32 / aw;
        let v0 = y as f32 / ah;
        Self::new(u0, v0, u0 + width as f32 / aw, v0 + height as f32 / ah)
    }

    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.min.x, self.min.y, self.max.x, self.max.y]
    }
}

impl Default for UvRect {
    fn default() -> Self {
        Self::FULL
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn atlas_region_is_normalized() {
        let uv = UvRect::from_atlas_region(64, 32, 16, 32, 256, 128);
        assert_eq!(uv, UvRect::new(0.25, 0.25, 0.3125, 0.5));
    }

    #[test]
    fn zero_atlas_size_does_not_divide_by_zero() {
        let uv = UvRect::from_atlas_region(1, 1, 1, 1, 0, 0);
        assert!(uv.min.is_finite() && uv.max.is_finite());
    }
}
