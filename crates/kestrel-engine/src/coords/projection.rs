use glam::Mat4;

use super::Viewport;

/// Orthographic projection covering `viewport`, origin bottom-left, +Y up.
///
/// `depth` is the full z range; sprites may use `z` in `[-depth/2, depth/2]`.
/// Degenerate viewports are treated as 1x1 so the matrix stays invertible.
pub fn orthographic(viewport: Viewport, depth: f32) -> Mat4 {
    let w = viewport.width.max(1.0);
    let h = viewport.height.max(1.0);
    let half = (depth.abs() * 0.5).max(f32::EPSILON);
    Mat4::orthographic_rh(0.0, w, 0.0, h, -half, half)
}
