//! GPU types shared by the sprite pipelines.

use bytemuck::{Pod, Zeroable};

use crate::batch::Batch;
use crate::coords::Mat4;

pub(super) fn premul_alpha_blend() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::One,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

// ── projection uniform ────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct ProjectionUniform {
    pub transform_mat: [[f32; 4]; 4],
}

impl ProjectionUniform {
    pub(super) fn new(m: Mat4) -> Self {
        Self {
            transform_mat: m.to_cols_array_2d(),
        }
    }

    pub(super) fn min_binding_size() -> Option<wgpu::BufferSize> {
        wgpu::BufferSize::new(std::mem::size_of::<Self>() as u64)
    }
}

// ── quad vertex ───────────────────────────────────────────────────────────

#[repr(C)]
#[derive(Debug, Copy, Clone, Pod, Zeroable)]
pub(super) struct QuadVertex {
    pub corner: [f32; 2], // 0..1
}

impl QuadVertex {
    const ATTRS: [wgpu::VertexAttribute; 1] = wgpu::vertex_attr_array![0 => Float32x2];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<QuadVertex>() as u64,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRS,
        }
    }
}

pub(super) const QUAD_VERTICES: [QuadVertex; 4] = [
    QuadVertex { corner: [0.0, 0.0] },
    QuadVertex { corner: [1.0, 0.0] },
    QuadVertex { corner: [1.0, 1.0] },
    QuadVertex { corner: [0.0, 1.0] },
];

pub(super) const QUAD_INDICES: [u16; 6] = [0, 1, 2, 0, 2, 3];

// ── sprite instance ───────────────────────────────────────────────────────

/// One sprite as the shaders read it, interleaved from a batch's parallel
/// attribute sequences.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub(super) struct SpriteInstance {
    pub position: [f32; 4],
    pub size: [f32; 2],
    pub color: [f32; 4],
    pub uv: [f32; 4],
}

impl SpriteInstance {
    const ATTRS: [wgpu::VertexAttribute; 4] = wgpu::vertex_attr_array![
        1 => Float32x4, // position
        2 => Float32x2, // size
        3 => Float32x4, // color
        4 => Float32x4  // uv
    ];

    pub(super) fn layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<SpriteInstance>() as u64,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRS,
        }
    }
}

/// Appends the instances of `batch` to `out`.
pub(super) fn interleave(batch: &Batch, out: &mut Vec<SpriteInstance>) {
    let sprites = batch
        .positions()
        .iter()
        .zip(batch.dimensions())
        .zip(batch.colors())
        .zip(batch.uvs());

    out.extend(sprites.map(|(((position, size), color), uv)| SpriteInstance {
        position: *position,
        size: *size,
        color: *color,
        uv: *uv,
    }));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::{Batcher, ShaderKind, Sprite};
    use crate::coords::{UvRect, Vec2};
    use crate::paint::Color;

    #[test]
    fn instance_layout_matches_struct() {
        assert_eq!(std::mem::size_of::<SpriteInstance>(), 56);
        assert_eq!(SpriteInstance::layout().array_stride, 56);
        assert_eq!(std::mem::size_of::<ProjectionUniform>(), 64);
    }

    #[test]
    fn interleave_keeps_sprite_order() {
        let mut batcher = Batcher::new(8);
        let uv = UvRect::new(0.0, 0.25, 0.5, 0.75);
        batcher.add_sprite(
            ShaderKind::Color,
            Sprite::textured(Vec2::new(1.0, 2.0), Vec2::new(3.0, 4.0), uv, Color::WHITE),
        );
        batcher.add_colored(crate::coords::Vec4::new(5.0, 6.0, 7.0, 1.0), 8.0, 9.0, Color::BLACK);

        let batches = batcher.take_batches();
        let mut out = Vec::new();
        interleave(&batches[0], &mut out);

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].position, [1.0, 2.0, 0.0, 1.0]);
        assert_eq!(out[0].size, [3.0, 4.0]);
        assert_eq!(out[0].uv, [0.0, 0.25, 0.5, 0.75]);
        assert_eq!(out[1].position, [5.0, 6.0, 7.0, 1.0]);
        assert_eq!(out[1].color, Color::BLACK.to_array());
    }
}
