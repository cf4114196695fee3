use std::collections::{HashMap, HashSet};
use std::ops::Range;

use wgpu::util::DeviceExt;

use crate::batch::{Batch, ShaderKind};
use crate::coords::orthographic;
use crate::render::{RenderCtx, RenderTarget};
use crate::texture::{TextureId, TextureStore};

use super::common::{
    interleave, premul_alpha_blend, ProjectionUniform, QuadVertex, SpriteInstance, QUAD_INDICES,
    QUAD_VERTICES,
};

/// Counters for the last [`BatchRenderer::render`] call.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub draw_calls: u32,
    pub sprites: u32,
    pub pipeline_binds: u32,
    /// Batches dropped because their texture is not in the store.
    pub skipped_batches: u32,
}

/// One instanced draw derived from a batch.
#[derive(Debug, Clone, PartialEq)]
struct DrawStep {
    shader: ShaderKind,
    instances: Range<u32>,
    bind_pipeline: bool,
    bind_texture: Option<TextureId>,
}

/// Lays out consecutive instance ranges and the binds each draw needs.
///
/// A pipeline is bound only when the shader family (color or texture) changes
/// and a texture only when it differs from the one bound last.
fn plan_draws(batches: &[Batch]) -> Vec<DrawStep> {
    let mut steps = Vec::with_capacity(batches.len());
    let mut offset = 0u32;
    let mut bound_family: Option<bool> = None;
    let mut bound_texture: Option<TextureId> = None;

    for batch in batches {
        let count = batch.len() as u32;
        let textured = batch.shader().texture().is_some();

        let bind_pipeline = bound_family != Some(textured);
        bound_family = Some(textured);

        let bind_texture = match batch.shader().texture() {
            Some(id) if bound_texture != Some(id) || bind_pipeline => {
                bound_texture = Some(id);
                Some(id)
            }
            _ => None,
        };

        steps.push(DrawStep {
            shader: batch.shader(),
            instances: offset..offset + count,
            bind_pipeline,
            bind_texture,
        });
        offset += count;
    }

    steps
}

struct GpuTexture {
    generation: u64,
    bind_group: wgpu::BindGroup,
    _texture: wgpu::Texture,
}

struct Pipelines {
    format: wgpu::TextureFormat,
    color: wgpu::RenderPipeline,
    texture: wgpu::RenderPipeline,
    projection_bgl: wgpu::BindGroupLayout,
    texture_bgl: wgpu::BindGroupLayout,
}

/// Draws [`Batch`]es with one instanced draw call each.
///
/// GPU resources are created lazily on first use. Textures are uploaded from
/// the [`TextureStore`] the first time a batch references them and again when
/// their generation changes.
pub struct BatchRenderer {
    projection_depth: f32,

    pipelines: Option<Pipelines>,
    projection_ubo: Option<wgpu::Buffer>,
    projection_bind_group: Option<wgpu::BindGroup>,
    sampler: Option<wgpu::Sampler>,

    quad_vbo: Option<wgpu::Buffer>,
    quad_ibo: Option<wgpu::Buffer>,
    instance_vbo: Option<wgpu::Buffer>,
    instance_capacity: usize,
    instances: Vec<SpriteInstance>,

    textures: HashMap<TextureId, GpuTexture>,
    warned_missing: HashSet<TextureId>,

    stats: RenderStats,
}

impl BatchRenderer {
    /// `projection_depth` is the z range of the orthographic projection.
    pub fn new(projection_depth: f32) -> Self {
        Self {
            projection_depth,
            pipelines: None,
            projection_ubo: None,
            projection_bind_group: None,
            sampler: None,
            quad_vbo: None,
            quad_ibo: None,
            instance_vbo: None,
            instance_capacity: 0,
            instances: Vec::new(),
            textures: HashMap::new(),
            warned_missing: HashSet::new(),
            stats: RenderStats::default(),
        }
    }

    pub fn projection_depth(&self) -> f32 {
        self.projection_depth
    }

    pub fn set_projection_depth(&mut self, depth: f32) {
        self.projection_depth = depth;
    }

    /// Counters of the last frame.
    pub fn stats(&self) -> RenderStats {
        self.stats
    }

    /// Draws `batches` in order on top of `target`.
    pub fn render(
        &mut self,
        ctx: &RenderCtx<'_>,
        target: &mut RenderTarget<'_>,
        batches: &[Batch],
        textures: &TextureStore,
    ) {
        self.stats = RenderStats::default();
        if batches.is_empty() {
            return;
        }

        self.ensure_pipelines(ctx);
        self.ensure_static_buffers(ctx);
        self.ensure_projection(ctx);
        self.ensure_sampler(ctx);
        self.sync_textures(ctx, batches, textures);

        self.instances.clear();
        for batch in batches {
            interleave(batch, &mut self.instances);
        }
        if self.instances.is_empty() {
            return;
        }

        self.write_projection(ctx);
        self.ensure_instance_capacity(ctx, self.instances.len());

        let Some(instance_vbo) = self.instance_vbo.as_ref() else { return };
        ctx.queue
            .write_buffer(instance_vbo, 0, bytemuck::cast_slice(&self.instances));

        let Some(pipelines) = self.pipelines.as_ref() else { return };
        let Some(projection_bg) = self.projection_bind_group.as_ref() else { return };
        let Some(quad_vbo) = self.quad_vbo.as_ref() else { return };
        let Some(quad_ibo) = self.quad_ibo.as_ref() else { return };

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("kestrel sprite pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_vertex_buffer(0, quad_vbo.slice(..));
        rpass.set_vertex_buffer(1, instance_vbo.slice(..));
        rpass.set_index_buffer(quad_ibo.slice(..), wgpu::IndexFormat::Uint16);

        let mut stats = RenderStats::default();
        let mut texture_ready = true;

        for step in plan_draws(batches) {
            if step.bind_pipeline {
                let pipeline = match step.shader {
                    ShaderKind::Color => &pipelines.color,
                    ShaderKind::Texture(_) => &pipelines.texture,
                };
                rpass.set_pipeline(pipeline);
                // Projection is re-applied on every program switch.
                rpass.set_bind_group(0, projection_bg, &[]);
                stats.pipeline_binds += 1;
            }

            if let Some(id) = step.bind_texture {
                match self.textures.get(&id) {
                    Some(gpu_texture) => {
                        rpass.set_bind_group(1, &gpu_texture.bind_group, &[]);
                        texture_ready = true;
                    }
                    None => texture_ready = false,
                }
            }

            if step.shader.texture().is_some() && !texture_ready {
                stats.skipped_batches += 1;
                continue;
            }

            rpass.draw_indexed(0..QUAD_INDICES.len() as u32, 0, step.instances.clone());
            stats.draw_calls += 1;
            stats.sprites += step.instances.end - step.instances.start;
        }

        log::trace!(
            "sprite pass: {} draw calls, {} sprites",
            stats.draw_calls,
            stats.sprites
        );
        self.stats = stats;
    }

    /// Drops GPU copies of textures no longer in `textures`.
    pub fn prune_textures(&mut self, textures: &TextureStore) {
        self.textures.retain(|id, _| textures.get(*id).is_some());
        self.warned_missing.retain(|id| textures.get(*id).is_none());
    }

    // ── lazy-init helpers ──────────────────────────────────────────────────

    fn ensure_pipelines(&mut self, ctx: &RenderCtx<'_>) {
        if self
            .pipelines
            .as_ref()
            .is_some_and(|p| p.format == ctx.surface_format)
        {
            return;
        }

        let projection_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kestrel projection bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: ProjectionUniform::min_binding_size(),
                },
                count: None,
            }],
        });

        let texture_bgl = ctx.device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("kestrel sprite texture bgl"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let color = create_sprite_pipeline(
            ctx,
            "kestrel color sprite",
            include_str!("shaders/sprite_color.wgsl"),
            &[&projection_bgl],
        );
        let texture = create_sprite_pipeline(
            ctx,
            "kestrel texture sprite",
            include_str!("shaders/sprite_texture.wgsl"),
            &[&projection_bgl, &texture_bgl],
        );

        log::debug!("sprite pipelines created for {:?}", ctx.surface_format);

        self.pipelines = Some(Pipelines {
            format: ctx.surface_format,
            color,
            texture,
            projection_bgl,
            texture_bgl,
        });

        // Bind groups reference the old layouts.
        self.projection_bind_group = None;
        self.projection_ubo = None;
        self.textures.clear();
    }

    fn ensure_projection(&mut self, ctx: &RenderCtx<'_>) {
        if self.projection_bind_group.is_some() && self.projection_ubo.is_some() {
            return;
        }
        let Some(pipelines) = self.pipelines.as_ref() else { return };

        let ubo = ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kestrel projection ubo"),
            size: std::mem::size_of::<ProjectionUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("kestrel projection bind group"),
            layout: &pipelines.projection_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: ubo.as_entire_binding(),
            }],
        });

        self.projection_ubo = Some(ubo);
        self.projection_bind_group = Some(bind_group);
    }

    fn ensure_sampler(&mut self, ctx: &RenderCtx<'_>) {
        if self.sampler.is_some() {
            return;
        }
        self.sampler = Some(ctx.device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("kestrel sprite sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Linear,
            mipmap_filter: wgpu::MipmapFilterMode::Nearest,
            ..Default::default()
        }));
    }

    fn ensure_static_buffers(&mut self, ctx: &RenderCtx<'_>) {
        if self.quad_vbo.is_some() && self.quad_ibo.is_some() {
            return;
        }

        self.quad_vbo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kestrel quad vbo"),
            contents: bytemuck::cast_slice(&QUAD_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        }));

        self.quad_ibo = Some(ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("kestrel quad ibo"),
            contents: bytemuck::cast_slice(&QUAD_INDICES),
            usage: wgpu::BufferUsages::INDEX,
        }));
    }

    fn write_projection(&self, ctx: &RenderCtx<'_>) {
        let Some(ubo) = self.projection_ubo.as_ref() else { return };
        let u = ProjectionUniform::new(orthographic(ctx.viewport, self.projection_depth));
        ctx.queue.write_buffer(ubo, 0, bytemuck::bytes_of(&u));
    }

    fn ensure_instance_capacity(&mut self, ctx: &RenderCtx<'_>, required: usize) {
        if required <= self.instance_capacity && self.instance_vbo.is_some() {
            return;
        }

        let new_cap = required.next_power_of_two().max(64);
        let new_size = (new_cap * std::mem::size_of::<SpriteInstance>()) as u64;

        self.instance_vbo = Some(ctx.device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("kestrel sprite instance vbo"),
            size: new_size,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        }));
        self.instance_capacity = new_cap;
    }

    /// Uploads every texture the frame references that is new or stale.
    fn sync_textures(&mut self, ctx: &RenderCtx<'_>, batches: &[Batch], store: &TextureStore) {
        for id in batches.iter().filter_map(|b| b.shader().texture()) {
            let (Some(image), Some(generation)) = (store.get(id), store.generation(id)) else {
                if self.warned_missing.insert(id) {
                    log::warn!("texture {id:?} is not in the store; its batches are skipped");
                }
                self.textures.remove(&id);
                continue;
            };

            if self
                .textures
                .get(&id)
                .is_some_and(|t| t.generation == generation)
            {
                continue;
            }

            let (Some(pipelines), Some(sampler)) = (self.pipelines.as_ref(), self.sampler.as_ref())
            else {
                return;
            };

            let size = wgpu::Extent3d {
                width: image.width(),
                height: image.height(),
                depth_or_array_layers: 1,
            };
            let texture = ctx.device.create_texture(&wgpu::TextureDescriptor {
                label: Some("kestrel sprite texture"),
                size,
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8Unorm,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            });

            ctx.queue.write_texture(
                wgpu::TexelCopyTextureInfo {
                    texture: &texture,
                    mip_level: 0,
                    origin: wgpu::Origin3d::ZERO,
                    aspect: wgpu::TextureAspect::All,
                },
                image.pixels(),
                wgpu::TexelCopyBufferLayout {
                    offset: 0,
                    bytes_per_row: Some(4 * image.width()),
                    rows_per_image: Some(image.height()),
                },
                size,
            );

            let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
            let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("kestrel sprite texture bind group"),
                layout: &pipelines.texture_bgl,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(&view),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(sampler),
                    },
                ],
            });

            log::debug!(
                "uploaded texture {id:?} ({}x{}, generation {generation})",
                image.width(),
                image.height()
            );

            self.textures.insert(
                id,
                GpuTexture {
                    generation,
                    bind_group,
                    _texture: texture,
                },
            );
        }
    }
}

impl Default for BatchRenderer {
    fn default() -> Self {
        Self::new(200.0)
    }
}

fn create_sprite_pipeline(
    ctx: &RenderCtx<'_>,
    label: &str,
    source: &str,
    bind_group_layouts: &[&wgpu::BindGroupLayout],
) -> wgpu::RenderPipeline {
    let shader = ctx.device.create_shader_module(wgpu::ShaderModuleDescriptor {
        label: Some(label),
        source: wgpu::ShaderSource::Wgsl(source.into()),
    });

    let layout = ctx.device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
        label: Some(label),
        bind_group_layouts,
        immediate_size: 0,
    });

    ctx.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(&layout),
        vertex: wgpu::VertexState {
            module: &shader,
            entry_point: Some("vs_main"),
            compilation_options: Default::default(),
            buffers: &[QuadVertex::layout(), SpriteInstance::layout()],
        },
        fragment: Some(wgpu::FragmentState {
            module: &shader,
            entry_point: Some("fs_main"),
            compilation_options: Default::default(),
            targets: &[Some(wgpu::ColorTargetState {
                format: ctx.surface_format,
                blend: Some(premul_alpha_blend()),
                write_mask: wgpu::ColorWrites::ALL,
            })],
        }),
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: None,
            polygon_mode: wgpu::PolygonMode::Fill,
            unclipped_depth: false,
            conservative: false,
        },
        depth_stencil: None,
        multisample: wgpu::MultisampleState::default(),
        multiview_mask: None,
        cache: None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::Batcher;
    use crate::coords::{UvRect, Vec4};
    use crate::paint::Color;
    use crate::texture::{TextureImage, TextureStore};

    fn texture(store: &mut TextureStore) -> TextureId {
        let image = TextureImage::from_premul_rgba(1, 1, vec![255; 4]).unwrap();
        store.insert(image)
    }

    #[test]
    fn one_draw_step_per_batch_with_contiguous_ranges() {
        let mut batcher = Batcher::new(2);
        for i in 0..5 {
            batcher.add_colored(Vec4::new(i as f32, 0.0, 0.0, 1.0), 1.0, 1.0, Color::WHITE);
        }
        let batches = batcher.take_batches();
        let steps = plan_draws(&batches);

        let ranges: Vec<_> = steps.iter().map(|s| s.instances.clone()).collect();
        assert_eq!(ranges, vec![0..2, 2..4, 4..5]);
        assert!(steps[0].bind_pipeline);
        assert!(!steps[1].bind_pipeline && !steps[2].bind_pipeline);
    }

    #[test]
    fn binds_only_on_program_or_texture_change() {
        let mut store = TextureStore::new();
        let a = texture(&mut store);
        let b = texture(&mut store);

        let mut batcher = Batcher::new(1);
        let p = Vec4::new(0.0, 0.0, 0.0, 1.0);
        batcher.add_textured(a, p, 1.0, 1.0, UvRect::FULL, Color::WHITE);
        batcher.add_textured(a, p, 1.0, 1.0, UvRect::FULL, Color::WHITE);
        batcher.add_textured(b, p, 1.0, 1.0, UvRect::FULL, Color::WHITE);
        batcher.add_colored(p, 1.0, 1.0, Color::WHITE);
        batcher.add_textured(b, p, 1.0, 1.0, UvRect::FULL, Color::WHITE);

        let steps = plan_draws(&batcher.take_batches());
        let binds: Vec<_> = steps
            .iter()
            .map(|s| (s.bind_pipeline, s.bind_texture))
            .collect();

        assert_eq!(
            binds,
            vec![
                (true, Some(a)),
                (false, None),
                (false, Some(b)),
                (true, None),
                // pipeline rebind invalidates group 1
                (true, Some(b)),
            ]
        );
    }

    #[test]
    fn empty_frame_plans_nothing() {
        assert!(plan_draws(&[]).is_empty());
    }
}
