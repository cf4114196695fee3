use std::rc::Rc;

use anyhow::Context;
use kestrel_engine::batch::Batcher;
use kestrel_engine::config::EngineConfig;
use kestrel_engine::coords::{UvRect, Vec2, Vec4};
use kestrel_engine::core::{App, AppControl, FrameCtx};
use kestrel_engine::device::GpuInit;
use kestrel_engine::errors::{ErrorCode, ErrorLog};
use kestrel_engine::logging::{init_logging, LoggingConfig};
use kestrel_engine::paint::Color;
use kestrel_engine::render::BatchRenderer;
use kestrel_engine::text::{BitmapFont, TextLayout};
use kestrel_engine::texture::{TextureId, TextureImage, TextureStore};
use kestrel_engine::time::FrameTime;
use kestrel_engine::window::{Runtime, RuntimeConfig};
use kestrel_engine::world::{GameObject, World};
use winit::event::{ElementState, WindowEvent};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowId;

fn main() -> anyhow::Result<()> {
    let loaded = EngineConfig::load();
    let logging = match &loaded {
        Ok(config) => config.logging.to_logging_config(),
        Err(_) => LoggingConfig::default(),
    };
    init_logging(logging);

    let config = loaded.unwrap_or_else(|e| {
        log::error!("{e}; using defaults");
        EngineConfig::default()
    });

    let app = Sandbox::new(&config)?;
    Runtime::run(
        RuntimeConfig::from_config(&config),
        GpuInit::from_config(&config.window),
        app,
    )
}

/// Square that drifts and bounces off the map edges.
struct Bouncer {
    position: Vec2,
    velocity: Vec2,
    size: f32,
    color: Color,
    bounds: Vec2,
}

impl GameObject for Bouncer {
    fn update(&mut self, time: &FrameTime) {
        self.position += self.velocity * time.dt;

        let half = self.size * 0.5;
        for axis in 0..2 {
            if self.position[axis] < half || self.position[axis] > self.bounds[axis] - half {
                self.velocity[axis] = -self.velocity[axis];
                self.position[axis] = self.position[axis].clamp(half, self.bounds[axis] - half);
            }
        }
    }

    fn render(&self, batcher: &mut Batcher) {
        batcher.add_colored(
            self.position.extend(0.0).extend(1.0),
            self.size,
            self.size,
            self.color,
        );
    }
}

/// Twinkling points submitted in one bulk call.
struct Starfield {
    positions: Vec<Vec4>,
    colors: Vec<Color>,
    elapsed: f32,
}

impl Starfield {
    fn new(count: usize, bounds: Vec2) -> Self {
        // Deterministic scatter; the layout only has to look irregular.
        let mut seed = 0x2545_f491_u32;
        let mut next = move || {
            seed ^= seed << 13;
            seed ^= seed >> 17;
            seed ^= seed << 5;
            (seed % 10_000) as f32 / 10_000.0
        };

        let positions = (0..count)
            .map(|_| Vec4::new(next() * bounds.x, next() * bounds.y, -50.0, 1.0))
            .collect();
        let colors = vec![Color::WHITE; count];

        Self {
            positions,
            colors,
            elapsed: 0.0,
        }
    }
}

impl GameObject for Starfield {
    fn update(&mut self, time: &FrameTime) {
        self.elapsed += time.dt;
        for (i, color) in self.colors.iter_mut().enumerate() {
            let phase = self.elapsed * 2.0 + i as f32 * 0.7;
            let a = 0.35 + 0.3 * phase.sin();
            *color = Color::from_straight(1.0, 1.0, 1.0, a);
        }
    }

    fn render(&self, batcher: &mut Batcher) {
        if let Err(e) = batcher.add_points(&self.positions, &self.colors, Vec2::splat(2.0)) {
            log::warn!("starfield skipped: {e}");
        }
    }
}

/// Checkerboard tiles sampled from different regions of one texture.
struct Tiles {
    texture: TextureId,
    origin: Vec2,
}

impl GameObject for Tiles {
    fn render(&self, batcher: &mut Batcher) {
        let halves = [
            UvRect::new(0.0, 0.0, 1.0, 1.0),
            UvRect::new(0.0, 0.0, 0.5, 0.5),
            UvRect::new(0.5, 0.5, 1.0, 1.0),
        ];
        for (i, uv) in halves.into_iter().enumerate() {
            let position = self.origin + Vec2::new(i as f32 * 72.0, 0.0);
            batcher.add_textured(
                self.texture,
                position.extend(10.0).extend(1.0),
                64.0,
                64.0,
                uv,
                Color::WHITE,
            );
        }
    }
}

struct Sandbox {
    world: World,
    batcher: Batcher,
    renderer: BatchRenderer,
    textures: TextureStore,
    hud: Option<TextLayout>,
    clear: Color,

    assets_loaded: bool,
    toggle_pause: bool,
    scale_change: Option<f32>,
    hud_refresh: f64,
}

impl Sandbox {
    fn new(config: &EngineConfig) -> anyhow::Result<Self> {
        let bounds = Vec2::new(config.window.width as f32, config.window.height as f32);
        let world = World::new(config.window.width as i32, config.window.height as i32)
            .context("invalid world size")?;

        Ok(Self {
            world,
            batcher: Batcher::new(config.renderer.max_batch_size),
            renderer: BatchRenderer::new(config.renderer.projection_depth),
            textures: TextureStore::new(),
            hud: None,
            clear: config.renderer.clear_color(),
            assets_loaded: false,
            toggle_pause: false,
            scale_change: None,
            hud_refresh: 0.0,
        }
        .with_bouncers(bounds))
    }

    fn with_bouncers(mut self, bounds: Vec2) -> Self {
        self.world.add_object(Box::new(Starfield::new(400, bounds)));

        let palette = [
            Color::from_rgba_u8(231, 76, 60, 255),
            Color::from_rgba_u8(46, 204, 113, 255),
            Color::from_rgba_u8(52, 152, 219, 230),
            Color::from_rgba_u8(241, 196, 15, 200),
        ];
        for i in 0..48 {
            let t = i as f32;
            self.world.add_object(Box::new(Bouncer {
                position: Vec2::new(
                    40.0 + (t * 97.0) % (bounds.x - 80.0),
                    40.0 + (t * 53.0) % (bounds.y - 80.0),
                ),
                velocity: Vec2::new(60.0 + (t * 13.0) % 120.0, 45.0 - (t * 29.0) % 90.0),
                size: 12.0 + (i % 5) as f32 * 6.0,
                color: palette[i % palette.len()],
                bounds,
            }));
        }
        self
    }

    /// Loads font and textures on the first frame so failures reach the
    /// runtime's error log.
    fn load_assets(&mut self, errors: &mut ErrorLog) {
        let checker = checkerboard(16, 4);
        let tiles = errors.check(
            ErrorCode::Texture,
            checker.context("failed to build checkerboard texture"),
        );
        if let Some(image) = tiles {
            let texture = self.textures.insert(image);
            self.world.add_object(Box::new(Tiles {
                texture,
                origin: Vec2::new(60.0, 60.0),
            }));
        }

        let charset: String = (' '..='~').collect();
        let font = load_font_bytes().and_then(|bytes| {
            BitmapFont::rasterize(&bytes, 18.0, &charset, &mut self.textures)
                .context("failed to rasterize HUD font")
        });

        if let Some(font) = errors.check(ErrorCode::Game, font) {
            let mut hud = TextLayout::new(Rc::new(font));
            hud.set_depth(50.0);
            self.hud = Some(hud);
        }
    }

    fn update_hud(&mut self, ctx: &FrameCtx<'_, '_>) {
        let Some(hud) = self.hud.as_mut() else { return };

        let viewport = ctx.window.viewport();
        hud.set_position(Vec2::new(12.0, viewport.height - 20.0));

        if ctx.time.total < self.hud_refresh && !hud.text().is_empty() {
            return;
        }
        self.hud_refresh = ctx.time.total + 0.5;

        let fps = if ctx.time.dt > 0.0 { ctx.timer.time_scale() / ctx.time.dt } else { 0.0 };
        let stats = self.renderer.stats();
        let paused = if ctx.timer.is_paused() { "  [paused]" } else { "" };
        hud.set_text(format!(
            "{fps:.0} fps  x{:.2}  {} draws  {} sprites{paused}",
            ctx.timer.time_scale(),
            stats.draw_calls,
            stats.sprites,
        ));
    }
}

impl App for Sandbox {
    fn on_window_event(&mut self, _window_id: WindowId, event: &WindowEvent) -> AppControl {
        let WindowEvent::KeyboardInput { event, .. } = event else {
            return AppControl::Continue;
        };
        if event.state != ElementState::Pressed || event.repeat {
            return AppControl::Continue;
        }

        match event.physical_key {
            PhysicalKey::Code(KeyCode::Escape) => return AppControl::Exit,
            PhysicalKey::Code(KeyCode::KeyP) => self.toggle_pause = true,
            PhysicalKey::Code(KeyCode::ArrowUp) => self.scale_change = Some(2.0),
            PhysicalKey::Code(KeyCode::ArrowDown) => self.scale_change = Some(0.5),
            _ => {}
        }
        AppControl::Continue
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if !self.assets_loaded {
            self.assets_loaded = true;
            self.load_assets(ctx.errors);
        }

        if std::mem::take(&mut self.toggle_pause) {
            if ctx.timer.is_paused() {
                ctx.timer.resume();
            } else {
                ctx.timer.pause();
            }
        }
        if let Some(factor) = self.scale_change.take() {
            let scale = (ctx.timer.time_scale() * factor).clamp(0.125, 8.0);
            ctx.timer.set_time_scale(scale);
        }

        self.world.update(&ctx.time);
        self.update_hud(ctx);

        self.world.render(&mut self.batcher);
        if let Some(hud) = &self.hud {
            hud.submit(&mut self.batcher);
        }
        let batches = self.batcher.take_batches();

        let (renderer, textures) = (&mut self.renderer, &self.textures);
        ctx.render(self.clear, |rctx, target| {
            renderer.render(rctx, target, &batches, textures);
        })
    }
}

fn checkerboard(size: u32, cells: u32) -> Result<TextureImage, kestrel_engine::texture::TextureLoadError> {
    let cell = (size / cells).max(1);
    let mut pixels = Vec::with_capacity((size * size * 4) as usize);
    for y in 0..size {
        for x in 0..size {
            let light = ((x / cell) + (y / cell)) % 2 == 0;
            let v = if light { 230 } else { 40 };
            pixels.extend_from_slice(&[v, v, v, 255]);
        }
    }
    TextureImage::from_straight_rgba(size, size, pixels)
}

fn load_font_bytes() -> anyhow::Result<Vec<u8>> {
    const CANDIDATES: [&str; 5] = [
        "/usr/share/fonts/TTF/DejaVuSans.ttf",
        "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/dejavu/DejaVuSans.ttf",
        "/usr/share/fonts/noto/NotoSans-Regular.ttf",
        "/usr/share/fonts/truetype/noto/NotoSans-Regular.ttf",
    ];

    CANDIDATES
        .iter()
        .find_map(|p| std::fs::read(p).ok())
        .with_context(|| format!("no system font found (tried {})", CANDIDATES.join(", ")))
}
