use std::fmt;

use crate::coords::{UvRect, Vec2, Vec4};
use crate::paint::Color;
use crate::texture::TextureId;

use super::sprite::{ShaderKind, Sprite};

/// Sprites per batch unless configured otherwise.
pub const DEFAULT_MAX_BATCH_SIZE: usize = 1000;

/// Error returned by the bulk add operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchError {
    /// The attribute sequences passed together have different lengths.
    LengthMismatch { positions: usize, other: usize },
}

impl fmt::Display for BatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchError::LengthMismatch { positions, other } => write!(
                f,
                "batch attribute length mismatch: {positions} positions vs {other} attributes"
            ),
        }
    }
}

impl std::error::Error for BatchError {}

/// A closed run of sprites drawn with one shader in one draw call.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    shader: ShaderKind,
    positions: Vec<[f32; 4]>,
    dimensions: Vec<[f32; 2]>,
    colors: Vec<[f32; 4]>,
    uvs: Vec<[f32; 4]>,
}

impl Batch {
    fn new(shader: ShaderKind) -> Self {
        Self {
            shader,
            positions: Vec::new(),
            dimensions: Vec::new(),
            colors: Vec::new(),
            uvs: Vec::new(),
        }
    }

    fn push(&mut self, sprite: &Sprite) {
        self.positions.push(sprite.position.to_array());
        self.dimensions.push(sprite.size.to_array());
        self.colors.push(sprite.color.to_array());
        self.uvs.push(sprite.uv.to_array());
    }

    #[inline]
    pub fn shader(&self) -> ShaderKind {
        self.shader
    }

    /// Number of sprites.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    #[inline]
    pub fn positions(&self) -> &[[f32; 4]] {
        &self.positions
    }

    #[inline]
    pub fn dimensions(&self) -> &[[f32; 2]] {
        &self.dimensions
    }

    #[inline]
    pub fn colors(&self) -> &[[f32; 4]] {
        &self.colors
    }

    /// `[u0, v0, u1, v1]` per sprite.
    #[inline]
    pub fn uvs(&self) -> &[[f32; 4]] {
        &self.uvs
    }
}

/// Running counters, reset with [`Batcher::reset_stats`].
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct BatchStats {
    /// Sprites appended.
    pub sprites: u64,
    /// Batches closed (each becomes one draw call).
    pub batches: u64,
    /// Flushes forced by a full batch.
    pub capacity_flushes: u64,
    /// Flushes forced by a shader change while sprites were pending.
    pub shader_switches: u64,
}

/// Per-frame sprite accumulator.
///
/// Flush rules:
/// - a shader change closes the open batch before the new sprite is added
/// - a full batch (`max_batch_size` sprites) is closed before the next sprite
///
/// Closed batches are kept in submission order until [`take_batches`](Self::take_batches).
#[derive(Debug)]
pub struct Batcher {
    max_batch_size: usize,
    current: Option<ShaderKind>,
    open: Batch,
    closed: Vec<Batch>,
    stats: BatchStats,
}

impl Batcher {
    /// Creates a batcher; `max_batch_size` is clamped to at least 1.
    pub fn new(max_batch_size: usize) -> Self {
        Self {
            max_batch_size: max_batch_size.max(1),
            current: None,
            open: Batch::new(ShaderKind::Color),
            closed: Vec::new(),
            stats: BatchStats::default(),
        }
    }

    #[inline]
    pub fn max_batch_size(&self) -> usize {
        self.max_batch_size
    }

    /// Shader of the most recently added sprite in this frame.
    #[inline]
    pub fn current_shader(&self) -> Option<ShaderKind> {
        self.current
    }

    /// Sprites in the open (not yet flushed) batch.
    #[inline]
    pub fn pending_len(&self) -> usize {
        self.open.len()
    }

    /// Batches closed so far this frame.
    #[inline]
    pub fn closed_batches(&self) -> &[Batch] {
        &self.closed
    }

    /// True when nothing was recorded since the last [`take_batches`](Self::take_batches).
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.open.is_empty() && self.closed.is_empty()
    }

    #[inline]
    pub fn stats(&self) -> BatchStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = BatchStats::default();
    }

    /// Appends one sprite drawn with `shader`.
    pub fn add_sprite(&mut self, shader: ShaderKind, sprite: Sprite) {
        self.use_shader(shader);

        if self.open.len() >= self.max_batch_size {
            self.stats.capacity_flushes += 1;
            self.flush();
        }

        self.open.push(&sprite);
        self.stats.sprites += 1;
    }

    /// Appends a flat-colored sprite.
    pub fn add_colored(&mut self, position: Vec4, width: f32, height: f32, color: Color) {
        self.add_sprite(
            ShaderKind::Color,
            Sprite {
                position,
                size: Vec2::new(width, height),
                color,
                uv: UvRect::FULL,
            },
        );
    }

    /// Appends a textured sprite sampling `uv` from `texture`.
    pub fn add_textured(
        &mut self,
        texture: TextureId,
        position: Vec4,
        width: f32,
        height: f32,
        uv: UvRect,
        tint: Color,
    ) {
        self.add_sprite(
            ShaderKind::Texture(texture),
            Sprite {
                position,
                size: Vec2::new(width, height),
                color: tint,
                uv,
            },
        );
    }

    /// Appends one flat-colored sprite per position, all of `size`.
    ///
    /// `positions` and `colors` must have the same length; on mismatch nothing
    /// is appended.
    pub fn add_points(
        &mut self,
        positions: &[Vec4],
        colors: &[Color],
        size: Vec2,
    ) -> Result<(), BatchError> {
        if positions.len() != colors.len() {
            return Err(BatchError::LengthMismatch {
                positions: positions.len(),
                other: colors.len(),
            });
        }

        for (&position, &color) in positions.iter().zip(colors) {
            self.add_sprite(
                ShaderKind::Color,
                Sprite { position, size, color, uv: UvRect::FULL },
            );
        }
        Ok(())
    }

    /// Appends one textured sprite per position, all of `size`, untinted.
    ///
    /// `positions` and `uvs` must have the same length; on mismatch nothing
    /// is appended.
    pub fn add_textured_points(
        &mut self,
        texture: TextureId,
        positions: &[Vec4],
        uvs: &[UvRect],
        size: Vec2,
    ) -> Result<(), BatchError> {
        if positions.len() != uvs.len() {
            return Err(BatchError::LengthMismatch {
                positions: positions.len(),
                other: uvs.len(),
            });
        }

        let shader = ShaderKind::Texture(texture);
        for (&position, &uv) in positions.iter().zip(uvs) {
            self.add_sprite(shader, Sprite { position, size, color: Color::WHITE, uv });
        }
        Ok(())
    }

    /// Closes the open batch. Does nothing when it is empty.
    pub fn flush(&mut self) {
        if self.open.is_empty() {
            return;
        }

        let shader = self.current.unwrap_or(ShaderKind::Color);
        let batch = std::mem::replace(&mut self.open, Batch::new(shader));

        log::trace!("batch closed: {} sprites, {:?}", batch.len(), batch.shader());

        self.closed.push(batch);
        self.stats.batches += 1;
    }

    /// Flushes and returns every batch recorded this frame, in submission order.
    ///
    /// The batcher is left empty and ready for the next frame.
    pub fn take_batches(&mut self) -> Vec<Batch> {
        self.flush();
        self.current = None;
        std::mem::take(&mut self.closed)
    }

    fn use_shader(&mut self, shader: ShaderKind) {
        if self.current == Some(shader) {
            return;
        }

        if !self.open.is_empty() {
            self.stats.shader_switches += 1;
            self.flush();
        }

        self.current = Some(shader);
        self.open.shader = shader;
    }
}

impl Default for Batcher {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BATCH_SIZE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(x: f32) -> Vec4 {
        Vec4::new(x, 0.0, 0.0, 1.0)
    }

    fn red() -> Color {
        Color::from_straight(1.0, 0.0, 0.0, 1.0)
    }

    fn sizes(batches: &[Batch]) -> Vec<usize> {
        batches.iter().map(Batch::len).collect()
    }

    fn assert_parallel(batch: &Batch) {
        assert_eq!(batch.positions().len(), batch.dimensions().len());
        assert_eq!(batch.positions().len(), batch.colors().len());
        assert_eq!(batch.positions().len(), batch.uvs().len());
    }

    // ── flush ─────────────────────────────────────────────────────────────

    #[test]
    fn flushing_empty_batcher_is_noop() {
        let mut b = Batcher::new(4);
        b.flush();
        assert!(b.is_empty());
        assert!(b.take_batches().is_empty());
        assert_eq!(b.stats().batches, 0);
    }

    #[test]
    fn explicit_flush_closes_open_batch() {
        let mut b = Batcher::new(4);
        b.add_colored(at(0.0), 1.0, 1.0, red());
        b.flush();
        b.add_colored(at(1.0), 1.0, 1.0, red());

        assert_eq!(b.closed_batches().len(), 1);
        assert_eq!(b.pending_len(), 1);
        // Same program after a flush is not a switch.
        assert_eq!(b.stats().shader_switches, 0);
    }

    // ── capacity ──────────────────────────────────────────────────────────

    #[test]
    fn full_batch_is_flushed_before_next_sprite() {
        let mut b = Batcher::new(3);
        for i in 0..7 {
            b.add_colored(at(i as f32), 1.0, 1.0, red());
        }

        let batches = b.take_batches();
        assert_eq!(sizes(&batches), vec![3, 3, 1]);
        assert_eq!(b.stats().capacity_flushes, 2);
        assert_eq!(b.stats().batches, 3);
        assert_eq!(b.stats().sprites, 7);
    }

    #[test]
    fn exactly_full_batch_is_not_split() {
        let mut b = Batcher::new(3);
        for i in 0..3 {
            b.add_colored(at(i as f32), 1.0, 1.0, red());
        }
        assert_eq!(sizes(&b.take_batches()), vec![3]);
        assert_eq!(b.stats().capacity_flushes, 0);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut b = Batcher::new(0);
        assert_eq!(b.max_batch_size(), 1);
        b.add_colored(at(0.0), 1.0, 1.0, red());
        b.add_colored(at(1.0), 1.0, 1.0, red());
        assert_eq!(sizes(&b.take_batches()), vec![1, 1]);
    }

    // ── shader switching ──────────────────────────────────────────────────

    #[test]
    fn shader_change_closes_batch() {
        let tex_a = TextureId(1);
        let tex_b = TextureId(2);
        let mut b = Batcher::new(100);

        b.add_colored(at(0.0), 1.0, 1.0, red());
        b.add_colored(at(1.0), 1.0, 1.0, red());
        b.add_textured(tex_a, at(2.0), 1.0, 1.0, UvRect::FULL, Color::WHITE);
        b.add_textured(tex_a, at(3.0), 1.0, 1.0, UvRect::FULL, Color::WHITE);
        b.add_textured(tex_b, at(4.0), 1.0, 1.0, UvRect::FULL, Color::WHITE);
        b.add_colored(at(5.0), 1.0, 1.0, red());

        let batches = b.take_batches();
        assert_eq!(sizes(&batches), vec![2, 2, 1, 1]);

        let shaders: Vec<_> = batches.iter().map(Batch::shader).collect();
        assert_eq!(
            shaders,
            vec![
                ShaderKind::Color,
                ShaderKind::Texture(tex_a),
                ShaderKind::Texture(tex_b),
                ShaderKind::Color,
            ]
        );
        assert_eq!(b.stats().shader_switches, 3);
    }

    #[test]
    fn shader_change_after_flush_counts_no_switch() {
        let mut b = Batcher::new(10);
        b.add_colored(at(0.0), 1.0, 1.0, red());
        b.flush();
        b.add_textured(TextureId(3), at(1.0), 1.0, 1.0, UvRect::FULL, Color::WHITE);

        assert_eq!(b.stats().batches, 1);
        assert_eq!(b.stats().shader_switches, 0);
        assert_eq!(b.current_shader(), Some(ShaderKind::Texture(TextureId(3))));

        let batches = b.take_batches();
        assert_eq!(sizes(&batches), vec![1, 1]);
        assert_eq!(batches[1].shader(), ShaderKind::Texture(TextureId(3)));
    }

    #[test]
    fn current_shader_tracks_last_sprite_and_resets_per_frame() {
        let mut b = Batcher::new(10);
        assert_eq!(b.current_shader(), None);

        b.add_textured(TextureId(7), at(0.0), 1.0, 1.0, UvRect::FULL, Color::WHITE);
        assert_eq!(b.current_shader(), Some(ShaderKind::Texture(TextureId(7))));

        b.take_batches();
        assert_eq!(b.current_shader(), None);

        b.add_colored(at(0.0), 1.0, 1.0, red());
        assert_eq!(b.stats().shader_switches, 0);
    }

    // ── bulk adds ─────────────────────────────────────────────────────────

    #[test]
    fn bulk_add_rejects_mismatched_lengths() {
        let mut b = Batcher::new(10);
        let err = b
            .add_points(&[at(0.0), at(1.0)], &[red()], Vec2::ONE)
            .unwrap_err();

        assert_eq!(err, BatchError::LengthMismatch { positions: 2, other: 1 });
        assert!(b.is_empty());
    }

    #[test]
    fn bulk_textured_add_rejects_mismatched_lengths() {
        let mut b = Batcher::new(10);
        let err = b
            .add_textured_points(TextureId(0), &[at(0.0)], &[], Vec2::ONE)
            .unwrap_err();
        assert_eq!(err, BatchError::LengthMismatch { positions: 1, other: 0 });
        assert!(b.is_empty());
    }

    #[test]
    fn bulk_add_larger_than_capacity_is_split() {
        let mut b = Batcher::new(4);
        let positions: Vec<Vec4> = (0..10).map(|i| at(i as f32)).collect();
        let colors = vec![red(); 10];

        b.add_points(&positions, &colors, Vec2::new(2.0, 3.0)).unwrap();

        let batches = b.take_batches();
        assert_eq!(sizes(&batches), vec![4, 4, 2]);
        for batch in &batches {
            assert_parallel(batch);
            assert!(batch.dimensions().iter().all(|d| *d == [2.0, 3.0]));
        }
    }

    #[test]
    fn bulk_textured_add_uses_white_tint() {
        let mut b = Batcher::new(8);
        let uv = UvRect::new(0.0, 0.0, 0.5, 0.5);
        b.add_textured_points(TextureId(3), &[at(0.0), at(1.0)], &[uv, uv], Vec2::ONE)
            .unwrap();

        let batches = b.take_batches();
        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].shader(), ShaderKind::Texture(TextureId(3)));
        assert!(batches[0].colors().iter().all(|c| *c == [1.0, 1.0, 1.0, 1.0]));
        assert_eq!(batches[0].uvs()[1], [0.0, 0.0, 0.5, 0.5]);
    }

    // ── ordering / invariants ─────────────────────────────────────────────

    #[test]
    fn order_is_preserved_across_batches() {
        let mut b = Batcher::new(3);
        for i in 0..8 {
            if i % 3 == 0 {
                b.add_textured(TextureId(0), at(i as f32), 1.0, 1.0, UvRect::FULL, Color::WHITE);
            } else {
                b.add_colored(at(i as f32), 1.0, 1.0, red());
            }
        }

        let xs: Vec<f32> = b
            .take_batches()
            .iter()
            .flat_map(|batch| batch.positions().iter().map(|p| p[0]).collect::<Vec<_>>())
            .collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0]);
    }

    #[test]
    fn no_batch_is_empty_or_over_capacity() {
        let mut b = Batcher::new(5);
        for i in 0..23 {
            if i % 7 == 0 {
                b.flush();
            }
            b.add_colored(at(i as f32), 1.0, 1.0, red());
        }

        for batch in b.take_batches() {
            assert!(!batch.is_empty());
            assert!(batch.len() <= 5);
            assert_parallel(&batch);
        }
    }

    #[test]
    fn attributes_are_recorded_per_sprite() {
        let mut b = Batcher::default();
        let color = Color::from_straight(0.0, 1.0, 0.0, 0.5);
        b.add_colored(Vec4::new(10.0, 20.0, 3.0, 1.0), 32.0, 16.0, color);

        let batches = b.take_batches();
        let batch = &batches[0];
        assert_eq!(batch.positions(), &[[10.0, 20.0, 3.0, 1.0]]);
        assert_eq!(batch.dimensions(), &[[32.0, 16.0]]);
        assert_eq!(batch.colors(), &[color.to_array()]);
    }
}
