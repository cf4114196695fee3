use std::rc::Rc;

use crate::batch::Batcher;
use crate::coords::{UvRect, Vec2};
use crate::paint::Color;
use crate::time::FrameTime;
use crate::world::GameObject;

use super::font::{BitmapFont, GlyphMetrics};

/// One laid-out character: a textured quad.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct GlyphSprite {
    pub ch: char,
    /// Quad center in world space.
    pub position: Vec2,
    /// Scaled width and height.
    pub size: Vec2,
    pub uv: UvRect,
    metrics: GlyphMetrics,
}

impl GlyphSprite {
    #[inline]
    pub fn metrics(&self) -> &GlyphMetrics {
        &self.metrics
    }
}

/// A string laid out as glyph sprites.
///
/// The cursor starts at `position` and moves right by each glyph's advance.
/// Scale factors stretch glyph quads and advances independently per axis.
#[derive(Debug, Clone)]
pub struct TextLayout {
    text: String,
    font: Rc<BitmapFont>,
    position: Vec2,
    depth: f32,
    color: Color,
    width_scale: f32,
    height_scale: f32,
    sprites: Vec<GlyphSprite>,
    total_width: f32,
    total_height: f32,
}

impl TextLayout {
    /// Empty layout using `font`.
    pub fn new(font: Rc<BitmapFont>) -> Self {
        Self {
            text: String::new(),
            font,
            position: Vec2::ZERO,
            depth: 0.0,
            color: Color::WHITE,
            width_scale: 1.0,
            height_scale: 1.0,
            sprites: Vec::new(),
            total_width: 0.0,
            total_height: 0.0,
        }
    }

    /// Layout of `text` at the origin.
    pub fn with_text(text: impl Into<String>, font: Rc<BitmapFont>) -> Self {
        let mut layout = Self::new(font);
        layout.set_text(text);
        layout
    }

    /// Replaces the text and lays it out from the current position.
    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.sprites.clear();
        self.total_width = 0.0;
        self.total_height = 0.0;

        let font = Rc::clone(&self.font);
        let mut missing = 0usize;

        for ch in self.text.chars() {
            let Some(metrics) = font.glyph_or_fallback(ch).copied() else {
                missing += 1;
                continue;
            };

            let size = Vec2::new(
                metrics.width as f32 * self.width_scale,
                metrics.height as f32 * self.height_scale,
            );

            self.total_width += size.x;
            self.total_height = self.total_height.max(size.y);

            self.sprites.push(GlyphSprite {
                ch,
                position: Vec2::ZERO,
                size,
                uv: font.uv(&metrics),
                metrics,
            });
        }

        if missing > 0 {
            log::warn!("{missing} character(s) of {:?} have no glyph in the font", self.text);
        }

        self.place_sprites();
        log::trace!(
            "laid out {} glyphs, {}x{}",
            self.sprites.len(),
            self.total_width,
            self.total_height
        );
    }

    /// Moves the text so the cursor starts at `position`.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.place_sprites();
    }

    /// Changes the per-axis scale factors and lays the text out again.
    pub fn set_scale(&mut self, width_scale: f32, height_scale: f32) {
        self.width_scale = width_scale;
        self.height_scale = height_scale;
        let text = std::mem::take(&mut self.text);
        self.set_text(text);
    }

    /// Z coordinate of every glyph quad.
    pub fn set_depth(&mut self, depth: f32) {
        self.depth = depth;
    }

    /// Tint applied to every glyph.
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[inline]
    pub fn font(&self) -> &Rc<BitmapFont> {
        &self.font
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        self.position
    }

    #[inline]
    pub fn sprites(&self) -> &[GlyphSprite] {
        &self.sprites
    }

    /// Sum of the scaled glyph widths.
    #[inline]
    pub fn total_width(&self) -> f32 {
        self.total_width
    }

    /// Height of the tallest scaled glyph.
    #[inline]
    pub fn total_height(&self) -> f32 {
        self.total_height
    }

    /// Submits one textured sprite per visible glyph.
    pub fn submit(&self, batcher: &mut Batcher) {
        let texture = self.font.texture();
        for sprite in &self.sprites {
            if sprite.size.x <= 0.0 || sprite.size.y <= 0.0 {
                continue;
            }
            batcher.add_textured(
                texture,
                sprite.position.extend(self.depth).extend(1.0),
                sprite.size.x,
                sprite.size.y,
                sprite.uv,
                self.color,
            );
        }
    }

    // Offsets are halved in integer space before scaling the advance.
    fn place_sprites(&mut self) {
        let mut cursor_x = self.position.x;
        let cursor_y = self.position.y;

        for sprite in &mut self.sprites {
            let m = sprite.metrics;
            sprite.position = Vec2::new(
                cursor_x + (m.x_offset / 2) as f32,
                cursor_y - (m.y_offset / 2) as f32,
            );
            cursor_x += m.x_advance as f32 * self.width_scale;
        }
    }
}

impl GameObject for TextLayout {
    fn update(&mut self, _time: &FrameTime) {}

    fn render(&self, batcher: &mut Batcher) {
        self.submit(batcher);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batch::ShaderKind;
    use crate::texture::TextureId;

    fn font() -> Rc<BitmapFont> {
        let mut f = BitmapFont::new(TextureId(4), 128, 64);
        f.insert_glyph(
            'A',
            GlyphMetrics { x: 0, y: 0, width: 10, height: 20, x_offset: 2, y_offset: 4, x_advance: 12 },
        );
        f.insert_glyph(
            'B',
            GlyphMetrics { x: 10, y: 0, width: 8, height: 16, x_offset: -3, y_offset: 5, x_advance: 9 },
        );
        f.insert_glyph(
            ' ',
            GlyphMetrics { x: 0, y: 0, width: 0, height: 0, x_offset: 0, y_offset: 0, x_advance: 6 },
        );
        Rc::new(f)
    }

    fn positions(layout: &TextLayout) -> Vec<(f32, f32)> {
        layout.sprites().iter().map(|s| (s.position.x, s.position.y)).collect()
    }

    #[test]
    fn glyphs_follow_cursor_and_halved_offsets() {
        let mut t = TextLayout::new(font());
        t.set_position(Vec2::new(100.0, 50.0));
        t.set_text("AB");

        // A: (100 + 2/2, 50 - 4/2); B: (112 + (-3)/2, 50 - 5/2) with truncating halves.
        assert_eq!(positions(&t), vec![(101.0, 48.0), (111.0, 48.0)]);
        assert_eq!(t.total_width(), 18.0);
        assert_eq!(t.total_height(), 20.0);
    }

    #[test]
    fn uvs_come_from_atlas_region() {
        let t = TextLayout::with_text("AB", font());
        let s = t.sprites();
        assert_eq!(s[0].uv, UvRect::new(0.0, 0.0, 10.0 / 128.0, 20.0 / 64.0));
        assert_eq!(s[1].uv, UvRect::new(10.0 / 128.0, 0.0, 18.0 / 128.0, 16.0 / 64.0));
    }

    #[test]
    fn scale_stretches_quads_and_advance() {
        let mut t = TextLayout::with_text("AB", font());
        t.set_scale(2.0, 0.5);

        let s = t.sprites();
        assert_eq!(s[0].size, Vec2::new(20.0, 10.0));
        assert_eq!(s[1].size, Vec2::new(16.0, 8.0));
        assert_eq!(s[1].position.x, 24.0 - 1.0);
        assert_eq!(t.total_width(), 36.0);
        assert_eq!(t.total_height(), 10.0);
    }

    #[test]
    fn setting_text_again_resets_totals() {
        let mut t = TextLayout::with_text("AAAA", font());
        t.set_text("B");
        assert_eq!(t.sprites().len(), 1);
        assert_eq!(t.total_width(), 8.0);
        assert_eq!(t.total_height(), 16.0);
    }

    #[test]
    fn set_position_moves_without_relayout() {
        let mut t = TextLayout::with_text("AB", font());
        let before: Vec<_> = t.sprites().iter().map(|s| s.size).collect();

        t.set_position(Vec2::new(10.0, 10.0));
        assert_eq!(positions(&t), vec![(11.0, 8.0), (21.0, 8.0)]);

        let after: Vec<_> = t.sprites().iter().map(|s| s.size).collect();
        assert_eq!(before, after);
    }

    #[test]
    fn missing_characters_are_skipped_without_fallback() {
        let t = TextLayout::with_text("AzB", font());
        let chars: Vec<char> = t.sprites().iter().map(|s| s.ch).collect();
        assert_eq!(chars, vec!['A', 'B']);
    }

    #[test]
    fn missing_characters_use_fallback_glyph() {
        let f = Rc::new(BitmapFont::clone(&font()).with_fallback('B'));
        let t = TextLayout::with_text("z", f);
        assert_eq!(t.sprites().len(), 1);
        assert_eq!(t.sprites()[0].ch, 'z');
        assert_eq!(t.sprites()[0].size, Vec2::new(8.0, 16.0));
    }

    #[test]
    fn spaces_advance_but_are_not_drawn() {
        let mut t = TextLayout::with_text("A B", font());
        t.set_color(Color::from_straight(1.0, 0.0, 0.0, 1.0));
        assert_eq!(t.sprites()[2].position.x, 12.0 + 6.0 - 1.0);

        let mut batcher = Batcher::new(16);
        t.submit(&mut batcher);
        let batches = batcher.take_batches();

        assert_eq!(batches.len(), 1);
        assert_eq!(batches[0].shader(), ShaderKind::Texture(TextureId(4)));
        assert_eq!(batches[0].len(), 2);
        assert!(batches[0].colors().iter().all(|c| *c == [1.0, 0.0, 0.0, 1.0]));
    }

    #[test]
    fn depth_is_carried_to_sprite_z() {
        let mut t = TextLayout::with_text("A", font());
        t.set_depth(-5.0);

        let mut batcher = Batcher::default();
        GameObject::render(&t, &mut batcher);
        assert_eq!(batcher.take_batches()[0].positions()[0], [1.0, -2.0, -5.0, 1.0]);
    }
}
