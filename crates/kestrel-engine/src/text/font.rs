use std::collections::HashMap;
use std::fmt;

use crate::coords::UvRect;
use crate::texture::{TextureId, TextureImage, TextureLoadError, TextureStore};

use super::atlas::ShelfPacker;

/// Atlas sizes tried in order when rasterizing a font.
const ATLAS_SIZES: [u32; 4] = [256, 512, 1024, 2048];

/// Error returned by [`BitmapFont::rasterize`].
#[derive(Debug, Clone, PartialEq)]
pub enum FontLoadError {
    /// The font bytes could not be parsed.
    Parse(String),
    /// The glyphs do not fit in the largest supported atlas.
    AtlasFull { glyphs: usize, px: f32 },
    /// The charset produced no glyphs.
    EmptyCharset,
    /// The packed coverage could not be turned into an atlas texture.
    Atlas(TextureLoadError),
}

impl fmt::Display for FontLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FontLoadError::Parse(msg) => write!(f, "font load error: {msg}"),
            FontLoadError::AtlasFull { glyphs, px } => write!(
                f,
                "font load error: {glyphs} glyphs at {px}px do not fit in a {0}x{0} atlas",
                ATLAS_SIZES[ATLAS_SIZES.len() - 1]
            ),
            FontLoadError::EmptyCharset => write!(f, "font load error: empty charset"),
            FontLoadError::Atlas(e) => write!(f, "font load error: atlas texture: {e}"),
        }
    }
}

impl std::error::Error for FontLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FontLoadError::Atlas(e) => Some(e),
            _ => None,
        }
    }
}

impl From<TextureLoadError> for FontLoadError {
    fn from(e: TextureLoadError) -> Self {
        FontLoadError::Atlas(e)
    }
}

/// Placement of one character in the atlas, in atlas pixels.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct GlyphMetrics {
    /// Left edge in the atlas.
    pub x: u32,
    /// Top edge in the atlas.
    pub y: u32,
    pub width: u32,
    pub height: u32,
    /// Horizontal offset from the cursor to the glyph's left edge.
    pub x_offset: i32,
    /// Vertical offset from the line top to the glyph's top edge.
    pub y_offset: i32,
    /// Cursor advance after this glyph.
    pub x_advance: i32,
}

/// Glyph atlas texture plus per-character metrics.
#[derive(Debug, Clone)]
pub struct BitmapFont {
    texture: TextureId,
    atlas_width: u32,
    atlas_height: u32,
    line_height: f32,
    glyphs: HashMap<char, GlyphMetrics>,
    fallback: Option<char>,
}

impl BitmapFont {
    /// Empty font over an atlas already in a [`TextureStore`].
    pub fn new(texture: TextureId, atlas_width: u32, atlas_height: u32) -> Self {
        Self {
            texture,
            atlas_width,
            atlas_height,
            line_height: 0.0,
            glyphs: HashMap::new(),
            fallback: None,
        }
    }

    /// Character drawn in place of ones the font lacks.
    pub fn with_fallback(mut self, ch: char) -> Self {
        self.fallback = Some(ch);
        self
    }

    pub fn with_line_height(mut self, line_height: f32) -> Self {
        self.line_height = line_height;
        self
    }

    pub fn insert_glyph(&mut self, ch: char, metrics: GlyphMetrics) {
        self.glyphs.insert(ch, metrics);
    }

    /// Rasterizes `charset` from TrueType/OpenType bytes at `px` pixels and
    /// registers the atlas in `store`.
    ///
    /// The smallest atlas from 256² up to 2048² that holds every glyph is used.
    pub fn rasterize(
        bytes: &[u8],
        px: f32,
        charset: &str,
        store: &mut TextureStore,
    ) -> Result<Self, FontLoadError> {
        let font = fontdue::Font::from_bytes(
            bytes,
            fontdue::FontSettings { scale: px, ..fontdue::FontSettings::default() },
        )
        .map_err(|e| FontLoadError::Parse(e.to_string()))?;

        let mut chars: Vec<char> = charset.chars().collect();
        chars.sort_unstable();
        chars.dedup();
        if chars.is_empty() {
            return Err(FontLoadError::EmptyCharset);
        }

        let (ascent, line_height) = font
            .horizontal_line_metrics(px)
            .map_or((px, px * 1.2), |m| (m.ascent, m.new_line_size));

        let rasters: Vec<(char, fontdue::Metrics, Vec<u8>)> = chars
            .iter()
            .map(|&ch| {
                let (m, bitmap) = font.rasterize(ch, px);
                (ch, m, bitmap)
            })
            .collect();

        for size in ATLAS_SIZES {
            let Some((coverage, placed)) = pack(size, &rasters) else {
                log::debug!("font atlas {size}x{size} too small for {} glyphs", rasters.len());
                continue;
            };

            let image = TextureImage::from_coverage(size, size, &coverage)?;
            let texture = store.insert(image);

            let mut out = BitmapFont::new(texture, size, size).with_line_height(line_height);
            for ((ch, m, _), (x, y)) in rasters.iter().zip(placed) {
                let height = m.height as i32;
                out.insert_glyph(
                    *ch,
                    GlyphMetrics {
                        x,
                        y,
                        width: m.width as u32,
                        height: m.height as u32,
                        x_offset: m.xmin,
                        y_offset: (ascent - (m.ymin + height) as f32).round() as i32,
                        x_advance: m.advance_width.round() as i32,
                    },
                );
            }
            if out.glyphs.contains_key(&'?') {
                out.fallback = Some('?');
            }

            log::info!(
                "rasterized {} glyphs at {px}px into {size}x{size} atlas {:?}",
                out.glyphs.len(),
                texture
            );
            return Ok(out);
        }

        Err(FontLoadError::AtlasFull { glyphs: rasters.len(), px })
    }

    #[inline]
    pub fn texture(&self) -> TextureId {
        self.texture
    }

    #[inline]
    pub fn atlas_size(&self) -> (u32, u32) {
        (self.atlas_width, self.atlas_height)
    }

    #[inline]
    pub fn line_height(&self) -> f32 {
        self.line_height
    }

    #[inline]
    pub fn fallback(&self) -> Option<char> {
        self.fallback
    }

    /// Metrics for `ch`, without fallback.
    pub fn glyph(&self, ch: char) -> Option<&GlyphMetrics> {
        self.glyphs.get(&ch)
    }

    /// Metrics for `ch`, or for the fallback character.
    pub fn glyph_or_fallback(&self, ch: char) -> Option<&GlyphMetrics> {
        self.glyphs
            .get(&ch)
            .or_else(|| self.fallback.and_then(|f| self.glyphs.get(&f)))
    }

    /// Normalized atlas region of a glyph.
    pub fn uv(&self, glyph: &GlyphMetrics) -> UvRect {
        UvRect::from_atlas_region(
            glyph.x,
            glyph.y,
            glyph.width,
            glyph.height,
            self.atlas_width,
            self.atlas_height,
        )
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

/// Packs every non-empty raster into a `size`² coverage buffer.
///
/// Empty glyphs (spaces) get position `(0, 0)`.
fn pack(
    size: u32,
    rasters: &[(char, fontdue::Metrics, Vec<u8>)],
) -> Option<(Vec<u8>, Vec<(u32, u32)>)> {
    let mut packer = ShelfPacker::new(size, size);
    let mut coverage = vec![0u8; size as usize * size as usize];
    let mut placed = Vec::with_capacity(rasters.len());

    for (_, m, bitmap) in rasters {
        if m.width == 0 || m.height == 0 {
            placed.push((0, 0));
            continue;
        }

        let (x, y) = packer.place(m.width as u32, m.height as u32)?;
        for row in 0..m.height {
            let src = &bitmap[row * m.width..(row + 1) * m.width];
            let dst_start = (y as usize + row) * size as usize + x as usize;
            coverage[dst_start..dst_start + m.width].copy_from_slice(src);
        }
        placed.push((x, y));
    }

    Some((coverage, placed))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn font() -> BitmapFont {
        let mut f = BitmapFont::new(TextureId(0), 64, 32);
        f.insert_glyph('a', GlyphMetrics { x: 8, y: 4, width: 8, height: 16, ..Default::default() });
        f.insert_glyph('?', GlyphMetrics { x: 0, y: 0, width: 4, height: 4, ..Default::default() });
        f
    }

    #[test]
    fn uv_is_relative_to_atlas_size() {
        let f = font();
        let g = *f.glyph('a').unwrap();
        assert_eq!(f.uv(&g), UvRect::new(0.125, 0.125, 0.25, 0.625));
    }

    #[test]
    fn fallback_is_used_only_when_set() {
        let f = font();
        assert!(f.glyph_or_fallback('z').is_none());

        let f = f.with_fallback('?');
        assert_eq!(f.glyph_or_fallback('z').unwrap().width, 4);
        assert!(f.glyph('z').is_none());
    }

    #[test]
    fn invalid_font_bytes_are_rejected() {
        let mut store = TextureStore::new();
        let err = BitmapFont::rasterize(b"not a font", 16.0, "abc", &mut store).unwrap_err();
        assert!(matches!(err, FontLoadError::Parse(_)));
        assert!(store.is_empty());
    }

    #[test]
    fn atlas_texture_failure_keeps_its_cause() {
        let err: FontLoadError = TextureImage::from_coverage(4, 4, &[0; 3]).unwrap_err().into();
        assert_eq!(
            err,
            FontLoadError::Atlas(TextureLoadError::SizeMismatch { expected: 64, actual: 12 })
        );
        assert!(err.to_string().contains("atlas texture"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn pack_blits_rows_at_placed_offsets() {
        let m = fontdue::Metrics { width: 2, height: 2, ..Default::default() };
        let rasters = vec![('x', m, vec![1, 2, 3, 4])];

        let (coverage, placed) = pack(8, &rasters).unwrap();
        assert_eq!(placed, vec![(1, 1)]);
        assert_eq!(&coverage[9..11], &[1, 2]);
        assert_eq!(&coverage[17..19], &[3, 4]);
    }

    #[test]
    fn pack_gives_up_when_atlas_is_too_small() {
        let m = fontdue::Metrics { width: 6, height: 6, ..Default::default() };
        let rasters = vec![('x', m, vec![0; 36]), ('y', m, vec![0; 36])];
        assert!(pack(8, &rasters).is_none());
    }
}
