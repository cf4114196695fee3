use std::collections::HashMap;
use std::fmt;

/// Error returned when an image cannot become a texture.
#[derive(Debug, Clone, PartialEq)]
pub enum TextureLoadError {
    /// The encoded bytes could not be decoded.
    Decode(String),
    /// Width or height is zero.
    Empty,
    /// Pixel buffer length does not match `width * height * 4`.
    SizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for TextureLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TextureLoadError::Decode(msg) => write!(f, "texture decode error: {msg}"),
            TextureLoadError::Empty => write!(f, "texture has zero width or height"),
            TextureLoadError::SizeMismatch { expected, actual } => write!(
                f,
                "texture pixel buffer has {actual} bytes, expected {expected}"
            ),
        }
    }
}

impl std::error::Error for TextureLoadError {}

/// Opaque handle to a texture in a [`TextureStore`].
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct TextureId(pub(crate) u32);

/// Premultiplied RGBA8 pixels, rows top to bottom.
#[derive(Debug, Clone, PartialEq)]
pub struct TextureImage {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl TextureImage {
    /// Wraps premultiplied RGBA8 pixels.
    pub fn from_premul_rgba(
        width: u32,
        height: u32,
        pixels: Vec<u8>,
    ) -> Result<Self, TextureLoadError> {
        if width == 0 || height == 0 {
            return Err(TextureLoadError::Empty);
        }
        let expected = width as usize * height as usize * 4;
        if pixels.len() != expected {
            return Err(TextureLoadError::SizeMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self { width, height, pixels })
    }

    /// Wraps straight-alpha RGBA8 pixels, premultiplying them.
    pub fn from_straight_rgba(
        width: u32,
        height: u32,
        mut pixels: Vec<u8>,
    ) -> Result<Self, TextureLoadError> {
        for px in pixels.chunks_exact_mut(4) {
            let a = px[3] as u16;
            for c in &mut px[..3] {
                *c = ((*c as u16 * a + 127) / 255) as u8;
            }
        }
        Self::from_premul_rgba(width, height, pixels)
    }

    /// Builds a white texture whose alpha is `coverage` (one byte per pixel).
    ///
    /// Used for glyph atlases: tinting happens in the shader.
    pub fn from_coverage(width: u32, height: u32, coverage: &[u8]) -> Result<Self, TextureLoadError> {
        let pixels = coverage.iter().flat_map(|&a| [a, a, a, a]).collect();
        Self::from_premul_rgba(width, height, pixels)
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }
}

struct Entry {
    image: TextureImage,
    generation: u64,
}

/// Owns every texture the renderer may sample.
#[derive(Default)]
pub struct TextureStore {
    entries: HashMap<TextureId, Entry>,
    next_id: u32,
    next_generation: u64,
}

impl TextureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an image and returns its handle.
    pub fn insert(&mut self, image: TextureImage) -> TextureId {
        let id = TextureId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        self.put(id, image);
        log::debug!("texture {:?} stored", id);
        id
    }

    /// Decodes a PNG or BMP image and stores it.
    pub fn load_encoded(&mut self, bytes: &[u8]) -> Result<TextureId, TextureLoadError> {
        let decoded = image::load_from_memory(bytes)
            .map_err(|e| TextureLoadError::Decode(e.to_string()))?
            .into_rgba8();
        let (w, h) = decoded.dimensions();
        let image = TextureImage::from_straight_rgba(w, h, decoded.into_raw())?;
        Ok(self.insert(image))
    }

    /// Replaces the image behind `id`, bumping its generation.
    ///
    /// Returns `false` if `id` is unknown.
    pub fn replace(&mut self, id: TextureId, image: TextureImage) -> bool {
        if !self.entries.contains_key(&id) {
            return false;
        }
        self.put(id, image);
        true
    }

    pub fn get(&self, id: TextureId) -> Option<&TextureImage> {
        self.entries.get(&id).map(|e| &e.image)
    }

    /// Generation of the current image; changes on every [`replace`](Self::replace).
    pub fn generation(&self, id: TextureId) -> Option<u64> {
        self.entries.get(&id).map(|e| e.generation)
    }

    pub fn remove(&mut self, id: TextureId) -> Option<TextureImage> {
        self.entries.remove(&id).map(|e| e.image)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn put(&mut self, id: TextureId, image: TextureImage) {
        let generation = self.next_generation;
        self.next_generation += 1;
        self.entries.insert(id, Entry { image, generation });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn one_pixel(rgba: [u8; 4]) -> TextureImage {
        TextureImage::from_straight_rgba(1, 1, rgba.to_vec()).unwrap()
    }

    #[test]
    fn straight_pixels_are_premultiplied() {
        let img = one_pixel([255, 128, 0, 128]);
        assert_eq!(img.pixels(), &[128, 64, 0, 128]);
    }

    #[test]
    fn size_mismatch_is_rejected() {
        let err = TextureImage::from_premul_rgba(2, 2, vec![0; 4]).unwrap_err();
        assert_eq!(err, TextureLoadError::SizeMismatch { expected: 16, actual: 4 });
    }

    #[test]
    fn zero_sized_image_is_rejected() {
        assert_eq!(
            TextureImage::from_premul_rgba(0, 4, Vec::new()).unwrap_err(),
            TextureLoadError::Empty
        );
    }

    #[test]
    fn coverage_expands_to_white_premultiplied() {
        let img = TextureImage::from_coverage(2, 1, &[0, 200]).unwrap();
        assert_eq!(img.pixels(), &[0, 0, 0, 0, 200, 200, 200, 200]);
    }

    #[test]
    fn replace_bumps_generation() {
        let mut store = TextureStore::new();
        let id = store.insert(one_pixel([0, 0, 0, 255]));
        let g0 = store.generation(id).unwrap();

        assert!(store.replace(id, one_pixel([255, 255, 255, 255])));
        assert!(store.generation(id).unwrap() > g0);
        assert_eq!(store.get(id).unwrap().pixels(), &[255, 255, 255, 255]);
    }

    #[test]
    fn handles_are_unique_and_removable() {
        let mut store = TextureStore::new();
        let a = store.insert(one_pixel([1, 2, 3, 255]));
        let b = store.insert(one_pixel([1, 2, 3, 255]));
        assert_ne!(a, b);

        assert!(store.remove(a).is_some());
        assert!(store.get(a).is_none());
        assert!(!store.replace(a, one_pixel([0, 0, 0, 0])));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let mut store = TextureStore::new();
        let err = store.load_encoded(b"definitely not a png").unwrap_err();
        assert!(matches!(err, TextureLoadError::Decode(_)));
        assert!(store.is_empty());
    }
}
