/// Pixels left empty around every packed rectangle.
pub(crate) const PADDING: u32 = 1;

/// Shelf (row) packer for glyph atlases.
///
/// Rectangles are placed left to right; when one does not fit horizontally a
/// new shelf starts below the tallest rectangle of the current one.
#[derive(Debug, Clone)]
pub struct ShelfPacker {
    width: u32,
    height: u32,
    cursor_x: u32,
    cursor_y: u32,
    row_height: u32,
}

impl ShelfPacker {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            cursor_x: PADDING,
            cursor_y: PADDING,
            row_height: 0,
        }
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Reserves a `w` x `h` block and returns its top-left corner.
    ///
    /// Returns `None` once the atlas has no room left for it.
    pub fn place(&mut self, w: u32, h: u32) -> Option<(u32, u32)> {
        if w.checked_add(2 * PADDING)? > self.width {
            return None;
        }

        if self.cursor_x.checked_add(w)?.checked_add(PADDING)? > self.width {
            self.cursor_y = self
                .cursor_y
                .checked_add(self.row_height)?
                .checked_add(PADDING)?;
            self.cursor_x = PADDING;
            self.row_height = 0;
        }

        if self.cursor_y.checked_add(h)?.checked_add(PADDING)? > self.height {
            return None;
        }

        let pos = (self.cursor_x, self.cursor_y);
        self.cursor_x += w + PADDING;
        self.row_height = self.row_height.max(h);
        Some(pos)
    }
}
