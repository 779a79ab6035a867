//! Monospace bitmap fonts laid out as a glyph grid on one texture.

use std::rc::Rc;

use glam::Vec2;
use spw_core::{Color, PixelBuffer, Rect};

use crate::device::GraphicsDevice;
use crate::font_data::{FIRST_CHAR, FONT_8X8, GLYPH_COUNT};
use crate::texture::Texture2D;

const BUILTIN_GLYPH_SIZE: u32 = 8;
const BUILTIN_COLUMNS: u32 = 16;

#[derive(Debug, Clone)]
pub struct SpriteFont {
    texture: Rc<Texture2D>,
    glyph_width: u32,
    glyph_height: u32,
    columns: u32,
    first_char: char,
    glyph_count: u32,
    /// Extra horizontal pixels between glyphs.
    pub spacing: u32,
    /// Drawn in place of characters the font does not cover.
    pub fallback: Option<char>,
}

impl SpriteFont {
    /// Glyphs are read left-to-right, top-to-bottom starting at `first_char`.
    pub fn from_grid(
        texture: Rc<Texture2D>,
        glyph_width: u32,
        glyph_height: u32,
        first_char: char,
        glyph_count: u32,
    ) -> Option<Self> {
        if glyph_width == 0 || glyph_height == 0 || glyph_width > texture.width() {
            return None;
        }
        let columns = texture.width() / glyph_width;
        let rows = texture.height() / glyph_height;
        if columns * rows < glyph_count {
            return None;
        }
        Some(Self {
            texture,
            glyph_width,
            glyph_height,
            columns,
            first_char,
            glyph_count,
            spacing: 0,
            fallback: Some('?'),
        })
    }

    /// Printable ASCII in white 8x8 glyphs on a transparent background;
    /// tint it when drawing.
    pub fn builtin(device: &GraphicsDevice) -> Self {
        let rows = (GLYPH_COUNT as u32).div_ceil(BUILTIN_COLUMNS);
        let width = BUILTIN_COLUMNS * BUILTIN_GLYPH_SIZE;
        let height = rows * BUILTIN_GLYPH_SIZE;
        let mut pixels = vec![Color::TRANSPARENT; (width * height) as usize];
        for glyph in 0..GLYPH_COUNT {
            let cell_x = (glyph as u32 % BUILTIN_COLUMNS) * BUILTIN_GLYPH_SIZE;
            let cell_y = (glyph as u32 / BUILTIN_COLUMNS) * BUILTIN_GLYPH_SIZE;
            for (row, bits) in FONT_8X8[glyph * 8..glyph * 8 + 8].iter().enumerate() {
                for col in 0..BUILTIN_GLYPH_SIZE {
                    if (bits >> (7 - col)) & 1 != 0 {
                        let i = (cell_y + row as u32) * width + cell_x + col;
                        pixels[i as usize] = Color::WHITE;
                    }
                }
            }
        }
        let buffer = match PixelBuffer::from_pixels(width, height, pixels) {
            Ok(buffer) => buffer,
            Err(err) => unreachable!("builtin font atlas has fixed dimensions: {err}"),
        };
        Self {
            texture: Rc::new(device.texture_from_buffer(buffer)),
            glyph_width: BUILTIN_GLYPH_SIZE,
            glyph_height: BUILTIN_GLYPH_SIZE,
            columns: BUILTIN_COLUMNS,
            first_char: FIRST_CHAR as char,
            glyph_count: GLYPH_COUNT as u32,
            spacing: 0,
            fallback: Some('?'),
        }
    }

    pub fn texture(&self) -> &Texture2D {
        &self.texture
    }

    pub fn glyph_size(&self) -> (u32, u32) {
        (self.glyph_width, self.glyph_height)
    }

    /// Horizontal advance per glyph and vertical advance per line.
    pub fn cell_advance(&self) -> (u32, u32) {
        (self.glyph_width + self.spacing, self.glyph_height)
    }

    pub fn glyph_rect(&self, ch: char) -> Option<Rect> {
        self.glyph_index(ch)
            .or_else(|| self.fallback.and_then(|f| self.glyph_index(f)))
            .map(|index| {
                Rect::new(
                    ((index % self.columns) * self.glyph_width) as i32,
                    ((index / self.columns) * self.glyph_height) as i32,
                    self.glyph_width,
                    self.glyph_height,
                )
            })
    }

    fn glyph_index(&self, ch: char) -> Option<u32> {
        let offset = (ch as u32).checked_sub(self.first_char as u32)?;
        (offset < self.glyph_count).then_some(offset)
    }

    /// Unscaled size of `text` in pixels.
    pub fn measure(&self, text: &str) -> Vec2 {
        let (advance, line_height) = self.cell_advance();
        let mut widest = 0usize;
        let mut lines = 0usize;
        for line in text.split('\n') {
            widest = widest.max(line.chars().count());
            lines += 1;
        }
        Vec2::new((widest as u32 * advance) as f32, (lines as u32 * line_height) as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_covers_printable_ascii() {
        let device = GraphicsDevice::new(16, 16);
        let font = SpriteFont::builtin(&device);
        assert_eq!(font.glyph_size(), (8, 8));
        assert_eq!(font.glyph_rect(' '), Some(Rect::new(0, 0, 8, 8)));
        assert_eq!(font.glyph_rect('0'), Some(Rect::new(0, 8, 8, 8)));
        assert!(font.glyph_rect('~').is_some());
    }

    #[test]
    fn unknown_characters_use_fallback() {
        let device = GraphicsDevice::new(16, 16);
        let mut font = SpriteFont::builtin(&device);
        assert_eq!(font.glyph_rect('é'), font.glyph_rect('?'));
        font.fallback = None;
        assert_eq!(font.glyph_rect('é'), None);
    }

    #[test]
    fn builtin_glyph_has_ink() {
        let device = GraphicsDevice::new(16, 16);
        let font = SpriteFont::builtin(&device);
        let rect = font.glyph_rect('A').expect("glyph");
        let ink = (0..8)
            .flat_map(|y| (0..8).map(move |x| (x, y)))
            .filter(|&(x, y)| {
                font.texture().pixel(rect.x as u32 + x, rect.y as u32 + y) == Some(Color::WHITE)
            })
            .count();
        assert!(ink > 8);
    }

    #[test]
    fn measure_counts_longest_line() {
        let device = GraphicsDevice::new(16, 16);
        let font = SpriteFont::builtin(&device);
        assert_eq!(font.measure("abc\nde"), Vec2::new(24.0, 16.0));
    }

    #[test]
    fn from_grid_rejects_too_small_texture() {
        let device = GraphicsDevice::new(16, 16);
        let tex = Rc::new(device.create_texture(16, 8).expect("texture"));
        assert!(SpriteFont::from_grid(Rc::clone(&tex), 8, 8, 'A', 2).is_some());
        assert!(SpriteFont::from_grid(tex, 8, 8, 'A', 3).is_none());
    }
}
