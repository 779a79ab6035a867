//! Two-colour horizontal progress bar images.

use spw_core::{Color, PixelBuffer};
use spw_render::Texture2D;

use crate::error::TextureError;
use crate::factory::TextureFactory;

impl TextureFactory {
    /// Bar whose leftmost `round(fraction * width)` columns are `fill` and the
    /// rest `empty`.
    pub fn create_progress_bar(
        &self,
        width: u32,
        height: u32,
        fraction: f32,
        fill: Color,
        empty: Color,
    ) -> Result<Texture2D, TextureError> {
        if !(0.0..=1.0).contains(&fraction) {
            return Err(TextureError::InvalidFraction(fraction));
        }
        let mut buffer = PixelBuffer::filled(width, height, empty)?;
        let filled = (fraction * width as f32).round() as u32;
        for y in 0..height {
            for x in 0..filled {
                buffer.set(x, y, fill);
            }
        }
        Ok(self.device().texture_from_buffer(buffer))
    }

    /// Recover the fraction of a bar drawn with `fill`, measured along the
    /// top row.
    pub fn parse_progress_bar(&self, image: &Texture2D, fill: Color) -> Result<f32, TextureError> {
        let mut colors: Vec<Color> = Vec::with_capacity(2);
        for &c in image.get_data() {
            if !colors.contains(&c) {
                colors.push(c);
                if colors.len() > 2 {
                    let total = count_distinct(image.get_data());
                    return Err(TextureError::TooManyColors(total));
                }
            }
        }
        let filled = image
            .buffer()
            .row(0)
            .iter()
            .take_while(|&&c| c == fill)
            .count();
        Ok(filled as f32 / image.width() as f32)
    }
}

fn count_distinct(pixels: &[Color]) -> usize {
    let mut seen = std::collections::HashSet::new();
    pixels.iter().filter(|c| seen.insert(**c)).count()
}
