//! Row-major pixel storage shared by textures and render targets.

use std::fmt;

use crate::color::Color;
use crate::geometry::Rect;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RasterError {
    /// Width or height is zero.
    InvalidDimensions { width: u32, height: u32 },
    /// Pixel slice length does not equal `width * height`.
    LengthMismatch { expected: usize, actual: usize },
    /// A region extends past the buffer edge.
    RegionOutOfBounds { region: Rect, width: u32, height: u32 },
}

impl fmt::Display for RasterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDimensions { width, height } => {
                write!(f, "invalid buffer dimensions {width}x{height}")
            }
            Self::LengthMismatch { expected, actual } => {
                write!(f, "pixel data has {actual} entries, expected {expected}")
            }
            Self::RegionOutOfBounds {
                region,
                width,
                height,
            } => write!(
                f,
                "region {}x{} at ({}, {}) exceeds {width}x{height} buffer",
                region.width, region.height, region.x, region.y
            ),
        }
    }
}

impl std::error::Error for RasterError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl PixelBuffer {
    /// Transparent buffer.
    pub fn new(width: u32, height: u32) -> Result<Self, RasterError> {
        Self::filled(width, height, Color::TRANSPARENT)
    }

    pub fn filled(width: u32, height: u32, color: Color) -> Result<Self, RasterError> {
        let len = checked_len(width, height)?;
        Ok(Self {
            width,
            height,
            pixels: vec![color; len],
        })
    }

    /// 1x1 buffer holding `color`.
    pub fn single(color: Color) -> Self {
        Self {
            width: 1,
            height: 1,
            pixels: vec![color],
        }
    }

    pub fn from_pixels(width: u32, height: u32, pixels: Vec<Color>) -> Result<Self, RasterError> {
        let expected = checked_len(width, height)?;
        if pixels.len() != expected {
            return Err(RasterError::LengthMismatch {
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Build from tightly packed RGBA8 bytes.
    pub fn from_rgba8(width: u32, height: u32, bytes: &[u8]) -> Result<Self, RasterError> {
        let expected = checked_len(width, height)?;
        if bytes.len() != expected * 4 {
            return Err(RasterError::LengthMismatch {
                expected: expected * 4,
                actual: bytes.len(),
            });
        }
        let pixels = bytes
            .chunks_exact(4)
            .map(|c| Color::rgba(c[0], c[1], c[2], c[3]))
            .collect();
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn to_rgba8(&self) -> Vec<u8> {
        self.pixels.iter().flat_map(|c| c.to_array()).collect()
    }

    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_size(self.width, self.height)
    }

    pub fn pixels(&self) -> &[Color] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [Color] {
        &mut self.pixels
    }

    /// Replace every pixel. The slice must cover the whole buffer.
    pub fn copy_from(&mut self, data: &[Color]) -> Result<(), RasterError> {
        if data.len() != self.pixels.len() {
            return Err(RasterError::LengthMismatch {
                expected: self.pixels.len(),
                actual: data.len(),
            });
        }
        self.pixels.copy_from_slice(data);
        Ok(())
    }

    #[inline]
    pub fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get(&self, x: u32, y: u32) -> Option<Color> {
        if x < self.width && y < self.height {
            Some(self.pixels[self.index(x, y)])
        } else {
            None
        }
    }

    /// Write one pixel; coordinates outside the buffer are ignored.
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        if x < self.width && y < self.height {
            let i = self.index(x, y);
            self.pixels[i] = color;
        }
    }

    pub fn fill(&mut self, color: Color) {
        self.pixels.fill(color);
    }

    pub fn row(&self, y: u32) -> &[Color] {
        let start = self.index(0, y);
        &self.pixels[start..start + self.width as usize]
    }

    pub fn column(&self, x: u32) -> impl Iterator<Item = Color> + '_ {
        (0..self.height).map(move |y| self.pixels[self.index(x, y)])
    }

    /// Copy a sub-rectangle into a new buffer.
    pub fn region(&self, region: Rect) -> Result<PixelBuffer, RasterError> {
        if region.x < 0
            || region.y < 0
            || region.right() > self.width as i32
            || region.bottom() > self.height as i32
        {
            return Err(RasterError::RegionOutOfBounds {
                region,
                width: self.width,
                height: self.height,
            });
        }
        let mut out = PixelBuffer::new(region.width, region.height)?;
        for y in 0..region.height {
            let src = self.index(region.x as u32, region.y as u32 + y);
            let dst = out.index(0, y);
            out.pixels[dst..dst + region.width as usize]
                .copy_from_slice(&self.pixels[src..src + region.width as usize]);
        }
        Ok(out)
    }
}

fn checked_len(width: u32, height: u32) -> Result<usize, RasterError> {
    if width == 0 || height == 0 {
        return Err(RasterError::InvalidDimensions { width, height });
    }
    (width as usize)
        .checked_mul(height as usize)
        .ok_or(RasterError::InvalidDimensions { width, height })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_dimension_is_rejected() {
        assert_eq!(
            PixelBuffer::new(0, 4),
            Err(RasterError::InvalidDimensions {
                width: 0,
                height: 4
            })
        );
        assert!(PixelBuffer::new(3, 0).is_err());
    }

    #[test]
    fn from_pixels_checks_length() {
        let err = PixelBuffer::from_pixels(2, 2, vec![Color::RED; 3]).expect_err("short data");
        assert_eq!(
            err,
            RasterError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        );
    }

    #[test]
    fn row_major_indexing() {
        let mut buf = PixelBuffer::new(3, 2).expect("buffer");
        buf.set(2, 1, Color::RED);
        assert_eq!(buf.pixels()[5], Color::RED);
        assert_eq!(buf.row(1)[2], Color::RED);
        assert_eq!(buf.get(3, 0), None);
    }

    #[test]
    fn rgba8_round_trip_preserves_bytes() {
        let bytes = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let buf = PixelBuffer::from_rgba8(2, 1, &bytes).expect("buffer");
        assert_eq!(buf.get(1, 0), Some(Color::rgba(5, 6, 7, 8)));
        assert_eq!(buf.to_rgba8(), bytes.to_vec());
    }

    #[test]
    fn region_copies_and_checks_bounds() {
        let mut buf = PixelBuffer::new(4, 4).expect("buffer");
        buf.set(1, 2, Color::GREEN);
        let sub = buf.region(Rect::new(1, 1, 2, 2)).expect("region");
        assert_eq!(sub.get(0, 1), Some(Color::GREEN));
        assert!(buf.region(Rect::new(3, 3, 2, 2)).is_err());
    }
}
