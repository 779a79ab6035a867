//! Procedural texture generation and in-place image transforms.
//!
//! Every generator returns a new texture owned by the caller. The in-place
//! transforms (`overlay_image`, `replace_colors`) validate their arguments
//! before touching any pixel.

use std::cell::OnceCell;
use std::collections::HashMap;
use std::rc::Rc;

use glam::{UVec2, Vec4};
use spw_core::circle::{filled_circle, hollow_circle};
use spw_core::{Color, PixelBuffer, Rect};
use spw_render::{GraphicsDevice, Texture2D};

use crate::error::TextureError;

/// How `overlay_image` combines an overlay pixel with the pixel beneath it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverlayType {
    /// The overlay pixel wins.
    #[default]
    Replace,
    /// Per-component mean of both pixels.
    Merge,
    /// Per-component sum, saturating at 255.
    AddMerge,
}

impl OverlayType {
    fn combine(self, under: Color, over: Color) -> Color {
        match self {
            Self::Replace => over,
            Self::Merge => {
                let mean = |a: u8, b: u8| ((a as u16 + b as u16) / 2) as u8;
                Color::rgba(
                    mean(under.r, over.r),
                    mean(under.g, over.g),
                    mean(under.b, over.b),
                    mean(under.a, over.a),
                )
            }
            Self::AddMerge => Color::rgba(
                under.r.saturating_add(over.r),
                under.g.saturating_add(over.g),
                under.b.saturating_add(over.b),
                under.a.saturating_add(over.a),
            ),
        }
    }
}

pub struct TextureFactory {
    device: GraphicsDevice,
    white_pixel: OnceCell<Rc<Texture2D>>,
    transparent_pixel: OnceCell<Rc<Texture2D>>,
}

impl TextureFactory {
    pub fn new(device: GraphicsDevice) -> Self {
        Self {
            device,
            white_pixel: OnceCell::new(),
            transparent_pixel: OnceCell::new(),
        }
    }

    pub fn device(&self) -> &GraphicsDevice {
        &self.device
    }

    /// Shared 1x1 opaque white texture, built on first use.
    pub fn white_pixel(&self) -> Rc<Texture2D> {
        Rc::clone(
            self.white_pixel
                .get_or_init(|| Rc::new(self.single_pixel(Color::WHITE))),
        )
    }

    /// Shared 1x1 fully transparent texture, built on first use.
    pub fn transparent_pixel(&self) -> Rc<Texture2D> {
        Rc::clone(
            self.transparent_pixel
                .get_or_init(|| Rc::new(self.single_pixel(Color::TRANSPARENT))),
        )
    }

    fn single_pixel(&self, color: Color) -> Texture2D {
        self.device.texture_from_buffer(PixelBuffer::single(color))
    }

    pub fn create_rectangle(
        &self,
        width: u32,
        height: u32,
        color: Color,
    ) -> Result<Texture2D, TextureError> {
        let buffer = PixelBuffer::filled(width, height, color)?;
        log::debug!("Generated {width}x{height} rectangle");
        Ok(self.device.texture_from_buffer(buffer))
    }

    /// One-pixel border in `color` around a transparent interior.
    pub fn create_hollow_rectangle(
        &self,
        width: u32,
        height: u32,
        color: Color,
    ) -> Result<Texture2D, TextureError> {
        let mut buffer = PixelBuffer::new(width, height)?;
        for y in 0..height {
            for x in 0..width {
                if x == 0 || y == 0 || x == width - 1 || y == height - 1 {
                    buffer.set(x, y, color);
                }
            }
        }
        log::debug!("Generated {width}x{height} hollow rectangle");
        Ok(self.device.texture_from_buffer(buffer))
    }

    pub fn create_circle(&self, radius: f32, color: Color) -> Result<Texture2D, TextureError> {
        let raster = filled_circle(radius)?;
        self.paint_circle(raster.side, &raster.points, color)
    }

    pub fn create_hollow_circle(
        &self,
        radius: f32,
        color: Color,
    ) -> Result<Texture2D, TextureError> {
        let raster = hollow_circle(radius)?;
        self.paint_circle(raster.side, &raster.points, color)
    }

    fn paint_circle(
        &self,
        side: u32,
        points: &[(u32, u32)],
        color: Color,
    ) -> Result<Texture2D, TextureError> {
        let mut buffer = PixelBuffer::new(side, side)?;
        for &(x, y) in points {
            buffer.set(x, y, color);
        }
        log::debug!("Generated {side}x{side} circle with {} points", points.len());
        Ok(self.device.texture_from_buffer(buffer))
    }

    /// `frame_count` frames stepping linearly from `first` towards `last`.
    ///
    /// Frame `i` (1-based) holds `first + i * (last - first) / frame_count`,
    /// so the final frame equals `last` and a single frame is just `last`.
    pub fn create_fade(
        &self,
        first: &Texture2D,
        last: &Texture2D,
        frame_count: usize,
    ) -> Result<Vec<Texture2D>, TextureError> {
        if first.device_id() != last.device_id() {
            return Err(TextureError::DeviceMismatch {
                first: first.device_id(),
                second: last.device_id(),
            });
        }
        if first.size() != last.size() {
            return Err(TextureError::SizeMismatch {
                first: first.size(),
                second: last.size(),
            });
        }
        if frame_count < 1 {
            return Err(TextureError::InvalidFrameCount(frame_count));
        }

        let steps = frame_count as f32;
        let mut running: Vec<Vec4> = first.get_data().iter().map(|c| c.to_vec4()).collect();
        let deltas: Vec<Vec4> = first
            .get_data()
            .iter()
            .zip(last.get_data())
            .map(|(a, b)| (b.to_vec4() - a.to_vec4()) / steps)
            .collect();

        let (width, height) = first.size();
        let mut frames = Vec::with_capacity(frame_count);
        for _ in 0..frame_count {
            for (value, delta) in running.iter_mut().zip(&deltas) {
                *value += *delta;
            }
            let pixels = running
                .iter()
                .map(|&v| Color::from_vec4_non_premultiplied(v))
                .collect();
            let buffer = PixelBuffer::from_pixels(width, height, pixels)?;
            frames.push(self.device.texture_from_buffer(buffer));
        }
        log::debug!("Generated {frame_count}-frame fade at {width}x{height}");
        Ok(frames)
    }

    /// The frames of `create_fade` laid left to right on one transparent
    /// strip, `frame_count` frames wide.
    pub fn create_fade_strip(
        &self,
        first: &Texture2D,
        last: &Texture2D,
        frame_count: usize,
    ) -> Result<Texture2D, TextureError> {
        let (width, height) = first.size();
        let strip_width = u32::try_from(frame_count)
            .ok()
            .and_then(|n| n.checked_mul(width))
            .ok_or(TextureError::StripTooWide {
                frame_width: width,
                frames: frame_count,
            })?;
        let frames = self.create_fade(first, last, frame_count)?;

        let mut strip = self.create_rectangle(strip_width, height, Color::TRANSPARENT)?;
        for (i, frame) in (0u32..).zip(&frames) {
            self.overlay_image(
                &mut strip,
                frame,
                UVec2::new(i * width, 0),
                OverlayType::Replace,
            )?;
        }
        Ok(strip)
    }

    /// Draw `overlay` onto `main` with its top-left corner at `origin`.
    /// Fully transparent overlay pixels leave `main` untouched.
    pub fn overlay_image(
        &self,
        main: &mut Texture2D,
        overlay: &Texture2D,
        origin: UVec2,
        overlay_type: OverlayType,
    ) -> Result<(), TextureError> {
        let fits = |offset: u32, extent: u32, limit: u32| {
            offset
                .checked_add(extent)
                .is_some_and(|end| end <= limit)
        };
        if !fits(origin.x, overlay.width(), main.width())
            || !fits(origin.y, overlay.height(), main.height())
        {
            return Err(TextureError::OverlayOutOfBounds {
                origin: (origin.x, origin.y),
                overlay: overlay.size(),
                main: main.size(),
            });
        }

        let src = overlay.buffer();
        let dst = main.buffer_mut();
        for y in 0..src.height() {
            for x in 0..src.width() {
                let over = src.pixels()[src.index(x, y)];
                if over == Color::TRANSPARENT {
                    continue;
                }
                let i = dst.index(origin.x + x, origin.y + y);
                let pixels = dst.pixels_mut();
                pixels[i] = overlay_type.combine(pixels[i], over);
            }
        }
        Ok(())
    }

    /// Trim whole rows and columns of whitespace from each edge. Transparent
    /// pixels always count as whitespace.
    pub fn crop_whitespace(
        &self,
        original: &Texture2D,
        whitespace_colors: &[Color],
    ) -> Result<Texture2D, TextureError> {
        let buffer = original.buffer();
        let (width, height) = original.size();
        let is_blank = |c: Color| c == Color::TRANSPARENT || whitespace_colors.contains(&c);
        let blank_row = |y: u32| buffer.row(y).iter().all(|&c| is_blank(c));
        let blank_column = |x: u32| buffer.column(x).all(|c| is_blank(c));

        let top = (0..height).take_while(|&y| blank_row(y)).count() as u32;
        let bottom = (0..height).rev().take_while(|&y| blank_row(y)).count() as u32;
        let left = (0..width).take_while(|&x| blank_column(x)).count() as u32;
        let right = (0..width).rev().take_while(|&x| blank_column(x)).count() as u32;

        if top + bottom >= height || left + right >= width {
            return Err(TextureError::EntirelyWhitespace { width, height });
        }

        let region = Rect::new(
            left as i32,
            top as i32,
            width - left - right,
            height - top - bottom,
        );
        let cropped = buffer.region(region)?;
        log::debug!(
            "Cropped {width}x{height} to {}x{} (t{top} b{bottom} l{left} r{right})",
            region.width,
            region.height
        );
        Ok(self.device.texture_from_buffer(cropped))
    }

    /// Swap every pixel that exactly matches a key of `color_map` for its value.
    pub fn replace_colors(&self, image: &mut Texture2D, color_map: &HashMap<Color, Color>) {
        if color_map.is_empty() {
            return;
        }
        for pixel in image.buffer_mut().pixels_mut() {
            if let Some(&to) = color_map.get(pixel) {
                *pixel = to;
            }
        }
    }
}
