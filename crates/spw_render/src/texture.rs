use std::fmt;

use spw_core::{Color, PixelBuffer, RasterError, Rect};

use crate::device::{DeviceId, ResourceGuard};

/// A 2D texture resource. Pixel data is read and written as a whole; there is
/// no partial upload.
pub struct Texture2D {
    buffer: PixelBuffer,
    guard: ResourceGuard,
}

impl fmt::Debug for Texture2D {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Texture2D")
            .field("device", &self.guard.device_id())
            .field("width", &self.buffer.width())
            .field("height", &self.buffer.height())
            .finish()
    }
}

impl Texture2D {
    pub(crate) fn new(guard: ResourceGuard, buffer: PixelBuffer) -> Self {
        Self { buffer, guard }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.buffer.width(), self.buffer.height())
    }

    pub fn bounds(&self) -> Rect {
        self.buffer.bounds()
    }

    pub fn device_id(&self) -> DeviceId {
        self.guard.device_id()
    }

    /// Full-buffer readback.
    pub fn get_data(&self) -> &[Color] {
        self.buffer.pixels()
    }

    /// Full-buffer upload; `data` must hold exactly `width * height` pixels.
    pub fn set_data(&mut self, data: &[Color]) -> Result<(), RasterError> {
        self.buffer.copy_from(data)
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Mutable access for in-place generators. Dimensions cannot change.
    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        self.buffer.get(x, y)
    }
}

/// Off-screen draw surface that can later be sampled as a texture.
pub struct RenderTarget {
    texture: Texture2D,
}

impl fmt::Debug for RenderTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RenderTarget").field(&self.texture).finish()
    }
}

impl RenderTarget {
    pub(crate) fn new(texture: Texture2D) -> Self {
        Self { texture }
    }

    pub fn width(&self) -> u32 {
        self.texture.width()
    }

    pub fn height(&self) -> u32 {
        self.texture.height()
    }

    pub fn device_id(&self) -> DeviceId {
        self.texture.device_id()
    }

    pub fn clear(&mut self, color: Color) {
        self.texture.buffer.fill(color);
    }

    pub fn as_texture(&self) -> &Texture2D {
        &self.texture
    }

    pub fn surface(&self) -> &PixelBuffer {
        &self.texture.buffer
    }

    pub fn surface_mut(&mut self) -> &mut PixelBuffer {
        &mut self.texture.buffer
    }
}

#[cfg(test)]
mod tests {
    use crate::GraphicsDevice;
    use spw_core::{Color, RasterError};

    #[test]
    fn set_data_requires_full_buffer() {
        let device = GraphicsDevice::new(16, 16);
        let mut tex = device.create_texture(2, 2).expect("texture");
        let err = tex.set_data(&[Color::RED; 3]).expect_err("short upload");
        assert_eq!(
            err,
            RasterError::LengthMismatch {
                expected: 4,
                actual: 3
            }
        );
        tex.set_data(&[Color::RED; 4]).expect("full upload");
        assert!(tex.get_data().iter().all(|&c| c == Color::RED));
    }

    #[test]
    fn render_target_clear_and_sample() {
        let device = GraphicsDevice::new(16, 16);
        let mut target = device.create_render_target(3, 2).expect("target");
        target.clear(Color::BLUE);
        assert_eq!(target.as_texture().pixel(2, 1), Some(Color::BLUE));
        assert_eq!(target.device_id(), device.id());
    }
}
