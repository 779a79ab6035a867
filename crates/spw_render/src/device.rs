//! Software graphics device.
//!
//! The device is the factory and owner-of-record for every texture and render
//! target. Each resource holds a guard that keeps the device alive and
//! decrements the live count when dropped, so disposal is deterministic and
//! observable. Handles are `Rc`-shared: the whole pipeline runs on the thread
//! that owns the device.

use std::cell::Cell;
use std::fmt;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use spw_core::{Color, PixelBuffer, RasterError, Rect};

use crate::texture::{RenderTarget, Texture2D};

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceId(u64);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "device#{}", self.0)
    }
}

struct DeviceShared {
    id: DeviceId,
    viewport: (u32, u32),
    live_textures: Cell<usize>,
    live_render_targets: Cell<usize>,
}

#[derive(Clone)]
pub struct GraphicsDevice {
    shared: Rc<DeviceShared>,
}

impl fmt::Debug for GraphicsDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphicsDevice")
            .field("id", &self.shared.id)
            .field("viewport", &self.shared.viewport)
            .field("live_textures", &self.shared.live_textures.get())
            .field("live_render_targets", &self.shared.live_render_targets.get())
            .finish()
    }
}

impl PartialEq for GraphicsDevice {
    fn eq(&self, other: &Self) -> bool {
        self.shared.id == other.shared.id
    }
}

impl Eq for GraphicsDevice {}

impl GraphicsDevice {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        let id = DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "Created {} with {}x{} viewport",
            id,
            viewport_width,
            viewport_height
        );
        Self {
            shared: Rc::new(DeviceShared {
                id,
                viewport: (viewport_width, viewport_height),
                live_textures: Cell::new(0),
                live_render_targets: Cell::new(0),
            }),
        }
    }

    pub fn id(&self) -> DeviceId {
        self.shared.id
    }

    /// Default surface size for render targets created without explicit bounds.
    pub fn viewport(&self) -> Rect {
        let (w, h) = self.shared.viewport;
        Rect::from_size(w, h)
    }

    pub fn live_textures(&self) -> usize {
        self.shared.live_textures.get()
    }

    pub fn live_render_targets(&self) -> usize {
        self.shared.live_render_targets.get()
    }

    /// Transparent texture.
    pub fn create_texture(&self, width: u32, height: u32) -> Result<Texture2D, RasterError> {
        Ok(self.texture_from_buffer(PixelBuffer::new(width, height)?))
    }

    /// Take ownership of a buffer as a new texture.
    pub fn texture_from_buffer(&self, buffer: PixelBuffer) -> Texture2D {
        Texture2D::new(self.guard(ResourceKind::Texture), buffer)
    }

    pub fn create_render_target(
        &self,
        width: u32,
        height: u32,
    ) -> Result<RenderTarget, RasterError> {
        let buffer = PixelBuffer::filled(width, height, Color::TRANSPARENT)?;
        let texture = Texture2D::new(self.guard(ResourceKind::RenderTarget), buffer);
        Ok(RenderTarget::new(texture))
    }

    fn guard(&self, kind: ResourceKind) -> ResourceGuard {
        let counter = match kind {
            ResourceKind::Texture => &self.shared.live_textures,
            ResourceKind::RenderTarget => &self.shared.live_render_targets,
        };
        counter.set(counter.get() + 1);
        ResourceGuard {
            device: Rc::clone(&self.shared),
            kind,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResourceKind {
    Texture,
    RenderTarget,
}

/// Ties a resource to its device's live count.
pub(crate) struct ResourceGuard {
    device: Rc<DeviceShared>,
    kind: ResourceKind,
}

impl ResourceGuard {
    pub(crate) fn device_id(&self) -> DeviceId {
        self.device.id
    }
}

impl Drop for ResourceGuard {
    fn drop(&mut self) {
        let counter = match self.kind {
            ResourceKind::Texture => &self.device.live_textures,
            ResourceKind::RenderTarget => &self.device.live_render_targets,
        };
        counter.set(counter.get().saturating_sub(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn devices_get_distinct_ids() {
        let a = GraphicsDevice::new(64, 64);
        let b = GraphicsDevice::new(64, 64);
        assert_ne!(a.id(), b.id());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn live_counts_follow_resource_lifetimes() {
        let device = GraphicsDevice::new(32, 32);
        let tex = device.create_texture(4, 4).expect("texture");
        let target = device.create_render_target(8, 8).expect("target");
        assert_eq!(device.live_textures(), 1);
        assert_eq!(device.live_render_targets(), 1);

        drop(tex);
        assert_eq!(device.live_textures(), 0);
        drop(target);
        assert_eq!(device.live_render_targets(), 0);
    }

    #[test]
    fn zero_sized_resources_are_rejected() {
        let device = GraphicsDevice::new(32, 32);
        assert!(device.create_texture(0, 4).is_err());
        assert!(device.create_render_target(4, 0).is_err());
        assert_eq!(device.live_textures(), 0);
        assert_eq!(device.live_render_targets(), 0);
    }

    #[test]
    fn viewport_is_fixed_at_creation() {
        let device = GraphicsDevice::new(320, 240);
        assert_eq!(device.viewport(), Rect::from_size(320, 240));
        assert_eq!(device.clone().viewport(), Rect::from_size(320, 240));
    }
}
