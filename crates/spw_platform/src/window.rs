use std::sync::Arc;
use winit::error::OsError;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    /// Resolution the screens composite into before it is scaled to the window.
    pub back_buffer_width: u32,
    pub back_buffer_height: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Sprite Workshop".to_string(),
            width: 1280,
            height: 720,
            back_buffer_width: 320,
            back_buffer_height: 180,
        }
    }
}

impl PlatformConfig {
    pub fn back_buffer_size(&self) -> (u32, u32) {
        (self.back_buffer_width, self.back_buffer_height)
    }
}

pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, OsError> {
    let attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
        .with_min_inner_size(winit::dpi::LogicalSize::new(
            config.back_buffer_width,
            config.back_buffer_height,
        ));

    let window = event_loop.create_window(attrs)?;
    log::info!(
        "Window '{}' created at {}x{}",
        config.title,
        config.width,
        config.height
    );
    Ok(Arc::new(window))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_back_buffer_scales_evenly_into_window() {
        let config = PlatformConfig::default();
        let (bw, bh) = config.back_buffer_size();
        assert_eq!(config.width % bw, 0);
        assert_eq!(config.height % bh, 0);
        assert_eq!(config.width / bw, config.height / bh);
    }
}
