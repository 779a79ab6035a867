use std::ops::{Index, IndexMut};

use spw_core::{Color, GameTime};
use spw_render::{GraphicsDevice, RenderTarget, SpriteBatch, SpriteSortMode};

use crate::error::ScreenError;
use crate::screen::Screen;

/// Counters for one `ScreenManager::draw` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub screens_rendered: u32,
    pub screens_composited: u32,
    /// Draw calls made inside screens, not counting the composite.
    pub sprite_draws: u32,
    pub pixels_written: u64,
}

/// Ordered screens composited onto a back buffer. Insertion order is
/// composite order.
#[derive(Debug)]
pub struct ScreenManager {
    screens: Vec<Screen>,
    device: GraphicsDevice,
    pub background_color: Color,
}

impl ScreenManager {
    pub fn new(device: GraphicsDevice) -> Self {
        Self {
            screens: Vec::new(),
            device,
            background_color: Color::CORNFLOWER_BLUE,
        }
    }

    pub fn device(&self) -> &GraphicsDevice {
        &self.device
    }

    /// Append a screen. Names are not required to be unique, but lookups by a
    /// shared name fail.
    pub fn add(&mut self, screen: Screen) -> Result<usize, ScreenError> {
        if screen.device() != &self.device {
            return Err(ScreenError::DeviceMismatch {
                expected: self.device.id(),
                found: screen.device().id(),
            });
        }
        if self.screens.iter().any(|s| s.name() == screen.name()) {
            log::warn!(
                "Screen name '{}' is already in use; lookups by this name will be ambiguous",
                screen.name()
            );
        }
        self.screens.push(screen);
        Ok(self.screens.len() - 1)
    }

    fn position(&self, name: &str) -> Result<usize, ScreenError> {
        let mut matches = self
            .screens
            .iter()
            .enumerate()
            .filter(|(_, s)| s.name() == name)
            .map(|(i, _)| i);
        let Some(first) = matches.next() else {
            return Err(ScreenError::NotFound(name.to_string()));
        };
        let extra = matches.count();
        if extra > 0 {
            return Err(ScreenError::Ambiguous {
                name: name.to_string(),
                count: extra + 1,
            });
        }
        Ok(first)
    }

    pub fn get(&self, name: &str) -> Result<&Screen, ScreenError> {
        let index = self.position(name)?;
        Ok(&self.screens[index])
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Screen, ScreenError> {
        let index = self.position(name)?;
        Ok(&mut self.screens[index])
    }

    pub fn remove(&mut self, name: &str) -> Result<Screen, ScreenError> {
        let index = self.position(name)?;
        Ok(self.screens.remove(index))
    }

    pub fn screen(&self, index: usize) -> Option<&Screen> {
        self.screens.get(index)
    }

    pub fn screen_mut(&mut self, index: usize) -> Option<&mut Screen> {
        self.screens.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.screens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.screens.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Screen> {
        self.screens.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Screen> {
        self.screens.iter_mut()
    }

    /// Drop every screen, releasing their targets.
    pub fn clear(&mut self) {
        self.screens.clear();
    }

    /// Update the sprites of every visible screen.
    pub fn update(&mut self, time: &GameTime) {
        for screen in self.screens.iter_mut().filter(|s| s.visible) {
            screen.update(time);
        }
    }

    /// Render every visible screen into its own target, then composite those
    /// targets onto `back_buffer` in list order.
    pub fn draw(&mut self, back_buffer: &mut RenderTarget) -> FrameStats {
        let mut stats = FrameStats::default();
        for screen in &mut self.screens {
            if let Some(pass) = screen.render() {
                stats.screens_rendered += 1;
                stats.sprite_draws += pass.draw_calls;
                stats.pixels_written += pass.pixels_written;
            }
        }

        back_buffer.clear(self.background_color);
        let mut batch = SpriteBatch::begin(back_buffer, SpriteSortMode::Deferred);
        for screen in self.screens.iter().filter(|s| s.visible) {
            batch.draw(screen.target().as_texture(), screen.composite_params());
            stats.screens_composited += 1;
        }
        stats.pixels_written += batch.end().pixels_written;

        log::trace!(
            "Composited {} of {} screens",
            stats.screens_composited,
            self.screens.len()
        );
        stats
    }
}

impl Index<usize> for ScreenManager {
    type Output = Screen;

    fn index(&self, index: usize) -> &Screen {
        &self.screens[index]
    }
}

impl IndexMut<usize> for ScreenManager {
    fn index_mut(&mut self, index: usize) -> &mut Screen {
        &mut self.screens[index]
    }
}
