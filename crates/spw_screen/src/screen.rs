//! A named layer rendered into its own off-screen target.
//!
//! Per frame a visible screen clears its target, draws its background sprite,
//! its managed sprites and then its additional drawables into one batch, and
//! finally hands the target to the post-process hook. The manager then
//! composites the target onto the back buffer.

use std::fmt;

use glam::Vec2;
use spw_core::{Color, GameTime, Rect};
use spw_render::{
    BatchStats, DrawParams, GraphicsDevice, RenderTarget, SpriteBatch, SpriteSortMode,
};

use crate::collection::SpriteCollection;
use crate::error::ScreenError;
use crate::sprite::{Drawable, Sprite};

/// Runs after a screen's batch has ended, with its render target still bound.
pub trait PostProcess {
    fn process(&mut self, target: &mut RenderTarget);
}

impl<F: FnMut(&mut RenderTarget)> PostProcess for F {
    fn process(&mut self, target: &mut RenderTarget) {
        self(target)
    }
}

pub struct Screen {
    // Fields drop top to bottom: drawables, sprites, target, then the device.
    additional: Vec<Box<dyn Drawable>>,
    sprites: SpriteCollection,
    background: Option<Sprite>,
    post_process: Option<Box<dyn PostProcess>>,
    target: RenderTarget,
    device: GraphicsDevice,
    name: String,
    pub position: Vec2,
    pub tint: Color,
    pub layer_depth: f32,
    pub visible: bool,
    /// Composite with the target's centre at `position`.
    pub center_origin: bool,
    pub clear_color: Color,
    pub sort_mode: SpriteSortMode,
}

impl fmt::Debug for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Screen")
            .field("name", &self.name)
            .field("size", &self.size())
            .field("position", &self.position)
            .field("visible", &self.visible)
            .field("sprites", &self.sprites.len())
            .field("additional", &self.additional.len())
            .finish()
    }
}

impl Screen {
    /// Screen covering the device viewport.
    pub fn new(device: &GraphicsDevice, name: impl Into<String>) -> Result<Self, ScreenError> {
        Self::with_bounds(device, name, device.viewport())
    }

    /// Screen with a target of `bounds` size, positioned at its corner.
    pub fn with_bounds(
        device: &GraphicsDevice,
        name: impl Into<String>,
        bounds: Rect,
    ) -> Result<Self, ScreenError> {
        let name = name.into();
        let target = device.create_render_target(bounds.width, bounds.height)?;
        log::debug!(
            "Screen '{}' created with {}x{} target",
            name,
            bounds.width,
            bounds.height
        );
        Ok(Self {
            additional: Vec::new(),
            sprites: SpriteCollection::new(),
            background: None,
            post_process: None,
            target,
            device: device.clone(),
            name,
            position: Vec2::new(bounds.x as f32, bounds.y as f32),
            tint: Color::WHITE,
            layer_depth: 0.0,
            visible: true,
            center_origin: false,
            clear_color: Color::TRANSPARENT,
            sort_mode: SpriteSortMode::Deferred,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn device(&self) -> &GraphicsDevice {
        &self.device
    }

    pub fn size(&self) -> (u32, u32) {
        (self.target.width(), self.target.height())
    }

    pub fn target(&self) -> &RenderTarget {
        &self.target
    }

    pub fn sprites(&self) -> &SpriteCollection {
        &self.sprites
    }

    pub fn sprites_mut(&mut self) -> &mut SpriteCollection {
        &mut self.sprites
    }

    pub fn background(&self) -> Option<&Sprite> {
        self.background.as_ref()
    }

    /// Replace the background sprite, returning the previous one.
    pub fn set_background(&mut self, background: Option<Sprite>) -> Option<Sprite> {
        std::mem::replace(&mut self.background, background)
    }

    /// Drawn after the managed sprites, in the order added.
    pub fn add_drawable(&mut self, drawable: Box<dyn Drawable>) {
        self.additional.push(drawable);
    }

    pub fn additional_count(&self) -> usize {
        self.additional.len()
    }

    pub fn set_post_process(&mut self, hook: impl PostProcess + 'static) {
        self.post_process = Some(Box::new(hook));
    }

    pub fn clear_post_process(&mut self) {
        self.post_process = None;
    }

    pub fn update(&mut self, time: &GameTime) {
        if let Some(background) = &mut self.background {
            background.update(time);
        }
        self.sprites.update(time);
        for drawable in &mut self.additional {
            drawable.update(time);
        }
    }

    /// Draw into the screen's own target. Invisible screens are skipped and
    /// return `None`.
    pub fn render(&mut self) -> Option<BatchStats> {
        if !self.visible {
            return None;
        }
        self.target.clear(self.clear_color);
        let mut batch = SpriteBatch::begin(&mut self.target, self.sort_mode);
        if let Some(background) = &self.background {
            background.draw(&mut batch);
        }
        self.sprites.draw(&mut batch);
        for drawable in &self.additional {
            drawable.draw(&mut batch);
        }
        let stats = batch.end();
        if let Some(hook) = &mut self.post_process {
            hook.process(&mut self.target);
        }
        log::trace!(
            "Screen '{}' rendered {} draws, {} pixels",
            self.name,
            stats.draw_calls,
            stats.pixels_written
        );
        Some(stats)
    }

    pub fn origin(&self) -> Vec2 {
        if self.center_origin {
            let (w, h) = self.size();
            Vec2::new(w as f32 / 2.0, h as f32 / 2.0)
        } else {
            Vec2::ZERO
        }
    }

    /// How the manager places this screen on the back buffer.
    pub fn composite_params(&self) -> DrawParams {
        DrawParams::at(self.position)
            .with_tint(self.tint)
            .with_origin(self.origin())
            .with_layer_depth(self.layer_depth)
    }

    /// Back-buffer area this screen covers when composited.
    pub fn bounds(&self) -> Rect {
        let (w, h) = self.size();
        let corner = (self.position - self.origin()).floor();
        Rect::new(corner.x as i32, corner.y as i32, w, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    use spw_core::PixelBuffer;

    fn solid_sprite(device: &GraphicsDevice, w: u32, h: u32, color: Color) -> Sprite {
        let tex = device.texture_from_buffer(PixelBuffer::filled(w, h, color).expect("buffer"));
        Sprite::texture(Rc::new(tex))
    }

    struct Probe {
        device: GraphicsDevice,
        log: Rc<RefCell<Vec<String>>>,
    }

    impl Drawable for Probe {
        fn update(&mut self, _time: &GameTime) {
            self.log.borrow_mut().push("update".to_string());
        }

        fn draw<'a>(&'a self, _batch: &mut SpriteBatch<'a>) {
            self.log.borrow_mut().push("draw".to_string());
        }

        fn bounds(&self) -> Rect {
            Rect::default()
        }
    }

    impl Drop for Probe {
        fn drop(&mut self) {
            self.log.borrow_mut().push(format!(
                "drop textures={} targets={}",
                self.device.live_textures(),
                self.device.live_render_targets()
            ));
        }
    }

    #[test]
    fn render_draws_background_then_sprites_then_drawables() {
        let device = GraphicsDevice::new(4, 4);
        let mut screen = Screen::new(&device, "main").expect("screen");
        screen.set_background(Some(solid_sprite(&device, 4, 4, Color::BLUE)));
        screen
            .sprites_mut()
            .add(solid_sprite(&device, 2, 2, Color::RED).at(Vec2::new(1.0, 1.0)));
        let log = Rc::new(RefCell::new(Vec::new()));
        screen.add_drawable(Box::new(Probe {
            device: device.clone(),
            log: Rc::clone(&log),
        }));

        let stats = screen.render().expect("visible screen renders");
        assert_eq!(stats.draw_calls, 2);
        let surface = screen.target().surface();
        assert_eq!(surface.get(0, 0), Some(Color::BLUE));
        assert_eq!(surface.get(1, 1), Some(Color::RED));
        assert_eq!(log.borrow().as_slice(), ["draw"]);
    }

    #[test]
    fn invisible_screen_is_not_rendered() {
        let device = GraphicsDevice::new(4, 4);
        let mut screen = Screen::new(&device, "hidden").expect("screen");
        screen.clear_color = Color::RED;
        screen.visible = false;
        assert!(screen.render().is_none());
        assert_eq!(screen.target().surface().get(0, 0), Some(Color::TRANSPARENT));

        screen.visible = true;
        assert!(screen.render().is_some());
        assert_eq!(screen.target().surface().get(0, 0), Some(Color::RED));
    }

    #[test]
    fn post_process_sees_finished_target() {
        let device = GraphicsDevice::new(2, 2);
        let mut screen = Screen::new(&device, "pp").expect("screen");
        screen
            .sprites_mut()
            .add(solid_sprite(&device, 2, 2, Color::GREEN));
        let seen = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&seen);
        screen.set_post_process(move |target: &mut RenderTarget| {
            *sink.borrow_mut() = target.surface().get(1, 1);
            target.surface_mut().set(0, 0, Color::BLACK);
        });
        screen.render();
        assert_eq!(*seen.borrow(), Some(Color::GREEN));
        assert_eq!(screen.target().surface().get(0, 0), Some(Color::BLACK));
    }

    #[test]
    fn update_reaches_drawables() {
        let device = GraphicsDevice::new(2, 2);
        let mut screen = Screen::new(&device, "u").expect("screen");
        let log = Rc::new(RefCell::new(Vec::new()));
        screen.add_drawable(Box::new(Probe {
            device: device.clone(),
            log: Rc::clone(&log),
        }));
        screen.update(&GameTime::default());
        assert_eq!(log.borrow().as_slice(), ["update"]);
    }

    #[test]
    fn drop_releases_drawables_before_target() {
        let device = GraphicsDevice::new(4, 4);
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let mut screen = Screen::new(&device, "owned").expect("screen");
            screen
                .sprites_mut()
                .add(solid_sprite(&device, 1, 1, Color::RED));
            screen.add_drawable(Box::new(Probe {
                device: device.clone(),
                log: Rc::clone(&log),
            }));
            assert_eq!(device.live_textures(), 1);
            assert_eq!(device.live_render_targets(), 1);
        }
        assert_eq!(log.borrow().as_slice(), ["drop textures=1 targets=1"]);
        assert_eq!(device.live_textures(), 0);
        assert_eq!(device.live_render_targets(), 0);
    }

    #[test]
    fn bounded_screen_uses_rect_and_center_origin() {
        let device = GraphicsDevice::new(64, 64);
        let mut screen =
            Screen::with_bounds(&device, "hud", Rect::new(10, 20, 8, 6)).expect("screen");
        assert_eq!(screen.size(), (8, 6));
        assert_eq!(screen.bounds(), Rect::new(10, 20, 8, 6));
        screen.center_origin = true;
        assert_eq!(screen.origin(), Vec2::new(4.0, 3.0));
        assert_eq!(screen.bounds(), Rect::new(6, 17, 8, 6));
        assert!(Screen::with_bounds(&device, "bad", Rect::new(0, 0, 0, 4)).is_err());
    }
}
