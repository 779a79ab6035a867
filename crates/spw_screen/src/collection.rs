use spw_core::{GameTime, Rect};
use spw_render::SpriteBatch;

use crate::sprite::{Drawable, Sprite};

/// Ordered sprites owned by one screen. Draw order is insertion order.
#[derive(Debug, Default)]
pub struct SpriteCollection {
    sprites: Vec<Sprite>,
}

impl SpriteCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append and return the sprite's index.
    pub fn add(&mut self, sprite: Sprite) -> usize {
        self.sprites.push(sprite);
        self.sprites.len() - 1
    }

    pub fn remove(&mut self, index: usize) -> Option<Sprite> {
        (index < self.sprites.len()).then(|| self.sprites.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Sprite> {
        self.sprites.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Sprite> {
        self.sprites.get_mut(index)
    }

    pub fn len(&self) -> usize {
        self.sprites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sprites.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sprite> {
        self.sprites.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Sprite> {
        self.sprites.iter_mut()
    }

    pub fn clear(&mut self) {
        self.sprites.clear();
    }

    /// Indices of visible sprites whose bounds contain `(x, y)`, topmost first.
    pub fn hit_test(&self, x: i32, y: i32) -> Vec<usize> {
        self.sprites
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, s)| s.visible && s.bounds().contains(x, y))
            .map(|(i, _)| i)
            .collect()
    }
}

impl Drawable for SpriteCollection {
    fn update(&mut self, time: &GameTime) {
        for sprite in &mut self.sprites {
            sprite.update(time);
        }
    }

    fn draw<'a>(&'a self, batch: &mut SpriteBatch<'a>) {
        for sprite in &self.sprites {
            sprite.draw(batch);
        }
    }

    /// Union of visible sprite bounds; empty at the origin when nothing shows.
    fn bounds(&self) -> Rect {
        let mut corners = Vec::new();
        for sprite in self.sprites.iter().filter(|s| s.visible) {
            let b = sprite.bounds();
            corners.push(glam::Vec2::new(b.x as f32, b.y as f32));
            corners.push(glam::Vec2::new(b.right() as f32, b.bottom() as f32));
        }
        if corners.is_empty() {
            return Rect::default();
        }
        Rect::bounding(&corners)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use std::rc::Rc;

    use spw_core::{Color, PixelBuffer};
    use spw_render::GraphicsDevice;

    fn square(device: &GraphicsDevice, at: Vec2) -> Sprite {
        let tex = device.texture_from_buffer(PixelBuffer::filled(4, 4, Color::RED).expect("buffer"));
        Sprite::texture(Rc::new(tex)).at(at)
    }

    #[test]
    fn add_remove_keeps_order() {
        let device = GraphicsDevice::new(4, 4);
        let mut sprites = SpriteCollection::new();
        assert_eq!(sprites.add(square(&device, Vec2::ZERO)), 0);
        assert_eq!(sprites.add(square(&device, Vec2::new(10.0, 0.0))), 1);
        assert_eq!(sprites.add(square(&device, Vec2::new(20.0, 0.0))), 2);

        let removed = sprites.remove(1).expect("sprite");
        assert_eq!(removed.position, Vec2::new(10.0, 0.0));
        assert!(sprites.remove(5).is_none());
        assert_eq!(sprites.get(1).map(|s| s.position), Some(Vec2::new(20.0, 0.0)));
    }

    #[test]
    fn hit_test_returns_topmost_first() {
        let device = GraphicsDevice::new(4, 4);
        let mut sprites = SpriteCollection::new();
        sprites.add(square(&device, Vec2::ZERO));
        sprites.add(square(&device, Vec2::new(2.0, 2.0)));
        assert_eq!(sprites.hit_test(3, 3), vec![1, 0]);
        assert_eq!(sprites.hit_test(0, 0), vec![0]);
        sprites.get_mut(1).expect("sprite").visible = false;
        assert_eq!(sprites.hit_test(3, 3), vec![0]);
    }

    #[test]
    fn bounds_cover_visible_sprites() {
        let device = GraphicsDevice::new(4, 4);
        let mut sprites = SpriteCollection::new();
        assert_eq!(sprites.bounds(), Rect::default());
        sprites.add(square(&device, Vec2::new(1.0, 2.0)));
        sprites.add(square(&device, Vec2::new(10.0, 5.0)));
        assert_eq!(sprites.bounds(), Rect::new(1, 2, 13, 7));
    }
}
