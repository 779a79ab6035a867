//! Sprites and the `Drawable` capability.
//!
//! There is one `Sprite` type. What it shows is a `SpriteKind` variant: a
//! plain texture, an animated sheet, or a line of text. Textures and fonts
//! are shared through `Rc`; a sprite never owns their lifetime alone.

use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use glam::Vec2;
use spw_core::animation::{AnimationClip, AnimationState, SheetDefinition};
use spw_core::{Color, GameTime, Rect};
use spw_render::{DrawParams, SpriteBatch, SpriteEffects, SpriteFont, Texture2D};

/// Anything a screen can update once per tick and draw into its batch.
pub trait Drawable {
    fn update(&mut self, time: &GameTime);
    fn draw<'a>(&'a self, batch: &mut SpriteBatch<'a>);
    /// Axis-aligned screen-space bounds.
    fn bounds(&self) -> Rect;
}

/// Consulted by `Sprite::try_move_to` with `(from, to)`; `false` vetoes.
pub type MoveFilter = Box<dyn Fn(Vec2, Vec2) -> bool>;

/// A texture split into a grid of equal frames, played through named clips.
#[derive(Debug, Clone)]
pub struct SpriteSheet {
    texture: Rc<Texture2D>,
    frame_width: u32,
    frame_height: u32,
    columns: u32,
    frame_count: usize,
    clips: HashMap<String, AnimationClip>,
    playing: Option<String>,
    state: AnimationState,
    frame: usize,
}

impl SpriteSheet {
    /// `None` if the frame size is zero or larger than the texture.
    pub fn new(texture: Rc<Texture2D>, frame_width: u32, frame_height: u32) -> Option<Self> {
        if frame_width == 0
            || frame_height == 0
            || frame_width > texture.width()
            || frame_height > texture.height()
        {
            return None;
        }
        let columns = texture.width() / frame_width;
        let rows = texture.height() / frame_height;
        Some(Self {
            texture,
            frame_width,
            frame_height,
            columns,
            frame_count: (columns * rows) as usize,
            clips: HashMap::new(),
            playing: None,
            state: AnimationState::new(),
            frame: 0,
        })
    }

    pub fn from_definition(
        texture: Rc<Texture2D>,
        definition: &SheetDefinition,
    ) -> Result<Self, String> {
        let mut sheet = Self::new(texture, definition.frame_width, definition.frame_height)
            .ok_or_else(|| {
                format!(
                    "Sheet '{}': {}x{} frames do not fit the texture",
                    definition.sheet_id, definition.frame_width, definition.frame_height
                )
            })?;
        for (name, clip) in &definition.clips {
            if let Some(frame) = clip.frames.iter().find(|f| f.index >= sheet.frame_count) {
                return Err(format!(
                    "Sheet '{}': clip '{}' references frame {} but the sheet has {}",
                    definition.sheet_id, name, frame.index, sheet.frame_count
                ));
            }
            sheet.add_clip(name.clone(), clip.clone());
        }
        Ok(sheet)
    }

    pub fn texture(&self) -> &Texture2D {
        &self.texture
    }

    pub fn frame_size(&self) -> (u32, u32) {
        (self.frame_width, self.frame_height)
    }

    pub fn frame_count(&self) -> usize {
        self.frame_count
    }

    pub fn add_clip(&mut self, name: impl Into<String>, clip: AnimationClip) {
        self.clips.insert(name.into(), clip);
    }

    /// Restart playback with the named clip. Unknown names are ignored.
    pub fn play(&mut self, name: &str) -> bool {
        let Some(clip) = self.clips.get(name) else {
            log::warn!("Sprite sheet has no clip named '{name}'");
            return false;
        };
        self.state.reset();
        self.frame = self.state.current_index(clip);
        self.playing = Some(name.to_string());
        true
    }

    pub fn playing(&self) -> Option<&str> {
        self.playing.as_deref()
    }

    pub fn is_finished(&self) -> bool {
        self.state.finished
    }

    /// Stop any clip and hold `index`.
    pub fn set_frame(&mut self, index: usize) {
        self.playing = None;
        self.frame = index.min(self.frame_count.saturating_sub(1));
    }

    pub fn frame(&self) -> usize {
        self.frame
    }

    pub fn frame_rect(&self, index: usize) -> Option<Rect> {
        if index >= self.frame_count {
            return None;
        }
        let index = index as u32;
        Some(Rect::new(
            ((index % self.columns) * self.frame_width) as i32,
            ((index / self.columns) * self.frame_height) as i32,
            self.frame_width,
            self.frame_height,
        ))
    }

    pub fn advance(&mut self, dt_us: u64) {
        let Some(clip) = self.playing.as_ref().and_then(|name| self.clips.get(name)) else {
            return;
        };
        self.frame = self.state.tick(dt_us, clip);
    }
}

/// Text drawn with a monospace sprite font. Rotation is not applied to text.
#[derive(Debug, Clone)]
pub struct TextSprite {
    font: Rc<SpriteFont>,
    pub text: String,
}

impl TextSprite {
    pub fn new(font: Rc<SpriteFont>, text: impl Into<String>) -> Self {
        Self {
            font,
            text: text.into(),
        }
    }

    pub fn font(&self) -> &SpriteFont {
        &self.font
    }
}

#[derive(Debug, Clone)]
pub enum SpriteKind {
    Texture(Rc<Texture2D>),
    Sheet(SpriteSheet),
    Text(TextSprite),
}

pub struct Sprite {
    kind: SpriteKind,
    pub position: Vec2,
    pub scale: Vec2,
    /// Radians.
    pub rotation: f32,
    /// Pivot in unscaled source pixels.
    pub origin: Vec2,
    pub tint: Color,
    pub layer_depth: f32,
    pub effects: SpriteEffects,
    pub visible: bool,
    move_filter: Option<MoveFilter>,
}

impl fmt::Debug for Sprite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Sprite")
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("scale", &self.scale)
            .field("visible", &self.visible)
            .field("move_filter", &self.move_filter.is_some())
            .finish()
    }
}

impl Sprite {
    pub fn new(kind: SpriteKind) -> Self {
        Self {
            kind,
            position: Vec2::ZERO,
            scale: Vec2::ONE,
            rotation: 0.0,
            origin: Vec2::ZERO,
            tint: Color::WHITE,
            layer_depth: 0.0,
            effects: SpriteEffects::None,
            visible: true,
            move_filter: None,
        }
    }

    pub fn texture(texture: Rc<Texture2D>) -> Self {
        Self::new(SpriteKind::Texture(texture))
    }

    pub fn sheet(sheet: SpriteSheet) -> Self {
        Self::new(SpriteKind::Sheet(sheet))
    }

    pub fn text(font: Rc<SpriteFont>, text: impl Into<String>) -> Self {
        Self::new(SpriteKind::Text(TextSprite::new(font, text)))
    }

    /// Background sprite scaled so `texture` covers exactly `width x height`.
    pub fn stretched(texture: Rc<Texture2D>, width: u32, height: u32) -> Self {
        let scale = Vec2::new(
            width as f32 / texture.width() as f32,
            height as f32 / texture.height() as f32,
        );
        Self::texture(texture).with_scale(scale)
    }

    pub fn at(mut self, position: Vec2) -> Self {
        self.position = position;
        self
    }

    pub fn with_scale(mut self, scale: Vec2) -> Self {
        self.scale = scale;
        self
    }

    pub fn with_rotation(mut self, rotation: f32) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
        self
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_layer_depth(mut self, layer_depth: f32) -> Self {
        self.layer_depth = layer_depth;
        self
    }

    pub fn kind(&self) -> &SpriteKind {
        &self.kind
    }

    pub fn kind_mut(&mut self) -> &mut SpriteKind {
        &mut self.kind
    }

    /// Unscaled size of what the sprite shows.
    pub fn size(&self) -> Vec2 {
        match &self.kind {
            SpriteKind::Texture(texture) => {
                Vec2::new(texture.width() as f32, texture.height() as f32)
            }
            SpriteKind::Sheet(sheet) => {
                let (w, h) = sheet.frame_size();
                Vec2::new(w as f32, h as f32)
            }
            SpriteKind::Text(text) => text.font.measure(&text.text),
        }
    }

    pub fn set_move_filter(&mut self, filter: impl Fn(Vec2, Vec2) -> bool + 'static) {
        self.move_filter = Some(Box::new(filter));
    }

    pub fn clear_move_filter(&mut self) {
        self.move_filter = None;
    }

    /// Move to `to` unless the move filter rejects it. Returns whether the
    /// sprite moved.
    pub fn try_move_to(&mut self, to: Vec2) -> bool {
        if let Some(filter) = &self.move_filter {
            if !filter(self.position, to) {
                return false;
            }
        }
        self.position = to;
        true
    }

    fn params(&self) -> DrawParams {
        DrawParams::at(self.position)
            .with_tint(self.tint)
            .with_origin(self.origin)
            .with_scale(self.scale)
            .with_rotation(self.rotation)
            .with_layer_depth(self.layer_depth)
            .with_effects(self.effects)
    }
}

impl Drawable for Sprite {
    fn update(&mut self, time: &GameTime) {
        if let SpriteKind::Sheet(sheet) = &mut self.kind {
            sheet.advance(time.elapsed_us());
        }
    }

    fn draw<'a>(&'a self, batch: &mut SpriteBatch<'a>) {
        if !self.visible {
            return;
        }
        match &self.kind {
            SpriteKind::Texture(texture) => batch.draw(texture, self.params()),
            SpriteKind::Sheet(sheet) => {
                if let Some(rect) = sheet.frame_rect(sheet.frame()) {
                    batch.draw(sheet.texture(), self.params().with_source(rect));
                }
            }
            SpriteKind::Text(text) => batch.draw_string(
                text.font(),
                &text.text,
                self.position - self.origin * self.scale,
                self.tint,
                self.scale,
                self.layer_depth,
            ),
        }
    }

    fn bounds(&self) -> Rect {
        let size = self.size();
        let (sin, cos) = self.rotation.sin_cos();
        let corners = [
            Vec2::ZERO,
            Vec2::new(size.x, 0.0),
            size,
            Vec2::new(0.0, size.y),
        ]
        .map(|corner| {
            let local = (corner - self.origin) * self.scale;
            self.position + Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
        });
        Rect::bounding(&corners)
    }
}
