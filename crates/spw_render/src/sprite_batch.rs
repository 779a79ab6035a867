//! Begin/end-bracketed sprite batch rasterized on the CPU.
//!
//! Draw calls are buffered between `begin` and `end`. On `end` the commands
//! are ordered by the batch's sort mode and rasterized into the target with
//! nearest-neighbour sampling, tinting and straight-alpha source-over
//! blending. Sorting is stable, so equal depths keep call order.

use glam::Vec2;
use spw_core::{Color, Rect};

use crate::font::SpriteFont;
use crate::texture::{RenderTarget, Texture2D};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteSortMode {
    /// Draw in call order; layer depth is carried but not used for ordering.
    #[default]
    Deferred,
    /// Higher layer depth first.
    BackToFront,
    /// Lower layer depth first.
    FrontToBack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpriteEffects {
    #[default]
    None,
    FlipHorizontally,
    FlipVertically,
    FlipBoth,
}

impl SpriteEffects {
    fn flips(self) -> (bool, bool) {
        match self {
            Self::None => (false, false),
            Self::FlipHorizontally => (true, false),
            Self::FlipVertically => (false, true),
            Self::FlipBoth => (true, true),
        }
    }
}

/// Parameters of one textured-quad draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    pub position: Vec2,
    /// Sub-rectangle of the texture; `None` draws the whole texture.
    pub source: Option<Rect>,
    pub tint: Color,
    /// Radians, clockwise in screen space (y down).
    pub rotation: f32,
    /// Pivot in source-pixel units; placed at `position`.
    pub origin: Vec2,
    pub scale: Vec2,
    pub effects: SpriteEffects,
    pub layer_depth: f32,
}

impl Default for DrawParams {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            source: None,
            tint: Color::WHITE,
            rotation: 0.0,
            origin: Vec2::ZERO,
            scale: Vec2::ONE,
            effects: SpriteEffects::None,
            layer_depth: 0.0,
        }
    }
}

impl DrawParams {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_tint(mut self, tint: Color) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_source(mut self, source: Rect) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_origin(mut self, origin: Vec2) -> Self {
        self.origin = origin;
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

    pub fn with_layer_depth(mut self, layer_depth: f32) -> Self {
        self.layer_depth = layer_depth;
        self
    }

    pub fn with_effects(mut self, effects: SpriteEffects) -> Self {
        self.effects = effects;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BatchStats {
    pub draw_calls: u32,
    pub pixels_written: u64,
}

struct DrawCommand<'a> {
    texture: &'a Texture2D,
    params: DrawParams,
}

pub struct SpriteBatch<'a> {
    target: &'a mut RenderTarget,
    sort_mode: SpriteSortMode,
    commands: Vec<DrawCommand<'a>>,
}

impl<'a> SpriteBatch<'a> {
    /// Start accumulating draws aimed at `target`.
    pub fn begin(target: &'a mut RenderTarget, sort_mode: SpriteSortMode) -> Self {
        Self {
            target,
            sort_mode,
            commands: Vec::new(),
        }
    }

    pub fn target_size(&self) -> (u32, u32) {
        (self.target.width(), self.target.height())
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn draw(&mut self, texture: &'a Texture2D, params: DrawParams) {
        if texture.device_id() != self.target.device_id() {
            log::warn!(
                "Drawing a {} texture into a {} target",
                texture.device_id(),
                self.target.device_id()
            );
        }
        self.commands.push(DrawCommand { texture, params });
    }

    /// Queue one glyph draw per character. `\n` starts a new line.
    pub fn draw_string(
        &mut self,
        font: &'a SpriteFont,
        text: &str,
        position: Vec2,
        color: Color,
        scale: Vec2,
        layer_depth: f32,
    ) {
        let (advance, line_height) = font.cell_advance();
        let mut pen = Vec2::ZERO;
        for ch in text.chars() {
            if ch == '\n' {
                pen.x = 0.0;
                pen.y += line_height as f32;
                continue;
            }
            if let Some(glyph) = font.glyph_rect(ch) {
                self.draw(
                    font.texture(),
                    DrawParams::at(position + pen * scale)
                        .with_source(glyph)
                        .with_tint(color)
                        .with_scale(scale)
                        .with_layer_depth(layer_depth),
                );
            }
            pen.x += advance as f32;
        }
    }

    /// Sort, rasterize and release the target.
    pub fn end(mut self) -> BatchStats {
        match self.sort_mode {
            SpriteSortMode::Deferred => {}
            SpriteSortMode::BackToFront => self
                .commands
                .sort_by(|a, b| b.params.layer_depth.total_cmp(&a.params.layer_depth)),
            SpriteSortMode::FrontToBack => self
                .commands
                .sort_by(|a, b| a.params.layer_depth.total_cmp(&b.params.layer_depth)),
        }

        let mut stats = BatchStats::default();
        for command in &self.commands {
            stats.draw_calls += 1;
            stats.pixels_written += rasterize(self.target, command.texture, &command.params);
        }
        stats
    }
}

/// Inverse-map every destination pixel in the quad's bounding box back into
/// source space and blend the sampled texel.
fn rasterize(target: &mut RenderTarget, texture: &Texture2D, params: &DrawParams) -> u64 {
    let Some(source) = params
        .source
        .unwrap_or_else(|| texture.bounds())
        .intersect(&texture.bounds())
    else {
        return 0;
    };
    if params.scale.x == 0.0 || params.scale.y == 0.0 {
        return 0;
    }

    let (sin, cos) = params.rotation.sin_cos();
    let to_dest = |p: Vec2| {
        let local = (p - params.origin) * params.scale;
        params.position + Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
    };
    let (sw, sh) = (source.width as f32, source.height as f32);
    let corners = [
        to_dest(Vec2::ZERO),
        to_dest(Vec2::new(sw, 0.0)),
        to_dest(Vec2::new(sw, sh)),
        to_dest(Vec2::new(0.0, sh)),
    ];
    let surface = target.surface_mut();
    let Some(area) = Rect::bounding(&corners).intersect(&surface.bounds()) else {
        return 0;
    };

    let (flip_x, flip_y) = params.effects.flips();
    let src = texture.buffer();
    let mut written = 0u64;
    for dy in area.y..area.bottom() {
        for dx in area.x..area.right() {
            let d = Vec2::new(dx as f32 + 0.5, dy as f32 + 0.5) - params.position;
            let unrotated = Vec2::new(d.x * cos + d.y * sin, -d.x * sin + d.y * cos);
            let local = unrotated / params.scale + params.origin;
            if local.x < 0.0 || local.y < 0.0 || local.x >= sw || local.y >= sh {
                continue;
            }
            let mut sx = local.x as u32;
            let mut sy = local.y as u32;
            if flip_x {
                sx = source.width - 1 - sx;
            }
            if flip_y {
                sy = source.height - 1 - sy;
            }
            let Some(texel) = src.get(source.x as u32 + sx, source.y as u32 + sy) else {
                continue;
            };
            let color = texel.modulate(params.tint);
            if color.a == 0 {
                continue;
            }
            let i = surface.index(dx as u32, dy as u32);
            let pixels = surface.pixels_mut();
            pixels[i] = color.blend_over(pixels[i]);
            written += 1;
        }
    }
    written
}
