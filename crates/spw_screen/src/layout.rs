//! JSON screen layouts: which screens exist, where they sit and which
//! generated or loaded textures their sprites show.

use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::SystemTime;

use glam::Vec2;
use spw_core::animation::{
    frame_duration_us, load_sheet_file, AnimationClip, MAX_FRAME_DURATION_MS,
};
use spw_core::{Color, PixelBuffer, Rect};
use spw_render::{GraphicsDevice, SpriteFont, Texture2D};
use spw_texgen::TextureFactory;

use crate::manager::ScreenManager;
use crate::screen::Screen;
use crate::sprite::{Sprite, SpriteKind, SpriteSheet, TextSprite};

/// Clip name given to the sheet built by a `fade` recipe.
pub const FADE_CLIP: &str = "fade";

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutFile {
    pub version: String,
    #[serde(default = "default_background")]
    pub background: String,
    pub screens: Vec<LayoutScreen>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutScreen {
    pub name: String,
    /// Defaults to the device viewport.
    #[serde(default)]
    pub rect: Option<LayoutRect>,
    #[serde(default = "default_tint")]
    pub tint: String,
    #[serde(default)]
    pub layer_depth: f32,
    #[serde(default = "default_visible")]
    pub visible: bool,
    #[serde(default)]
    pub center_origin: bool,
    #[serde(default = "default_clear")]
    pub clear: String,
    /// Stretched over the whole screen.
    #[serde(default)]
    pub background: Option<TextureRecipe>,
    #[serde(default)]
    pub sprites: Vec<LayoutSprite>,
}

#[derive(Debug, Deserialize, Clone, Copy)]
pub struct LayoutRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LayoutSprite {
    pub id: String,
    #[serde(default)]
    pub texture: Option<TextureRecipe>,
    #[serde(default)]
    pub text: Option<String>,
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub layer_depth: f32,
    #[serde(default)]
    pub rotation_deg: f32,
    #[serde(default = "default_scale")]
    pub scale_x: f32,
    #[serde(default = "default_scale")]
    pub scale_y: f32,
    #[serde(default)]
    pub origin_x: f32,
    #[serde(default)]
    pub origin_y: f32,
    #[serde(default = "default_tint")]
    pub tint: String,
    #[serde(default = "default_visible")]
    pub visible: bool,
    /// Clip to start on sheet sprites.
    #[serde(default)]
    pub clip: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TextureRecipe {
    Rectangle {
        width: u32,
        height: u32,
        color: String,
    },
    HollowRectangle {
        width: u32,
        height: u32,
        color: String,
    },
    Circle {
        radius: f32,
        color: String,
    },
    HollowCircle {
        radius: f32,
        color: String,
    },
    /// Cross-fade between two solid colours, played as a sheet.
    Fade {
        width: u32,
        height: u32,
        from: String,
        to: String,
        frames: usize,
        #[serde(default = "default_frame_ms")]
        frame_ms: u64,
    },
    Progress {
        width: u32,
        height: u32,
        fraction: f32,
        fill: String,
        empty: String,
    },
    /// Path relative to the layout file.
    Png { path: String },
    /// Sheet definition JSON plus its PNG, both relative to the layout file.
    Sheet { image: String, definition: String },
}

impl TextureRecipe {
    fn colors(&self) -> Vec<&str> {
        match self {
            Self::Rectangle { color, .. }
            | Self::HollowRectangle { color, .. }
            | Self::Circle { color, .. }
            | Self::HollowCircle { color, .. } => vec![color.as_str()],
            Self::Fade { from, to, .. } => vec![from.as_str(), to.as_str()],
            Self::Progress { fill, empty, .. } => vec![fill.as_str(), empty.as_str()],
            Self::Png { .. } | Self::Sheet { .. } => Vec::new(),
        }
    }

    fn validate(&self, owner: &str) -> Result<(), String> {
        for color in self.colors() {
            parse_color(owner, color)?;
        }
        if let Self::Fade { frame_ms, .. } = self {
            if *frame_ms == 0 || *frame_ms > MAX_FRAME_DURATION_MS {
                return Err(format!(
                    "Layout validation failed: '{owner}' has fade frame_ms {frame_ms}, \
                     expected 1..={MAX_FRAME_DURATION_MS}"
                ));
            }
        }
        Ok(())
    }
}

/// Polls a layout file's modification time for hot reload.
pub struct LayoutWatcher {
    layout_path: PathBuf,
    last_seen_modified: Option<SystemTime>,
}

impl LayoutWatcher {
    pub fn new(layout_path: PathBuf) -> Self {
        let last_seen_modified = modified_time(&layout_path);
        Self {
            layout_path,
            last_seen_modified,
        }
    }

    pub fn path(&self) -> &Path {
        &self.layout_path
    }

    pub fn should_reload(&mut self) -> bool {
        let current = modified_time(&self.layout_path);
        match (self.last_seen_modified, current) {
            (Some(old), Some(now)) if now > old => {
                self.last_seen_modified = Some(now);
                true
            }
            (None, Some(now)) => {
                self.last_seen_modified = Some(now);
                true
            }
            _ => false,
        }
    }
}

pub fn load_layout_from_path(layout_path: &Path) -> Result<LayoutFile, String> {
    let raw = fs::read_to_string(layout_path)
        .map_err(|e| format!("Failed to read layout file {}: {e}", layout_path.display()))?;
    parse_layout(&raw).map_err(|e| format!("{e} ({})", layout_path.display()))
}

pub fn parse_layout(raw: &str) -> Result<LayoutFile, String> {
    let layout: LayoutFile =
        serde_json::from_str(raw).map_err(|e| format!("Failed to parse layout JSON: {e}"))?;
    validate_layout(&layout)?;
    Ok(layout)
}

fn validate_layout(layout: &LayoutFile) -> Result<(), String> {
    if layout.version != "0.1" {
        return Err(format!(
            "Layout validation failed: unsupported version '{}'",
            layout.version
        ));
    }
    if layout.screens.is_empty() {
        return Err("Layout validation failed: screens array is empty".to_string());
    }
    parse_color("background", &layout.background)?;

    let mut screen_names = HashSet::new();
    for screen in &layout.screens {
        if !screen_names.insert(screen.name.as_str()) {
            log::warn!(
                "Layout screen name '{}' is used more than once; lookups by name will fail",
                screen.name
            );
        }
        if let Some(rect) = screen.rect {
            if rect.width == 0 || rect.height == 0 {
                return Err(format!(
                    "Layout validation failed: screen '{}' has an empty rect",
                    screen.name
                ));
            }
        }
        parse_color(&screen.name, &screen.tint)?;
        parse_color(&screen.name, &screen.clear)?;
        if let Some(recipe) = &screen.background {
            recipe.validate(&screen.name)?;
        }
        if screen.sprites.is_empty() && screen.background.is_none() {
            log::warn!(
                "Layout screen '{}' has no sprites. This is allowed but often accidental.",
                screen.name
            );
        }

        let mut sprite_ids = HashSet::new();
        for sprite in &screen.sprites {
            if !sprite_ids.insert(sprite.id.as_str()) {
                return Err(format!(
                    "Layout validation failed: duplicate sprite id '{}' in screen '{}'",
                    sprite.id, screen.name
                ));
            }
            match (&sprite.texture, &sprite.text) {
                (Some(recipe), None) => recipe.validate(&sprite.id)?,
                (None, Some(_)) => {}
                _ => {
                    return Err(format!(
                        "Layout validation failed: sprite '{}' must provide exactly one of 'texture' or 'text'",
                        sprite.id
                    ));
                }
            }
            parse_color(&sprite.id, &sprite.tint)?;
        }
    }

    Ok(())
}

fn parse_color(owner: &str, raw: &str) -> Result<Color, String> {
    Color::from_hex(raw)
        .ok_or_else(|| format!("Layout validation failed: '{owner}' has invalid colour '{raw}'"))
}

/// Build every screen of `layout` on the factory's device. Relative asset
/// paths resolve against `asset_root`.
pub fn build_screen_manager(
    layout: &LayoutFile,
    factory: &TextureFactory,
    font: &Rc<SpriteFont>,
    asset_root: &Path,
) -> Result<ScreenManager, String> {
    let device = factory.device();
    let mut manager = ScreenManager::new(device.clone());
    manager.background_color = parse_color("background", &layout.background)?;

    for entry in &layout.screens {
        let screen = build_screen(entry, factory, font, asset_root)?;
        manager
            .add(screen)
            .map_err(|e| format!("Failed to add screen '{}': {e}", entry.name))?;
    }

    log::info!(
        "Built {} screens from layout version {}",
        manager.len(),
        layout.version
    );
    Ok(manager)
}

fn build_screen(
    entry: &LayoutScreen,
    factory: &TextureFactory,
    font: &Rc<SpriteFont>,
    asset_root: &Path,
) -> Result<Screen, String> {
    let device = factory.device();
    let bounds = entry.rect.map_or_else(
        || device.viewport(),
        |r| Rect::new(r.x, r.y, r.width, r.height),
    );
    let mut screen = Screen::with_bounds(device, entry.name.clone(), bounds)
        .map_err(|e| format!("Failed to create screen '{}': {e}", entry.name))?;
    screen.tint = parse_color(&entry.name, &entry.tint)?;
    screen.clear_color = parse_color(&entry.name, &entry.clear)?;
    screen.layer_depth = entry.layer_depth;
    screen.visible = entry.visible;
    screen.center_origin = entry.center_origin;

    if let Some(recipe) = &entry.background {
        let texture = match build_kind(recipe, factory, asset_root)? {
            SpriteKind::Texture(texture) => texture,
            _ => {
                return Err(format!(
                    "Screen '{}': background must be a single texture",
                    entry.name
                ))
            }
        };
        screen.set_background(Some(Sprite::stretched(texture, bounds.width, bounds.height)));
    }

    for sprite_entry in &entry.sprites {
        let sprite = build_sprite(sprite_entry, factory, font, asset_root)
            .map_err(|e| format!("Screen '{}': {e}", entry.name))?;
        screen.sprites_mut().add(sprite);
    }
    Ok(screen)
}

fn build_sprite(
    entry: &LayoutSprite,
    factory: &TextureFactory,
    font: &Rc<SpriteFont>,
    asset_root: &Path,
) -> Result<Sprite, String> {
    let mut kind = match (&entry.texture, &entry.text) {
        (Some(recipe), _) => build_kind(recipe, factory, asset_root)
            .map_err(|e| format!("sprite '{}': {e}", entry.id))?,
        (None, Some(text)) => SpriteKind::Text(TextSprite::new(Rc::clone(font), text.clone())),
        (None, None) => return Err(format!("sprite '{}' has nothing to show", entry.id)),
    };
    if let (SpriteKind::Sheet(sheet), Some(clip)) = (&mut kind, &entry.clip) {
        if !sheet.play(clip) {
            return Err(format!("sprite '{}': unknown clip '{clip}'", entry.id));
        }
    }

    let mut sprite = Sprite::new(kind)
        .at(Vec2::new(entry.x, entry.y))
        .with_scale(Vec2::new(entry.scale_x, entry.scale_y))
        .with_rotation(entry.rotation_deg.to_radians())
        .with_origin(Vec2::new(entry.origin_x, entry.origin_y))
        .with_tint(parse_color(&entry.id, &entry.tint)?)
        .with_layer_depth(entry.layer_depth);
    sprite.visible = entry.visible;
    Ok(sprite)
}

fn build_kind(
    recipe: &TextureRecipe,
    factory: &TextureFactory,
    asset_root: &Path,
) -> Result<SpriteKind, String> {
    let color = |raw: &str| parse_color("recipe", raw);
    let texture = match recipe {
        TextureRecipe::Rectangle {
            width,
            height,
            color: c,
        } => factory.create_rectangle(*width, *height, color(c)?),
        TextureRecipe::HollowRectangle {
            width,
            height,
            color: c,
        } => factory.create_hollow_rectangle(*width, *height, color(c)?),
        TextureRecipe::Circle { radius, color: c } => factory.create_circle(*radius, color(c)?),
        TextureRecipe::HollowCircle { radius, color: c } => {
            factory.create_hollow_circle(*radius, color(c)?)
        }
        TextureRecipe::Progress {
            width,
            height,
            fraction,
            fill,
            empty,
        } => factory.create_progress_bar(*width, *height, *fraction, color(fill)?, color(empty)?),
        TextureRecipe::Fade {
            width,
            height,
            from,
            to,
            frames,
            frame_ms,
        } => {
            let sheet = fade_sheet(
                factory,
                (*width, *height),
                color(from)?,
                color(to)?,
                *frames,
                *frame_ms,
            )?;
            return Ok(SpriteKind::Sheet(sheet));
        }
        TextureRecipe::Png { path } => {
            let texture = load_png_texture(factory.device(), &asset_root.join(path))?;
            return Ok(SpriteKind::Texture(Rc::new(texture)));
        }
        TextureRecipe::Sheet { image, definition } => {
            let definition = load_sheet_file(&asset_root.join(definition))?;
            let texture = load_png_texture(factory.device(), &asset_root.join(image))?;
            let sheet = SpriteSheet::from_definition(Rc::new(texture), &definition)?;
            return Ok(SpriteKind::Sheet(sheet));
        }
    };
    texture
        .map(|t| SpriteKind::Texture(Rc::new(t)))
        .map_err(|e| format!("texture generation failed: {e}"))
}

/// Lay the fade frames side by side on one strip and play them in order.
fn fade_sheet(
    factory: &TextureFactory,
    (width, height): (u32, u32),
    from: Color,
    to: Color,
    frames: usize,
    frame_ms: u64,
) -> Result<SpriteSheet, String> {
    let fail = |e: spw_texgen::TextureError| format!("fade generation failed: {e}");
    let frame_us = frame_duration_us(frame_ms)
        .ok_or_else(|| format!("fade frame_ms {frame_ms} is too large"))?;
    let first = factory.create_rectangle(width, height, from).map_err(fail)?;
    let last = factory.create_rectangle(width, height, to).map_err(fail)?;
    let strip = factory
        .create_fade_strip(&first, &last, frames)
        .map_err(fail)?;

    let mut sheet = SpriteSheet::new(Rc::new(strip), width, height)
        .ok_or_else(|| "fade strip does not hold a whole frame".to_string())?;
    sheet.add_clip(
        FADE_CLIP,
        AnimationClip::uniform(frames, frame_us, false),
    );
    sheet.play(FADE_CLIP);
    Ok(sheet)
}

pub fn load_png_texture(device: &GraphicsDevice, path: &Path) -> Result<Texture2D, String> {
    let image = image::open(path)
        .map_err(|e| format!("Failed to open '{}': {e}", path.display()))?
        .to_rgba8();
    let (w, h) = image.dimensions();
    let buffer = PixelBuffer::from_rgba8(w, h, image.as_raw())
        .map_err(|e| format!("Invalid image '{}': {e}", path.display()))?;
    log::info!("Loaded {}x{} texture from {}", w, h, path.display());
    Ok(device.texture_from_buffer(buffer))
}

fn modified_time(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).ok()?.modified().ok()
}

fn default_background() -> String {
    "#6495ed".to_string()
}

fn default_tint() -> String {
    "#ffffff".to_string()
}

fn default_clear() -> String {
    "#00000000".to_string()
}

const fn default_visible() -> bool {
    true
}

const fn default_scale() -> f32 {
    1.0
}

const fn default_frame_ms() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::UNIX_EPOCH;

    fn temp_file_path(name_hint: &str, ext: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "spw_layout_test_{}_{}_{}.{}",
            name_hint,
            std::process::id(),
            nanos,
            ext
        ))
    }

    fn build(raw: &str) -> Result<ScreenManager, String> {
        let layout = parse_layout(raw)?;
        let factory = TextureFactory::new(GraphicsDevice::new(64, 48));
        let font = Rc::new(SpriteFont::builtin(factory.device()));
        build_screen_manager(&layout, &factory, &font, Path::new("."))
    }

    const VALID: &str = r##"
    {
      "version": "0.1",
      "background": "#000000",
      "screens": [
        {
          "name": "world",
          "clear": "#102030",
          "background": { "kind": "rectangle", "width": 1, "height": 1, "color": "#203040" },
          "sprites": [
            { "id": "sun", "x": 4.0, "y": 4.0,
              "texture": { "kind": "circle", "radius": 6.0, "color": "#ffcc00" } },
            { "id": "pulse", "x": 20.0, "y": 4.0, "clip": "fade",
              "texture": { "kind": "fade", "width": 4, "height": 4,
                           "from": "#000000", "to": "#ffffff", "frames": 5 } }
          ]
        },
        {
          "name": "hud",
          "rect": { "x": 0, "y": 40, "width": 64, "height": 8 },
          "visible": false,
          "sprites": [
            { "id": "label", "x": 0.0, "y": 0.0, "text": "HP" },
            { "id": "bar", "x": 20.0, "y": 2.0,
              "texture": { "kind": "progress", "width": 30, "height": 4,
                           "fraction": 0.5, "fill": "#00ff00", "empty": "#303030" } }
          ]
        }
      ]
    }
    "##;

    #[test]
    fn builds_screens_from_valid_layout() {
        let manager = build(VALID).expect("valid layout should build");
        assert_eq!(manager.len(), 2);
        assert_eq!(manager.background_color, Color::BLACK);

        let world = manager.get("world").expect("world");
        assert_eq!(world.size(), (64, 48));
        assert_eq!(world.clear_color, Color::rgb(0x10, 0x20, 0x30));
        assert!(world.background().is_some());
        assert_eq!(world.sprites().len(), 2);
        let pulse = world.sprites().get(1).expect("pulse");
        let SpriteKind::Sheet(sheet) = pulse.kind() else {
            panic!("fade recipe should build a sheet");
        };
        assert_eq!(sheet.frame_count(), 5);
        assert_eq!(sheet.playing(), Some(FADE_CLIP));

        let hud = manager.get("hud").expect("hud");
        assert!(!hud.visible);
        assert_eq!(hud.bounds(), Rect::new(0, 40, 64, 8));
        assert!(matches!(
            hud.sprites().get(0).map(|s| s.kind()),
            Some(SpriteKind::Text(_))
        ));
    }

    #[test]
    fn built_layout_composites() {
        let mut manager = build(VALID).expect("valid layout should build");
        let mut back = manager
            .device()
            .create_render_target(64, 48)
            .expect("back buffer");
        let stats = manager.draw(&mut back);
        assert_eq!(stats.screens_composited, 1);
        // Stretched background covers the world screen.
        assert_eq!(back.surface().get(60, 40), Some(Color::rgb(0x20, 0x30, 0x40)));
    }

    #[test]
    fn rejects_bad_version_and_empty_screens() {
        let err = parse_layout(r#"{ "version": "2", "screens": [ { "name": "a" } ] }"#)
            .expect_err("version");
        assert!(err.contains("unsupported version"));
        let err = parse_layout(r#"{ "version": "0.1", "screens": [] }"#).expect_err("empty");
        assert!(err.contains("screens array is empty"));
    }

    #[test]
    fn rejects_invalid_colour() {
        let err = parse_layout(
            r#"{ "version": "0.1", "screens": [ { "name": "a", "tint": "blue" } ] }"#,
        )
        .expect_err("colour");
        assert!(err.contains("invalid colour 'blue'"));
    }

    #[test]
    fn rejects_duplicate_sprite_ids_and_empty_sprites() {
        let dup = r#"{ "version": "0.1", "screens": [ { "name": "a", "sprites": [
            { "id": "s", "x": 0, "y": 0, "text": "a" },
            { "id": "s", "x": 0, "y": 0, "text": "b" } ] } ] }"#;
        assert!(parse_layout(dup)
            .expect_err("duplicate")
            .contains("duplicate sprite id 's'"));

        let neither = r#"{ "version": "0.1", "screens": [ { "name": "a", "sprites": [
            { "id": "s", "x": 0, "y": 0 } ] } ] }"#;
        assert!(parse_layout(neither)
            .expect_err("neither")
            .contains("exactly one of"));
    }

    #[test]
    fn duplicate_screen_names_load_but_lookup_is_ambiguous() {
        let raw = r#"{ "version": "0.1", "screens": [
            { "name": "twin", "rect": { "x": 0, "y": 0, "width": 4, "height": 4 } },
            { "name": "twin", "rect": { "x": 0, "y": 0, "width": 4, "height": 4 } } ] }"#;
        let manager = build(raw).expect("duplicate names are allowed");
        assert!(manager.get("twin").is_err());
    }

    #[test]
    fn unknown_clip_fails_build() {
        let raw = r##"{ "version": "0.1", "screens": [ { "name": "a", "sprites": [
            { "id": "s", "x": 0, "y": 0, "clip": "nope",
              "texture": { "kind": "fade", "width": 2, "height": 2,
                           "from": "#000000", "to": "#ffffff", "frames": 2 } } ] } ] }"##;
        let err = build(raw).expect_err("unknown clip");
        assert!(err.contains("unknown clip 'nope'"));
    }

    #[test]
    fn rejects_fade_frame_ms_out_of_range() {
        for frame_ms in ["0", "18446744073709551615"] {
            let raw = format!(
                r##"{{ "version": "0.1", "screens": [ {{ "name": "a", "sprites": [
                    {{ "id": "glow", "x": 0, "y": 0,
                      "texture": {{ "kind": "fade", "width": 2, "height": 2,
                                   "from": "#000000", "to": "#ffffff", "frames": 2,
                                   "frame_ms": {frame_ms} }} }} ] }} ] }}"##
            );
            let err = parse_layout(&raw).expect_err("frame_ms out of range");
            assert!(err.contains("'glow' has fade frame_ms"), "{err}");
        }
    }

    #[test]
    fn png_recipe_loads_from_asset_root() {
        let png = temp_file_path("sprite", "png");
        let mut img = image::RgbaImage::new(3, 2);
        img.put_pixel(2, 1, image::Rgba([255, 0, 0, 255]));
        img.save(&png).expect("write png");

        let raw = format!(
            r#"{{ "version": "0.1", "screens": [ {{ "name": "a", "sprites": [
                {{ "id": "s", "x": 0, "y": 0, "texture": {{ "kind": "png", "path": "{}" }} }} ] }} ] }}"#,
            png.file_name().and_then(|n| n.to_str()).expect("file name")
        );
        let layout = parse_layout(&raw).expect("layout");
        let factory = TextureFactory::new(GraphicsDevice::new(8, 8));
        let font = Rc::new(SpriteFont::builtin(factory.device()));
        let root = png.parent().expect("temp dir");
        let manager = build_screen_manager(&layout, &factory, &font, root).expect("build");

        let sprite = manager[0].sprites().get(0).expect("sprite");
        let SpriteKind::Texture(texture) = sprite.kind() else {
            panic!("png recipe should build a texture");
        };
        assert_eq!(texture.size(), (3, 2));
        assert_eq!(texture.pixel(2, 1), Some(Color::RED));

        let _ = fs::remove_file(png);
    }

    #[test]
    fn watcher_reports_new_file_once() {
        let path = temp_file_path("watch", "json");
        let mut watcher = LayoutWatcher::new(path.clone());
        assert!(!watcher.should_reload());
        fs::write(&path, "{}").expect("write");
        assert!(watcher.should_reload());
        assert!(!watcher.should_reload());
        let _ = fs::remove_file(path);
    }
}
