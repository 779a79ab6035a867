//! Non-premultiplied RGBA8 colour.
//!
//! All pixel data in the workspace is stored as straight (non-premultiplied)
//! alpha. Float conversions go through `Vec4` in `[0, 1]` and never scale RGB
//! by alpha, so a fade or blend that passes through a transparent colour does
//! not darken its neighbours.

use glam::Vec4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const TRANSPARENT: Color = Color::rgba(0, 0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const RED: Color = Color::rgb(255, 0, 0);
    pub const GREEN: Color = Color::rgb(0, 255, 0);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const CORNFLOWER_BLUE: Color = Color::rgb(100, 149, 237);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse `rrggbb` or `rrggbbaa`, with or without a leading `#`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if !(hex.len() == 6 || hex.len() == 8) || !hex.is_ascii() {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
        let a = if hex.len() == 8 { channel(6)? } else { 255 };
        Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    pub fn to_vec4(self) -> Vec4 {
        Vec4::new(
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        )
    }

    /// Convert back from `[0, 1]` components, clamping and rounding each one
    /// independently.
    pub fn from_vec4_non_premultiplied(v: Vec4) -> Self {
        let c = |x: f32| (x.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self::rgba(c(v.x), c(v.y), c(v.z), c(v.w))
    }

    /// Component-wise multiply by a tint (255 = identity).
    pub fn modulate(self, tint: Color) -> Color {
        if tint == Color::WHITE {
            return self;
        }
        let m = |a: u8, b: u8| ((a as u16 * b as u16 + 127) / 255) as u8;
        Color::rgba(
            m(self.r, tint.r),
            m(self.g, tint.g),
            m(self.b, tint.b),
            m(self.a, tint.a),
        )
    }

    /// Source-over composite of `self` onto `dst`, straight alpha in and out.
    pub fn blend_over(self, dst: Color) -> Color {
        match self.a {
            0 => return dst,
            255 => return self,
            _ => {}
        }
        let sa = self.a as f32 / 255.0;
        let da = dst.a as f32 / 255.0;
        let out_a = sa + da * (1.0 - sa);
        if out_a <= 0.0 {
            return Color::TRANSPARENT;
        }
        let mix = |s: u8, d: u8| {
            let v = (s as f32 * sa + d as f32 * da * (1.0 - sa)) / out_a;
            v.round().clamp(0.0, 255.0) as u8
        };
        Color::rgba(
            mix(self.r, dst.r),
            mix(self.g, dst.g),
            mix(self.b, dst.b),
            (out_a * 255.0).round() as u8,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_parses_with_and_without_alpha() {
        assert_eq!(Color::from_hex("ff8000"), Some(Color::rgb(255, 128, 0)));
        assert_eq!(
            Color::from_hex("#10203040"),
            Some(Color::rgba(0x10, 0x20, 0x30, 0x40))
        );
        assert_eq!(Color::from_hex("12345"), None);
        assert_eq!(Color::from_hex("zz0000"), None);
    }

    #[test]
    fn vec4_conversion_does_not_premultiply() {
        let c = Color::rgba(200, 100, 50, 0);
        let back = Color::from_vec4_non_premultiplied(c.to_vec4());
        assert_eq!(back, c);
    }

    #[test]
    fn vec4_conversion_clamps_out_of_range() {
        let c = Color::from_vec4_non_premultiplied(Vec4::new(1.5, -0.2, 0.5, 1.0));
        assert_eq!(c, Color::rgba(255, 0, 128, 255));
    }

    #[test]
    fn modulate_with_white_is_identity() {
        let c = Color::rgba(12, 34, 56, 78);
        assert_eq!(c.modulate(Color::WHITE), c);
        assert_eq!(Color::WHITE.modulate(c), c);
    }

    #[test]
    fn blend_over_opaque_and_transparent_fast_paths() {
        let dst = Color::BLUE;
        assert_eq!(Color::RED.blend_over(dst), Color::RED);
        assert_eq!(Color::TRANSPARENT.blend_over(dst), dst);
    }

    #[test]
    fn blend_over_half_alpha_mixes_channels() {
        let src = Color::rgba(255, 0, 0, 128);
        let out = src.blend_over(Color::BLACK);
        assert_eq!(out.a, 255);
        assert!((127..=129).contains(&out.r));
        assert_eq!(out.g, 0);
    }
}
