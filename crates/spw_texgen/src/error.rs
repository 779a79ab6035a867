use std::fmt;

use spw_core::RasterError;
use spw_render::DeviceId;

#[derive(Debug, Clone, PartialEq)]
pub enum TextureError {
    Raster(RasterError),
    /// Two images that must share a device do not.
    DeviceMismatch { first: DeviceId, second: DeviceId },
    /// Two images that must be the same size are not.
    SizeMismatch {
        first: (u32, u32),
        second: (u32, u32),
    },
    InvalidFrameCount(usize),
    /// A fade strip of this many frames would be wider than `u32::MAX`.
    StripTooWide { frame_width: u32, frames: usize },
    OverlayOutOfBounds {
        origin: (u32, u32),
        overlay: (u32, u32),
        main: (u32, u32),
    },
    /// Cropping would leave nothing behind.
    EntirelyWhitespace { width: u32, height: u32 },
    /// A progress bar image holds more than its fill and empty colours.
    TooManyColors(usize),
    InvalidFraction(f32),
}

impl fmt::Display for TextureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raster(e) => write!(f, "raster error: {e}"),
            Self::DeviceMismatch { first, second } => {
                write!(f, "images belong to different devices ({first} vs {second})")
            }
            Self::SizeMismatch { first, second } => write!(
                f,
                "image sizes differ: {}x{} vs {}x{}",
                first.0, first.1, second.0, second.1
            ),
            Self::InvalidFrameCount(n) => write!(f, "frame count must be at least 1, got {n}"),
            Self::StripTooWide {
                frame_width,
                frames,
            } => write!(f, "a strip of {frames} frames {frame_width} pixels wide is too wide"),
            Self::OverlayOutOfBounds {
                origin,
                overlay,
                main,
            } => write!(
                f,
                "{}x{} overlay at ({}, {}) exceeds {}x{} image",
                overlay.0, overlay.1, origin.0, origin.1, main.0, main.1
            ),
            Self::EntirelyWhitespace { width, height } => {
                write!(f, "{width}x{height} image is entirely whitespace")
            }
            Self::TooManyColors(n) => {
                write!(f, "progress bar image has {n} colours, expected at most 2")
            }
            Self::InvalidFraction(v) => write!(f, "fraction {v} is outside [0, 1]"),
        }
    }
}

impl std::error::Error for TextureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Raster(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RasterError> for TextureError {
    fn from(e: RasterError) -> Self {
        Self::Raster(e)
    }
}
