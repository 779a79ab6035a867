use std::fmt;

use spw_core::RasterError;
use spw_render::DeviceId;

#[derive(Debug, Clone, PartialEq)]
pub enum ScreenError {
    /// No screen carries the requested name.
    NotFound(String),
    /// More than one screen carries the requested name.
    Ambiguous { name: String, count: usize },
    /// The screen was built on a different device than the manager.
    DeviceMismatch { expected: DeviceId, found: DeviceId },
    Raster(RasterError),
}

impl fmt::Display for ScreenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(name) => write!(f, "no screen named '{name}'"),
            Self::Ambiguous { name, count } => {
                write!(f, "{count} screens are named '{name}'")
            }
            Self::DeviceMismatch { expected, found } => {
                write!(f, "screen belongs to {found}, manager uses {expected}")
            }
            Self::Raster(e) => write!(f, "render target error: {e}"),
        }
    }
}

impl std::error::Error for ScreenError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Raster(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RasterError> for ScreenError {
    fn from(e: RasterError) -> Self {
        Self::Raster(e)
    }
}
