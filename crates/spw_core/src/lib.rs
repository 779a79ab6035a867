pub mod animation;
pub mod buffer;
pub mod circle;
pub mod color;
pub mod geometry;
pub mod input;
pub mod time;

pub use buffer::{PixelBuffer, RasterError};
pub use color::Color;
pub use geometry::Rect;
pub use time::{FrameClock, GameTime};
