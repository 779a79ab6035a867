pub mod error;
pub mod factory;
pub mod progress;

pub use error::TextureError;
pub use factory::{OverlayType, TextureFactory};
