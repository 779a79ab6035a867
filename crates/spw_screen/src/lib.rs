pub mod collection;
pub mod error;
pub mod layout;
pub mod manager;
pub mod screen;
pub mod sprite;

pub use collection::SpriteCollection;
pub use error::ScreenError;
pub use layout::{build_screen_manager, load_layout_from_path, LayoutFile, LayoutWatcher};
pub use manager::{FrameStats, ScreenManager};
pub use screen::{PostProcess, Screen};
pub use sprite::{Drawable, MoveFilter, Sprite, SpriteKind, SpriteSheet, TextSprite};
