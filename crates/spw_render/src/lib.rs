pub mod device;
pub mod font;
mod font_data;
pub mod gpu_context;
pub mod presenter;
pub mod sprite_batch;
pub mod texture;
pub mod vertex;

pub use device::{DeviceId, GraphicsDevice};
pub use font::SpriteFont;
pub use gpu_context::{GpuContext, RenderContextError};
pub use presenter::Presenter;
pub use sprite_batch::{BatchStats, DrawParams, SpriteBatch, SpriteEffects, SpriteSortMode};
pub use texture::{RenderTarget, Texture2D};
pub use vertex::PresentVertex;
