mod font;
mod pixel_surface;
mod sprites;
mod surface;

pub use font::text_width;
pub use pixel_surface::{PixelSurface, TEXT_LINE_HEIGHT, TEXT_SCALE};
pub use sprites::{LoadedSprite, SpriteCache};
pub use surface::{DrawCommand, RecordingSurface, Rgba, Surface, TextAlign};
