use crate::app::entity::Entity;
use crate::app::rendering::{Rgba, Surface};
use crate::app::Bounds;

#[derive(Debug, Clone, PartialEq)]
pub enum PropLook {
    Solid(Rgba),
    Image(String),
}

/// Static decor. Has no update hook.
#[derive(Debug, Clone)]
pub struct Prop {
    name: String,
    bounds: Bounds,
    look: PropLook,
    visible: bool,
    blocking: bool,
}

impl Prop {
    pub fn solid(name: impl Into<String>, bounds: Bounds, color: Rgba) -> Self {
        Self {
            name: name.into(),
            bounds,
            look: PropLook::Solid(color),
            visible: true,
            blocking: false,
        }
    }

    pub fn image(name: impl Into<String>, bounds: Bounds, image_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            bounds,
            look: PropLook::Image(image_key.into()),
            visible: true,
            blocking: false,
        }
    }

    pub fn hidden(mut self) -> Self {
        self.visible = false;
        self
    }

    /// Furniture the player cannot walk through.
    pub fn blocking(mut self) -> Self {
        self.blocking = true;
        self
    }
}

impl Entity for Prop {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn blocks_movement(&self) -> bool {
        self.blocking
    }

    fn render(&self, surface: &mut dyn Surface) {
        match &self.look {
            PropLook::Solid(color) => surface.fill_rect(self.bounds, *color),
            PropLook::Image(key) => surface.draw_image(key, self.bounds),
        }
    }

    fn debug_name(&self) -> &str {
        &self.name
    }
}
