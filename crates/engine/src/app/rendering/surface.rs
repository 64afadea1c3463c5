use crate::app::Bounds;

pub type Rgba = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextAlign {
    Left,
    Center,
    Right,
}

/// The drawing primitives the engine issues. Implementations never need to
/// support reading pixels back.
pub trait Surface {
    fn size(&self) -> (u32, u32);
    fn clear_rect(&mut self, rect: Bounds);
    fn fill_rect(&mut self, rect: Bounds, color: Rgba);
    /// `y` is the top of the text line; `x` is interpreted per `align`.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Rgba);
    fn draw_image(&mut self, image_key: &str, rect: Bounds);

    fn full_rect(&self) -> Bounds {
        let (width, height) = self.size();
        Bounds::new(0.0, 0.0, width as f32, height as f32)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    ClearRect(Bounds),
    FillRect(Bounds, Rgba),
    FillText {
        text: String,
        x: f32,
        y: f32,
        align: TextAlign,
        color: Rgba,
    },
    DrawImage {
        image_key: String,
        rect: Bounds,
    },
}

/// Records every primitive call. Used by headless runs and tests.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::FillText { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }

    pub fn image_keys(&self) -> impl Iterator<Item = &str> {
        self.commands.iter().filter_map(|command| match command {
            DrawCommand::DrawImage { image_key, .. } => Some(image_key.as_str()),
            _ => None,
        })
    }
}

impl Surface for RecordingSurface {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, rect: Bounds) {
        self.commands.push(DrawCommand::ClearRect(rect));
    }

    fn fill_rect(&mut self, rect: Bounds, color: Rgba) {
        self.commands.push(DrawCommand::FillRect(rect, color));
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Rgba) {
        self.commands.push(DrawCommand::FillText {
            text: text.to_string(),
            x,
            y,
            align,
            color,
        });
    }

    fn draw_image(&mut self, image_key: &str, rect: Bounds) {
        self.commands.push(DrawCommand::DrawImage {
            image_key: image_key.to_string(),
            rect,
        });
    }
}
