use crate::app::Bounds;

use super::font::{for_each_lit_cell, text_width, GLYPH_HEIGHT};
use super::sprites::SpriteCache;
use super::surface::{Rgba, Surface, TextAlign};

const CLEAR_COLOR: Rgba = [0, 0, 0, 255];
const PLACEHOLDER_FILL: Rgba = [180, 60, 170, 255];
const PLACEHOLDER_EDGE: Rgba = [250, 250, 250, 255];
/// Screen pixels per font cell.
pub const TEXT_SCALE: u32 = 2;
pub const TEXT_LINE_HEIGHT: f32 = (GLYPH_HEIGHT * TEXT_SCALE) as f32;

/// Software rasterizer over an RGBA8 frame (the `pixels` frame buffer in the
/// windowed host). Everything is clipped to the frame; alpha below 255
/// blends over what is already there.
pub struct PixelSurface<'a> {
    frame: &'a mut [u8],
    width: u32,
    height: u32,
    sprites: &'a mut SpriteCache,
}

impl<'a> PixelSurface<'a> {
    pub fn new(frame: &'a mut [u8], width: u32, height: u32, sprites: &'a mut SpriteCache) -> Self {
        Self {
            frame,
            width,
            height,
            sprites,
        }
    }

    fn blend_pixel(&mut self, x: i32, y: i32, color: Rgba) {
        blend_pixel(self.frame, self.width, self.height, x, y, color);
    }

    fn span(&self, rect: Bounds) -> Option<PixelSpan> {
        PixelSpan::clipped(rect, self.width, self.height)
    }

    fn fill_span(&mut self, span: PixelSpan, color: Rgba) {
        for y in span.top..span.bottom {
            for x in span.left..span.right {
                self.blend_pixel(x, y, color);
            }
        }
    }

    fn draw_placeholder(&mut self, rect: Bounds) {
        let Some(span) = self.span(rect) else {
            return;
        };
        self.fill_span(span, PLACEHOLDER_FILL);
        for x in span.left..span.right {
            self.blend_pixel(x, span.top, PLACEHOLDER_EDGE);
            self.blend_pixel(x, span.bottom - 1, PLACEHOLDER_EDGE);
        }
        for y in span.top..span.bottom {
            self.blend_pixel(span.left, y, PLACEHOLDER_EDGE);
            self.blend_pixel(span.right - 1, y, PLACEHOLDER_EDGE);
        }
    }
}

impl Surface for PixelSurface<'_> {
    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn clear_rect(&mut self, rect: Bounds) {
        if let Some(span) = self.span(rect) {
            self.fill_span(span, CLEAR_COLOR);
        }
    }

    fn fill_rect(&mut self, rect: Bounds, color: Rgba) {
        if let Some(span) = self.span(rect) {
            self.fill_span(span, color);
        }
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, align: TextAlign, color: Rgba) {
        let width = text_width(text, TEXT_SCALE) as f32;
        let left = match align {
            TextAlign::Left => x,
            TextAlign::Center => x - width / 2.0,
            TextAlign::Right => x - width,
        };
        let (left, top) = (left.round() as i32, y.round() as i32);
        let scale = TEXT_SCALE as i32;
        let mut cells = Vec::new();
        for_each_lit_cell(text, |cx, cy| cells.push((cx as i32, cy as i32)));
        for (cx, cy) in cells {
            for dy in 0..scale {
                for dx in 0..scale {
                    self.blend_pixel(left + cx * scale + dx, top + cy * scale + dy, color);
                }
            }
        }
    }

    /// Stretches the image over `rect` with nearest-neighbour sampling. A
    /// missing image draws a placeholder box instead.
    fn draw_image(&mut self, image_key: &str, rect: Bounds) {
        let Some(span) = self.span(rect) else {
            return;
        };
        let Some(sprite) = self.sprites.get(image_key) else {
            self.draw_placeholder(rect);
            return;
        };
        let dest_w = rect.w.max(1.0);
        let dest_h = rect.h.max(1.0);
        for y in span.top..span.bottom {
            let v = ((y as f32 + 0.5 - rect.y) / dest_h * sprite.height() as f32).max(0.0) as u32;
            for x in span.left..span.right {
                let u = ((x as f32 + 0.5 - rect.x) / dest_w * sprite.width() as f32).max(0.0) as u32;
                blend_pixel(self.frame, self.width, self.height, x, y, sprite.pixel(u, v));
            }
        }
    }
}

fn blend_pixel(frame: &mut [u8], width: u32, height: u32, x: i32, y: i32, color: Rgba) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let offset = (y as usize * width as usize + x as usize) * 4;
    let Some(pixel) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    match color[3] {
        0 => {}
        255 => pixel.copy_from_slice(&color),
        alpha => {
            let alpha = u16::from(alpha);
            for channel in 0..3 {
                let src = u16::from(color[channel]);
                let dst = u16::from(pixel[channel]);
                pixel[channel] = ((src * alpha + dst * (255 - alpha)) / 255) as u8;
            }
            pixel[3] = 255;
        }
    }
}

/// Half-open pixel rectangle already clipped to the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelSpan {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl PixelSpan {
    fn clipped(rect: Bounds, width: u32, height: u32) -> Option<Self> {
        if !(rect.x.is_finite() && rect.y.is_finite() && rect.w.is_finite() && rect.h.is_finite()) {
            return None;
        }
        let span = Self {
            left: (rect.x.round() as i32).max(0),
            top: (rect.y.round() as i32).max(0),
            right: (rect.right().round() as i32).min(width as i32),
            bottom: (rect.bottom().round() as i32).min(height as i32),
        };
        (span.left < span.right && span.top < span.bottom).then_some(span)
    }
}
