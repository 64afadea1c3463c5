use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::ImageReader;
use tracing::warn;

use crate::asset_keys::validate_asset_key;

/// Decoded RGBA8 image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

impl LoadedSprite {
    /// Returns `None` when `rgba` does not hold exactly `width * height` pixels.
    pub fn from_rgba(width: u32, height: u32, rgba: Vec<u8>) -> Option<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)?
            .checked_mul(4)?;
        if width == 0 || height == 0 || rgba.len() != expected {
            return None;
        }
        Some(Self {
            width,
            height,
            rgba,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let x = x.min(self.width - 1) as usize;
        let y = y.min(self.height - 1) as usize;
        let offset = (y * self.width as usize + x) * 4;
        [
            self.rgba[offset],
            self.rgba[offset + 1],
            self.rgba[offset + 2],
            self.rgba[offset + 3],
        ]
    }
}

/// Lazily decodes `<sprite_dir>/<key>.png` on first use and remembers
/// failures, so a missing image costs one warning and one disk probe.
#[derive(Debug, Default)]
pub struct SpriteCache {
    sprite_dir: Option<PathBuf>,
    sprites: HashMap<String, Option<LoadedSprite>>,
    warned_keys: HashSet<String>,
}

impl SpriteCache {
    pub fn new(sprite_dir: impl Into<PathBuf>) -> Self {
        Self {
            sprite_dir: Some(sprite_dir.into()),
            ..Self::default()
        }
    }

    pub fn sprite_dir(&self) -> Option<&Path> {
        self.sprite_dir.as_deref()
    }

    pub fn insert(&mut self, key: impl Into<String>, sprite: LoadedSprite) {
        self.sprites.insert(key.into(), Some(sprite));
    }

    pub fn get(&mut self, key: &str) -> Option<&LoadedSprite> {
        if !self.sprites.contains_key(key) {
            let loaded = self.load(key);
            self.sprites.insert(key.to_string(), loaded);
        }
        self.sprites.get(key).and_then(Option::as_ref)
    }

    pub fn loaded_count(&self) -> usize {
        self.sprites.values().filter(|entry| entry.is_some()).count()
    }

    fn load(&mut self, key: &str) -> Option<LoadedSprite> {
        let sprite_dir = self.sprite_dir.clone()?;
        let path = match validate_asset_key(key) {
            Ok(()) => sprite_dir.join(format!("{key}.png")),
            Err(error) => {
                self.warn_once(key, None, &format!("invalid_key:{error}"));
                return None;
            }
        };
        match decode_png(&path) {
            Ok(sprite) => Some(sprite),
            Err(reason) => {
                self.warn_once(key, Some(&path), &reason);
                None
            }
        }
    }

    fn warn_once(&mut self, key: &str, path: Option<&Path>, reason: &str) {
        if !self.warned_keys.insert(key.to_string()) {
            return;
        }
        let path_display = path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unresolved>".to_string());
        warn!(
            sprite_key = key,
            path = %path_display,
            reason,
            "sprite_load_failed_using_placeholder"
        );
    }
}

fn decode_png(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let image = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?
        .to_rgba8();
    let (width, height) = image.dimensions();
    LoadedSprite::from_rgba(width, height, image.into_raw())
        .ok_or_else(|| "empty_image".to_string())
}
