use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

use keepsake_engine::{Bounds, CgPayload, ItemAction, ItemDescription};
use serde::Deserialize;
use tracing::{info, warn};

pub(crate) const CATALOG_FILE: &str = "items.json";
const CATALOG_VERSION: u32 = 1;

/// Items placed in the rooms plus the story beats tied to them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Catalog {
    pub(crate) version: u32,
    /// Collecting this item opens `key_unlocks`.
    pub(crate) key_item: String,
    pub(crate) key_unlocks: String,
    /// Presented once every catalog item is held.
    pub(crate) completion_cg: CgPayload,
    pub(crate) items: Vec<PlacedItem>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct PlacedItem {
    pub(crate) room: String,
    pub(crate) at: Placement,
    pub(crate) item: ItemDescription,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub(crate) struct Placement {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) w: f32,
    pub(crate) h: f32,
}

impl Placement {
    pub(crate) fn bounds(self) -> Bounds {
        Bounds::new(self.x, self.y, self.w, self.h)
    }
}

impl Catalog {
    pub(crate) fn item_names(&self) -> Vec<String> {
        self.items
            .iter()
            .map(|placed| placed.item.name.clone())
            .collect()
    }

    pub(crate) fn items_in<'a>(&'a self, room: &'a str) -> impl Iterator<Item = &'a PlacedItem> + 'a {
        self.items.iter().filter(move |placed| placed.room == room)
    }

    /// Used when `assets/items.json` is missing or invalid.
    pub(crate) fn builtin() -> Self {
        let placed = |room: &str, x: f32, y: f32, item: ItemDescription| PlacedItem {
            room: room.to_string(),
            at: Placement {
                x,
                y,
                w: 32.0,
                h: 32.0,
            },
            item,
        };
        Self {
            version: CATALOG_VERSION,
            key_item: "brass_key".to_string(),
            key_unlocks: "study".to_string(),
            completion_cg: CgPayload::new("cg/keepsake")
                .with_text("Every keepsake is home again.")
                .with_duration_ms(6000),
            items: vec![
                placed(
                    "hall",
                    700.0,
                    300.0,
                    ItemDescription::new("brass_key", "icons/brass_key", "A small brass key.")
                        .with_dialogue("A key. The study door should open now.")
                        .with_on_use(ItemAction::Inspect),
                ),
                placed(
                    "study",
                    240.0,
                    220.0,
                    ItemDescription::new("letter", "icons/letter", "An unsigned letter.")
                        .with_on_use(ItemAction::Inspect),
                ),
            ],
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.version != CATALOG_VERSION {
            return Err(format!(
                "unsupported catalog version {} (expected {CATALOG_VERSION})",
                self.version
            ));
        }
        if self.items.is_empty() {
            return Err("catalog has no items".to_string());
        }
        let mut seen = HashSet::new();
        for placed in &self.items {
            if !seen.insert(placed.item.name.as_str()) {
                return Err(format!("duplicate item name '{}'", placed.item.name));
            }
        }
        if !seen.contains(self.key_item.as_str()) {
            return Err(format!("key item '{}' is not in the catalog", self.key_item));
        }
        Ok(())
    }
}

pub(crate) fn parse_catalog(raw: &str) -> Result<Catalog, String> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let catalog: Catalog = match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(catalog) => catalog,
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            return if path.is_empty() || path == "." {
                Err(format!("parse catalog json: {source}"))
            } else {
                Err(format!("parse catalog json at {path}: {source}"))
            };
        }
    };
    catalog.validate()?;
    Ok(catalog)
}

pub(crate) fn load_catalog(assets_dir: &Path) -> Catalog {
    let path = assets_dir.join(CATALOG_FILE);
    let raw = match fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            warn!(path = %path.display(), "catalog_missing_using_builtin");
            return Catalog::builtin();
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error, "catalog_read_failed_using_builtin");
            return Catalog::builtin();
        }
    };
    match parse_catalog(&raw) {
        Ok(catalog) => {
            info!(
                path = %path.display(),
                item_count = catalog.items.len(),
                "catalog_loaded"
            );
            catalog
        }
        Err(error) => {
            warn!(path = %path.display(), error = %error, "catalog_invalid_using_builtin");
            Catalog::builtin()
        }
    }
}
