use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::app::{Engine, ItemDescription, TaskOwner, DEFAULT_DIALOGUE_DURATION_MS};

use super::store::{BlobStore, StoreError};

pub const INVENTORY_KEY: &str = "inventory";
pub const SETTINGS_KEY: &str = "settings";
pub const SNAPSHOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventorySnapshot {
    pub version: u32,
    pub items: Vec<ItemDescription>,
}

/// Player preferences. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub dialogue_duration_ms: u64,
    pub show_stats: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            dialogue_duration_ms: DEFAULT_DIALOGUE_DURATION_MS,
            show_stats: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Menu-level control over an engine: start/stop gating and persistence of
/// the inventory and settings through a [`BlobStore`].
#[derive(Debug)]
pub struct Session<S: BlobStore> {
    store: S,
}

impl<S: BlobStore> Session<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    /// Starts the frame loop, activating the configured first scene when no
    /// scene is active yet.
    pub fn start_game(&mut self, engine: &mut Engine, now_ms: f64) {
        if engine.active_scene_name().is_none() {
            match engine.config().initial_scene.clone() {
                Some(first) => {
                    if !engine.set_scene(&first) {
                        warn!(scene = %first, "session_initial_scene_missing");
                    }
                }
                None => debug!("session_start_without_initial_scene"),
            }
        }
        engine.start(now_ms);
    }

    pub fn stop_game(&mut self, engine: &mut Engine) {
        engine.stop();
    }

    /// Returns whether the engine is running afterwards.
    pub fn toggle_pause(&mut self, engine: &mut Engine, now_ms: f64) -> bool {
        if engine.is_running() {
            self.stop_game(engine);
        } else {
            self.start_game(engine, now_ms);
        }
        engine.is_running()
    }

    pub fn save(&mut self, engine: &Engine) -> Result<(), SessionError> {
        let snapshot = InventorySnapshot {
            version: SNAPSHOT_VERSION,
            items: engine.inventory().items().to_vec(),
        };
        self.write_json(INVENTORY_KEY, &snapshot)?;
        info!(item_count = snapshot.items.len(), "session_saved");
        Ok(())
    }

    /// Restores the saved inventory. Returns false, leaving the engine
    /// untouched, when nothing usable is stored.
    pub fn load(&mut self, engine: &mut Engine) -> bool {
        let Some(snapshot) = self.read_json::<InventorySnapshot>(INVENTORY_KEY) else {
            return false;
        };
        if snapshot.version != SNAPSHOT_VERSION {
            warn!(
                key = INVENTORY_KEY,
                expected = SNAPSHOT_VERSION,
                actual = snapshot.version,
                "session_snapshot_version_mismatch"
            );
            return false;
        }
        let cancelled = engine.cancel_tasks_owned_by(&TaskOwner::Session);
        let item_count = snapshot.items.len();
        let dropped = engine.restore_inventory(snapshot.items);
        info!(item_count, dropped, cancelled, "session_loaded");
        true
    }

    pub fn save_settings(&mut self, settings: &Settings) -> Result<(), SessionError> {
        self.write_json(SETTINGS_KEY, settings)?;
        debug!(?settings, "settings_saved");
        Ok(())
    }

    pub fn load_settings(&self) -> Settings {
        self.read_json(SETTINGS_KEY).unwrap_or_default()
    }

    pub fn apply_settings(&self, engine: &mut Engine, settings: &Settings) {
        engine.set_dialogue_duration_ms(settings.dialogue_duration_ms);
    }

    fn write_json<T: Serialize>(&mut self, key: &'static str, value: &T) -> Result<(), SessionError> {
        let json = serde_json::to_string_pretty(value)
            .map_err(|source| SessionError::Encode { key, source })?;
        self.store.set(key, &json)?;
        Ok(())
    }

    /// Missing and malformed entries both read as `None`; malformed ones are
    /// logged with the JSON path that failed.
    fn read_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.store.get(key)?;
        let mut deserializer = serde_json::Deserializer::from_str(&raw);
        match serde_path_to_error::deserialize(&mut deserializer) {
            Ok(value) => Some(value),
            Err(error) => {
                warn!(
                    key,
                    path = %error.path(),
                    error = %error.inner(),
                    "session_entry_malformed_using_defaults"
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::app::{Background, Bounds, EngineConfig, Entity, Item, Scene};
    use crate::persistence::{FileBlobStore, MemoryBlobStore};

    fn key_item() -> ItemDescription {
        ItemDescription::new("key", "icons/key", "A brass key")
    }

    fn engine() -> Engine {
        let mut engine = Engine::new(EngineConfig {
            initial_scene: Some("hall".into()),
            ..EngineConfig::default()
        });
        let mut hall = Scene::new("hall", Background::default());
        hall.add_entity(Item::new(key_item(), Bounds::new(10.0, 10.0, 16.0, 16.0)));
        engine.add_scene(hall);
        engine
    }

    #[test]
    fn start_activates_initial_scene_and_toggle_pauses() {
        let mut session = Session::new(MemoryBlobStore::new());
        let mut engine = engine();

        session.start_game(&mut engine, 0.0);
        assert!(engine.is_running());
        assert_eq!(engine.active_scene_name(), Some("hall"));

        assert!(!session.toggle_pause(&mut engine, 10.0));
        assert!(session.toggle_pause(&mut engine, 20.0));
    }

    #[test]
    fn save_then_load_round_trips_inventory_through_memory() {
        let mut session = Session::new(MemoryBlobStore::new());
        let mut engine = engine();
        assert!(engine.add_to_inventory(key_item()));
        session.save(&engine).expect("save");

        let mut fresh = self::engine();
        assert!(session.load(&mut fresh));

        assert_eq!(fresh.inventory().items(), &[key_item()]);
        let hall = fresh.scene("hall").expect("hall");
        assert!(hall.entities().iter().all(|(_, entity)| !entity.is_visible()));
    }

    #[test]
    fn save_then_load_round_trips_through_files() {
        let temp = TempDir::new().expect("temp dir");
        let mut engine = engine();
        assert!(engine.add_to_inventory(key_item()));
        Session::new(FileBlobStore::new(temp.path()))
            .save(&engine)
            .expect("save");

        let mut session = Session::new(FileBlobStore::new(temp.path()));
        let mut fresh = self::engine();
        assert!(session.load(&mut fresh));
        assert!(fresh.inventory().has_item("key"));
    }

    #[test]
    fn missing_snapshot_leaves_inventory_unchanged() {
        let mut session = Session::new(MemoryBlobStore::new());
        let mut engine = engine();
        assert!(engine.add_to_inventory(key_item()));

        assert!(!session.load(&mut engine));
        assert_eq!(engine.inventory().len(), 1);
    }

    #[test]
    fn malformed_snapshot_is_treated_as_missing() {
        let mut store = MemoryBlobStore::new();
        store
            .set(INVENTORY_KEY, r#"{"version":1,"items":[{"name":3}]}"#)
            .expect("set");
        let mut session = Session::new(store);
        let mut engine = engine();

        assert!(!session.load(&mut engine));
        assert!(engine.inventory().is_empty());
    }

    #[test]
    fn future_snapshot_version_is_rejected() {
        let mut store = MemoryBlobStore::new();
        store
            .set(INVENTORY_KEY, r#"{"version":99,"items":[]}"#)
            .expect("set");
        let mut session = Session::new(store);

        assert!(!session.load(&mut engine()));
    }

    #[test]
    fn oversized_snapshot_is_truncated_to_capacity() {
        let items: Vec<_> = (0..12)
            .map(|index| ItemDescription::new(format!("item_{index}"), "icons/x", "x"))
            .collect();
        let mut store = MemoryBlobStore::new();
        let raw = serde_json::to_string(&InventorySnapshot {
            version: SNAPSHOT_VERSION,
            items,
        })
        .expect("encode");
        store.set(INVENTORY_KEY, &raw).expect("set");
        let mut session = Session::new(store);
        let mut engine = engine();

        assert!(session.load(&mut engine));
        assert_eq!(engine.inventory().len(), 10);
    }

    #[test]
    fn load_cancels_session_tasks() {
        let mut session = Session::new(MemoryBlobStore::new());
        let mut engine = engine();
        session.save(&engine).expect("save");
        engine.schedule(
            1000.0,
            TaskOwner::Session,
            crate::app::DeferredTask::ShowDialogue("stale".into()),
        );

        assert!(session.load(&mut engine));
        assert_eq!(engine.pending_task_count(), 0);
    }

    #[test]
    fn settings_default_on_missing_or_malformed_data() {
        let mut session = Session::new(MemoryBlobStore::new());
        assert_eq!(session.load_settings(), Settings::default());

        session
            .store_mut()
            .set(SETTINGS_KEY, r#"{"dialogue_duration_ms":"soon"}"#)
            .expect("set");
        assert_eq!(session.load_settings(), Settings::default());

        session
            .store_mut()
            .set(SETTINGS_KEY, r#"{"show_stats":true}"#)
            .expect("set");
        assert_eq!(
            session.load_settings(),
            Settings {
                dialogue_duration_ms: DEFAULT_DIALOGUE_DURATION_MS,
                show_stats: true,
            }
        );
    }

    #[test]
    fn saved_settings_apply_to_engine() {
        let mut session = Session::new(MemoryBlobStore::new());
        let settings = Settings {
            dialogue_duration_ms: 1200,
            show_stats: true,
        };
        session.save_settings(&settings).expect("save settings");

        let mut engine = engine();
        let loaded = session.load_settings();
        session.apply_settings(&mut engine, &loaded);

        assert_eq!(loaded, settings);
        assert_eq!(engine.dialogue_duration_ms(), 1200);
    }
}
