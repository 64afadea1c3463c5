use std::collections::HashMap;
use std::fmt;

use tracing::{debug, info, warn};

use super::entity::{Entity, EntityId, EntityList, FrameContext};
use super::inventory::Inventory;
use super::rendering::{Rgba, Surface};
use super::Bounds;

pub const DEFAULT_BACKGROUND: Rgba = [24, 22, 30, 255];

#[derive(Debug, Clone, PartialEq)]
pub enum Background {
    Color(Rgba),
    Image(String),
}

impl Default for Background {
    fn default() -> Self {
        Self::Color(DEFAULT_BACKGROUND)
    }
}

type SceneInit = Box<dyn FnOnce(&mut Scene)>;

/// A named room: background plus entities in registration order.
pub struct Scene {
    name: String,
    background: Background,
    entities: EntityList,
    init: Option<SceneInit>,
    initialized: bool,
}

impl fmt::Debug for Scene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scene")
            .field("name", &self.name)
            .field("background", &self.background)
            .field("entities", &self.entities)
            .field("initialized", &self.initialized)
            .finish()
    }
}

impl Scene {
    pub fn new(name: impl Into<String>, background: Background) -> Self {
        Self {
            name: name.into(),
            background,
            entities: EntityList::default(),
            init: None,
            initialized: false,
        }
    }

    /// Runs once, on the first activation. Later activations skip it.
    pub fn with_init(mut self, init: impl FnOnce(&mut Scene) + 'static) -> Self {
        self.init = Some(Box::new(init));
        self
    }

    pub fn add_entity(&mut self, entity: impl Entity + 'static) -> EntityId {
        self.add_boxed(Box::new(entity))
    }

    pub fn add_boxed(&mut self, entity: Box<dyn Entity>) -> EntityId {
        self.entities.add(entity)
    }

    pub fn remove_entity(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        self.entities.remove(id)
    }

    pub fn entity(&self, id: EntityId) -> Option<&dyn Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> &EntityList {
        &self.entities
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn set_background(&mut self, background: Background) {
        self.background = background;
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns true when this call ran the init hook.
    pub(crate) fn activate(&mut self) -> bool {
        if self.initialized {
            return false;
        }
        self.initialized = true;
        if let Some(init) = self.init.take() {
            init(self);
        }
        true
    }

    pub fn update(&mut self, dt_ms: f64, ctx: &mut FrameContext<'_>) {
        self.entities.update_all(dt_ms, ctx);
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let full = surface.full_rect();
        match &self.background {
            Background::Color(color) => surface.fill_rect(full, *color),
            Background::Image(key) => surface.draw_image(key, full),
        }
        self.entities.render_all(surface);
    }

    pub fn sync_with_inventory(&mut self, inventory: &Inventory) {
        self.entities.sync_with_inventory(inventory);
    }

    /// Bounds of every visible entity that blocks movement.
    pub fn obstacles(&self) -> Vec<Bounds> {
        self.entities
            .iter()
            .filter(|(_, entity)| entity.is_visible() && entity.blocks_movement())
            .map(|(_, entity)| entity.bounds())
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneSwitch {
    Activated,
    AlreadyActive,
    Unknown,
}

/// Name-keyed scene registry with at most one active scene.
#[derive(Debug, Default)]
pub(crate) struct SceneMachine {
    scenes: HashMap<String, Scene>,
    active: Option<String>,
}

impl SceneMachine {
    /// Registers a scene under its own name. A duplicate name is rejected and
    /// the existing scene is kept.
    pub(crate) fn register(&mut self, scene: Scene) -> bool {
        if self.scenes.contains_key(scene.name()) {
            warn!(scene = %scene.name(), "scene_register_duplicate_ignored");
            return false;
        }
        debug!(
            scene = %scene.name(),
            entity_count = scene.entity_count(),
            "scene_registered"
        );
        self.scenes.insert(scene.name().to_string(), scene);
        true
    }

    pub(crate) fn switch_to(&mut self, name: &str) -> SceneSwitch {
        if self.active.as_deref() == Some(name) {
            return SceneSwitch::AlreadyActive;
        }
        let Some(scene) = self.scenes.get_mut(name) else {
            warn!(scene = name, "scene_switch_unknown_ignored");
            return SceneSwitch::Unknown;
        };
        let ran_init = scene.activate();
        info!(
            scene = name,
            ran_init,
            entity_count = scene.entity_count(),
            "scene_activated"
        );
        self.active = Some(name.to_string());
        SceneSwitch::Activated
    }

    pub(crate) fn active_name(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub(crate) fn active(&self) -> Option<&Scene> {
        self.active.as_ref().and_then(|name| self.scenes.get(name))
    }

    pub(crate) fn active_mut(&mut self) -> Option<&mut Scene> {
        let name = self.active.as_ref()?;
        self.scenes.get_mut(name)
    }

    pub(crate) fn get(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub(crate) fn get_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub(crate) fn contains(&self, name: &str) -> bool {
        self.scenes.contains_key(name)
    }

    pub(crate) fn len(&self) -> usize {
        self.scenes.len()
    }

    pub(crate) fn sync_with_inventory(&mut self, inventory: &Inventory) {
        for scene in self.scenes.values_mut() {
            scene.sync_with_inventory(inventory);
        }
    }
}
