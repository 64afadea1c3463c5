use std::fmt;

use super::commands::Commands;
use super::event_bus::{channels, Event};
use super::input::InputSnapshot;
use super::inventory::{Inventory, ItemDescription};
use super::rendering::Surface;
use super::Bounds;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

/// Everything an entity may touch during its update. Input is read-only;
/// side effects go through the inventory or the command sink.
pub struct FrameContext<'a> {
    pub input: &'a InputSnapshot,
    /// Bounds of the blocking entities in the active scene.
    pub obstacles: &'a [Bounds],
    pub inventory: &'a mut Inventory,
    pub commands: &'a mut Commands,
}

impl FrameContext<'_> {
    /// Adds to the inventory and queues the UI refresh event on success.
    pub fn add_to_inventory(&mut self, item: ItemDescription) -> bool {
        if !self.inventory.add_item(item) {
            return false;
        }
        self.commands.publish(
            channels::INVENTORY_CHANGED,
            Event::InventoryChanged {
                len: self.inventory.len(),
                capacity: self.inventory.capacity(),
            },
        );
        true
    }
}

/// Capability set for anything in the update/render cycle. Only `bounds` is
/// required; entities without per-frame logic or visuals keep the empty
/// default hooks and are skipped at no cost.
pub trait Entity {
    fn bounds(&self) -> Bounds;

    fn is_visible(&self) -> bool {
        true
    }

    /// Blocking entities stop the player from walking through them.
    fn blocks_movement(&self) -> bool {
        false
    }

    fn update(&mut self, _dt_ms: f64, _ctx: &mut FrameContext<'_>) {}

    fn render(&self, _surface: &mut dyn Surface) {}

    /// Called after the inventory is restored from a snapshot.
    fn sync_with_inventory(&mut self, _inventory: &Inventory) {}

    fn debug_name(&self) -> &str {
        "entity"
    }
}

struct EntitySlot {
    id: EntityId,
    entity: Box<dyn Entity>,
}

/// Registration-ordered entity storage shared by scenes and the engine's
/// global list. Order drives both update order and back-to-front painting.
#[derive(Default)]
pub struct EntityList {
    allocator: EntityIdAllocator,
    slots: Vec<EntitySlot>,
}

impl fmt::Debug for EntityList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(
                self.slots
                    .iter()
                    .map(|slot| (slot.id, slot.entity.debug_name())),
            )
            .finish()
    }
}

impl EntityList {
    pub fn add(&mut self, entity: Box<dyn Entity>) -> EntityId {
        let id = self.allocator.allocate();
        self.slots.push(EntitySlot { id, entity });
        id
    }

    pub fn remove(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        let index = self.slots.iter().position(|slot| slot.id == id)?;
        Some(self.slots.remove(index).entity)
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .map(|slot| slot.entity.as_ref())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> + '_ {
        self.slots
            .iter()
            .map(|slot| (slot.id, slot.entity.as_ref()))
    }

    pub fn update_all(&mut self, dt_ms: f64, ctx: &mut FrameContext<'_>) {
        for slot in &mut self.slots {
            slot.entity.update(dt_ms, ctx);
        }
    }

    pub fn render_all(&self, surface: &mut dyn Surface) {
        for slot in &self.slots {
            if slot.entity.is_visible() {
                slot.entity.render(surface);
            }
        }
    }

    pub fn sync_with_inventory(&mut self, inventory: &Inventory) {
        for slot in &mut self.slots {
            slot.entity.sync_with_inventory(inventory);
        }
    }
}
