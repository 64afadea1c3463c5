use tracing::{debug, info};

use crate::app::collision::contains_point;
use crate::app::commands::Command;
use crate::app::entity::{Entity, FrameContext};
use crate::app::event_bus::{channels, Event};
use crate::app::inventory::{Inventory, ItemDescription};
use crate::app::rendering::{Rgba, Surface, TextAlign};
use crate::app::Bounds;

const HOVER_OUTLINE_COLOR: Rgba = [255, 236, 160, 200];
const LABEL_COLOR: Rgba = [255, 250, 236, 255];
const LABEL_GAP: f32 = 14.0;

/// A collectible lying in the world. Once collected it stops hovering,
/// stops reacting to clicks and is no longer drawn.
#[derive(Debug, Clone)]
pub struct Item {
    description: ItemDescription,
    bounds: Bounds,
    collected: bool,
    hovered: bool,
}

impl Item {
    pub fn new(description: ItemDescription, bounds: Bounds) -> Self {
        Self {
            description,
            bounds,
            collected: false,
            hovered: false,
        }
    }

    pub fn description(&self) -> &ItemDescription {
        &self.description
    }

    pub fn name(&self) -> &str {
        &self.description.name
    }

    pub fn is_collected(&self) -> bool {
        self.collected
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    fn try_collect(&mut self, ctx: &mut FrameContext<'_>) -> bool {
        if !ctx.add_to_inventory(self.description.clone()) {
            debug!(item = %self.description.name, "item_collect_rejected_inventory_full");
            return false;
        }
        self.collected = true;
        self.hovered = false;
        info!(item = %self.description.name, "item_collected");
        ctx.commands.publish(
            channels::ITEM_COLLECTED,
            Event::ItemCollected(self.description.clone()),
        );
        if let Some(dialogue) = self.description.dialogue.clone() {
            ctx.commands.push(Command::ShowDialogue(dialogue));
        }
        true
    }
}

impl Entity for Item {
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn is_visible(&self) -> bool {
        !self.collected
    }

    fn update(&mut self, _dt_ms: f64, ctx: &mut FrameContext<'_>) {
        if self.collected {
            return;
        }
        self.hovered = contains_point(&self.bounds, ctx.input.pointer());
        if self.hovered && ctx.input.clicked() {
            self.try_collect(ctx);
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        if self.collected {
            return;
        }
        if self.hovered {
            surface.fill_rect(self.bounds.inflate(2.0), HOVER_OUTLINE_COLOR);
        }
        surface.draw_image(&self.description.icon, self.bounds);
        if self.hovered {
            surface.fill_text(
                &self.description.name,
                self.bounds.center().x,
                self.bounds.y - LABEL_GAP,
                TextAlign::Center,
                LABEL_COLOR,
            );
        }
    }

    /// Marks the item collected when a restored inventory already holds it.
    /// Never reverts a collected item.
    fn sync_with_inventory(&mut self, inventory: &Inventory) {
        if !self.collected && inventory.has_item(&self.description.name) {
            self.collected = true;
            self.hovered = false;
        }
    }

    fn debug_name(&self) -> &str {
        &self.description.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::commands::Commands;
    use crate::app::input::InputSnapshot;
    use crate::app::rendering::RecordingSurface;

    fn lamp() -> Item {
        Item::new(
            ItemDescription::new("lamp", "icons/lamp", "An oil lamp").with_dialogue("It still smells of oil."),
            Bounds::new(100.0, 100.0, 20.0, 20.0),
        )
    }

    fn run_update(item: &mut Item, input: &InputSnapshot, inventory: &mut Inventory) -> Commands {
        let mut commands = Commands::default();
        let mut ctx = FrameContext {
            input,
            obstacles: &[],
            inventory,
            commands: &mut commands,
        };
        item.update(16.0, &mut ctx);
        commands
    }

    #[test]
    fn hover_tracks_pointer_every_frame() {
        let mut item = lamp();
        let mut inventory = Inventory::default();

        run_update(&mut item, &InputSnapshot::empty().with_pointer(120.0, 120.0), &mut inventory);
        assert!(item.is_hovered());
        run_update(&mut item, &InputSnapshot::empty().with_pointer(0.0, 0.0), &mut inventory);
        assert!(!item.is_hovered());
    }

    #[test]
    fn click_while_hovered_collects_and_emits_events() {
        let mut item = lamp();
        let mut inventory = Inventory::default();
        let input = InputSnapshot::empty()
            .with_pointer(110.0, 110.0)
            .with_clicked(true);

        let mut commands = run_update(&mut item, &input, &mut inventory);

        assert!(item.is_collected());
        assert!(inventory.has_item("lamp"));
        assert!(matches!(
            commands.pop(),
            Some(Command::Publish { channel, .. }) if channel == channels::INVENTORY_CHANGED
        ));
        assert_eq!(
            commands.pop(),
            Some(Command::Publish {
                channel: channels::ITEM_COLLECTED.to_string(),
                event: Event::ItemCollected(item.description().clone()),
            })
        );
        assert_eq!(
            commands.pop(),
            Some(Command::ShowDialogue("It still smells of oil.".to_string()))
        );
    }

    #[test]
    fn click_outside_bounds_does_nothing() {
        let mut item = lamp();
        let mut inventory = Inventory::default();
        let input = InputSnapshot::empty().with_pointer(10.0, 10.0).with_clicked(true);

        let commands = run_update(&mut item, &input, &mut inventory);
        assert!(!item.is_collected());
        assert!(commands.is_empty());
    }

    #[test]
    fn click_on_far_corner_collects() {
        let mut item = lamp();
        let mut inventory = Inventory::default();
        let input = InputSnapshot::empty().with_pointer(120.0, 120.0).with_clicked(true);

        run_update(&mut item, &input, &mut inventory);
        assert!(item.is_collected());
    }

    #[test]
    fn collection_happens_once() {
        let mut item = lamp();
        let mut inventory = Inventory::default();
        let input = InputSnapshot::empty().with_pointer(110.0, 110.0).with_clicked(true);

        run_update(&mut item, &input, &mut inventory);
        let second = run_update(&mut item, &input, &mut inventory);

        assert_eq!(inventory.len(), 1);
        assert!(second.is_empty());
        assert!(!item.is_hovered());
    }

    #[test]
    fn full_inventory_leaves_item_retryable() {
        let mut item = lamp();
        let mut inventory = Inventory::with_capacity(1);
        assert!(inventory.add_item(ItemDescription::new("filler", "i", "t")));
        let input = InputSnapshot::empty().with_pointer(110.0, 110.0).with_clicked(true);

        let commands = run_update(&mut item, &input, &mut inventory);
        assert!(!item.is_collected());
        assert!(commands.is_empty());

        assert!(inventory.remove_item("filler"));
        run_update(&mut item, &input, &mut inventory);
        assert!(item.is_collected());
    }

    #[test]
    fn collected_item_is_not_rendered() {
        let mut item = lamp();
        let mut inventory = Inventory::default();
        let input = InputSnapshot::empty().with_pointer(110.0, 110.0).with_clicked(true);
        run_update(&mut item, &input, &mut inventory);

        let mut surface = RecordingSurface::new(200, 200);
        item.render(&mut surface);
        assert!(!item.is_visible());
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn hovered_item_draws_label() {
        let mut item = lamp();
        let mut inventory = Inventory::default();
        run_update(&mut item, &InputSnapshot::empty().with_pointer(101.0, 101.0), &mut inventory);

        let mut surface = RecordingSurface::new(200, 200);
        item.render(&mut surface);
        assert_eq!(surface.image_keys().collect::<Vec<_>>(), vec!["icons/lamp"]);
        assert_eq!(surface.texts().collect::<Vec<_>>(), vec!["lamp"]);
    }

    #[test]
    fn restored_inventory_marks_item_collected() {
        let mut item = lamp();
        let mut inventory = Inventory::default();
        assert!(inventory.add_item(item.description().clone()));

        item.sync_with_inventory(&inventory);
        assert!(item.is_collected());

        item.sync_with_inventory(&Inventory::default());
        assert!(item.is_collected());
    }
}
