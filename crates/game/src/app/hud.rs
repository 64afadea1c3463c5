use keepsake_engine::app::contains_point;
use keepsake_engine::{
    Bounds, Command, Entity, FrameContext, Inventory, Rgba, Surface, TextAlign, Vec2,
};

const SLOT_SIZE: f32 = 40.0;
const SLOT_GAP: f32 = 6.0;
const BOTTOM_MARGIN: f32 = 12.0;
const SLOT_COLOR: Rgba = [20, 18, 24, 200];
const SLOT_HOVER_COLOR: Rgba = [200, 170, 90, 255];
const SLOT_NUMBER_COLOR: Rgba = [200, 196, 188, 255];
const ICON_INSET: f32 = 4.0;

/// Inventory strip along the bottom edge. Clicking a filled slot uses the
/// item in it.
#[derive(Debug, Clone)]
pub(crate) struct InventoryHud {
    capacity: usize,
    icons: Vec<String>,
    surface_size: (u32, u32),
    hovered: Option<usize>,
}

impl InventoryHud {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            capacity,
            icons: Vec::new(),
            surface_size: (0, 0),
            hovered: None,
        }
    }

    fn slot_bounds(&self, index: usize) -> Bounds {
        let strip = self.bounds();
        Bounds::new(
            strip.x + index as f32 * (SLOT_SIZE + SLOT_GAP),
            strip.y,
            SLOT_SIZE,
            SLOT_SIZE,
        )
    }

    fn slot_at(&self, point: Vec2) -> Option<usize> {
        (0..self.capacity).find(|&index| contains_point(&self.slot_bounds(index), point))
    }

    fn refresh(&mut self, inventory: &Inventory) {
        self.icons.clear();
        self.icons
            .extend(inventory.items().iter().map(|item| item.icon.clone()));
    }
}

impl Entity for InventoryHud {
    fn bounds(&self) -> Bounds {
        let slots = self.capacity as f32;
        let width = slots * SLOT_SIZE + (slots - 1.0).max(0.0) * SLOT_GAP;
        let (surface_w, surface_h) = self.surface_size;
        Bounds::new(
            (surface_w as f32 - width) / 2.0,
            surface_h as f32 - SLOT_SIZE - BOTTOM_MARGIN,
            width,
            SLOT_SIZE,
        )
    }

    fn update(&mut self, _dt_ms: f64, ctx: &mut FrameContext<'_>) {
        self.surface_size = ctx.input.surface_size();
        self.refresh(ctx.inventory);
        self.hovered = self.slot_at(ctx.input.pointer());
        if let (Some(index), true) = (self.hovered, ctx.input.clicked()) {
            if index < self.icons.len() {
                ctx.commands.push(Command::UseItemAt(index));
            }
        }
    }

    fn render(&self, surface: &mut dyn Surface) {
        if self.surface_size == (0, 0) {
            return;
        }
        for index in 0..self.capacity {
            let slot = self.slot_bounds(index);
            if self.hovered == Some(index) {
                surface.fill_rect(slot.inflate(2.0), SLOT_HOVER_COLOR);
            }
            surface.fill_rect(slot, SLOT_COLOR);
            if let Some(icon) = self.icons.get(index) {
                surface.draw_image(icon, slot.inflate(-ICON_INSET));
            }
            surface.fill_text(
                &((index + 1) % 10).to_string(),
                slot.x + 3.0,
                slot.y + 3.0,
                TextAlign::Left,
                SLOT_NUMBER_COLOR,
            );
        }
    }

    fn sync_with_inventory(&mut self, inventory: &Inventory) {
        self.refresh(inventory);
    }

    fn debug_name(&self) -> &str {
        "inventory_hud"
    }
}

#[cfg(test)]
mod tests {
    use keepsake_engine::{Engine, EngineConfig, HeadlessDriver, ItemAction, ItemDescription};

    use super::*;

    fn engine_with_hud() -> (Engine, HeadlessDriver) {
        let mut engine = Engine::new(EngineConfig::default());
        engine.add_game_object(InventoryHud::new(engine.inventory().capacity()));
        let driver = HeadlessDriver::new(16.0, engine.surface_size());
        (engine, driver)
    }

    #[test]
    fn strip_is_centered_along_the_bottom() {
        let mut hud = InventoryHud::new(10);
        hud.surface_size = (960, 540);
        let strip = hud.bounds();

        assert_eq!(strip.w, 10.0 * SLOT_SIZE + 9.0 * SLOT_GAP);
        assert!((strip.x + strip.w / 2.0 - 480.0).abs() < 1e-3);
        assert_eq!(strip.bottom(), 540.0 - BOTTOM_MARGIN);
    }

    #[test]
    fn held_items_are_drawn_in_slot_order() {
        let (mut engine, mut driver) = engine_with_hud();
        engine.add_to_inventory(ItemDescription::new("a", "icons/a", "A"));
        engine.add_to_inventory(ItemDescription::new("b", "icons/b", "B"));
        engine.start(0.0);

        driver.step(&mut engine);

        let icons: Vec<_> = driver.surface().image_keys().collect();
        assert_eq!(icons, vec!["icons/a", "icons/b"]);
    }

    #[test]
    fn clicking_a_filled_slot_uses_the_item() {
        let (mut engine, mut driver) = engine_with_hud();
        engine.add_to_inventory(
            ItemDescription::new("lamp", "icons/lamp", "A lamp.").with_on_use(ItemAction::Inspect),
        );
        engine.start(0.0);
        driver.step(&mut engine);

        let mut hud = InventoryHud::new(10);
        hud.surface_size = engine.surface_size();
        let slot = hud.slot_bounds(0).center();
        engine.pointer_move(slot.x, slot.y);
        engine.pointer_click(slot.x, slot.y);
        driver.step(&mut engine);

        assert_eq!(engine.dialogue_text(), Some("A lamp."));
    }
}
