use std::cell::Cell;
use std::rc::Rc;

use keepsake_engine::{channels, Command, DeferredTask, Engine, Event, TaskOwner};
use tracing::{debug, info};

use super::catalog::Catalog;

/// Small grace period so the pickup dialogue is readable before the ending.
const COMPLETION_DELAY_MS: f64 = 1500.0;
/// Session-owned, so loading a save drops a pending check.
const COMPLETION_OWNER: TaskOwner = TaskOwner::Session;

/// Hooks the story beats onto the event bus.
pub(crate) fn install(engine: &mut Engine, catalog: &Catalog) {
    engine.subscribe(channels::ITEM_COLLECTED, |event, _| {
        if let Event::ItemCollected(item) = event {
            info!(item = %item.name, "item_collected");
        }
    });

    let key_item = catalog.key_item.clone();
    let unlocks = catalog.key_unlocks.clone();
    engine.subscribe(channels::ITEM_COLLECTED, move |event, commands| {
        if matches!(event, Event::ItemCollected(item) if item.name == key_item) {
            commands.push(Command::SetScene(unlocks.clone()));
        }
    });

    // The ending plays once. Each pickup replaces the pending check, so only
    // the latest one can fire, and it re-checks the inventory when it does.
    let ending_played = Rc::new(Cell::new(false));
    let ending = catalog.completion_cg.clone();
    let played = Rc::clone(&ending_played);
    engine.subscribe(channels::CG_PLAYED, move |event, _| {
        if matches!(event, Event::CgPlayed(payload) if *payload == ending) {
            played.set(true);
        }
    });

    let required = catalog.item_names();
    let ending = catalog.completion_cg.clone();
    engine.subscribe(channels::ITEM_COLLECTED, move |event, commands| {
        if !matches!(event, Event::ItemCollected(_)) {
            return;
        }
        if ending_played.get() {
            debug!("completion_check_skipped_already_played");
            return;
        }
        commands.cancel_tasks(COMPLETION_OWNER);
        commands.schedule(
            COMPLETION_DELAY_MS,
            COMPLETION_OWNER,
            DeferredTask::PresentWhenCollected {
                required: required.clone(),
                payload: ending.clone(),
            },
        );
    });

    engine.subscribe(channels::KEY_DOWN, |event, commands| {
        if let Event::KeyDown(code) = event {
            if let Some(slot) = inventory_slot_for_key(code) {
                commands.push(Command::UseItemAt(slot));
            }
        }
    });

    engine.subscribe(channels::CG_ENDED, |event, _| {
        if let Event::CgEnded(Some(payload)) = event {
            info!(image = %payload.image, "cg_ended");
        }
    });
}

/// `Digit1`..`Digit9` select inventory slots 0..8.
fn inventory_slot_for_key(code: &str) -> Option<usize> {
    let digit = code.strip_prefix("Digit")?.parse::<usize>().ok()?;
    (1..=9).contains(&digit).then(|| digit - 1)
}

#[cfg(test)]
mod tests {
    use keepsake_engine::{Bounds, EngineConfig, HeadlessDriver, ItemAction, ItemDescription};

    use super::*;
    use crate::app::rooms::{build_rooms, HALL, STUDY};

    fn wired_engine(catalog: &Catalog) -> Engine {
        let mut engine = Engine::new(EngineConfig {
            initial_scene: Some(HALL.to_string()),
            ..EngineConfig::default()
        });
        for room in build_rooms(catalog) {
            engine.add_scene(room);
        }
        install(&mut engine, catalog);
        engine
    }

    fn collected(catalog: &Catalog, index: usize) -> Event {
        Event::ItemCollected(catalog.items[index].item.clone())
    }

    fn click_at(engine: &mut Engine, driver: &mut HeadlessDriver, bounds: Bounds) {
        let center = bounds.center();
        engine.pointer_move(center.x, center.y);
        engine.pointer_click(center.x, center.y);
        driver.step(engine);
    }

    #[test]
    fn digit_keys_map_to_slots() {
        assert_eq!(inventory_slot_for_key("Digit1"), Some(0));
        assert_eq!(inventory_slot_for_key("Digit9"), Some(8));
        assert_eq!(inventory_slot_for_key("Digit0"), None);
        assert_eq!(inventory_slot_for_key("KeyD"), None);
    }

    #[test]
    fn key_item_opens_the_study() {
        let catalog = Catalog::builtin();
        let mut engine = wired_engine(&catalog);
        let mut driver = HeadlessDriver::new(16.0, (960, 540));
        engine.set_scene(HALL);
        engine.start(driver.now_ms());

        click_at(&mut engine, &mut driver, catalog.items[0].at.bounds());

        assert!(engine.inventory().has_item("brass_key"));
        assert_eq!(engine.active_scene_name(), Some(STUDY));
    }

    #[test]
    fn completion_cg_follows_the_last_pickup() {
        let catalog = Catalog::builtin();
        let mut engine = wired_engine(&catalog);
        let mut driver = HeadlessDriver::new(16.0, (960, 540));
        engine.set_scene(HALL);
        engine.start(driver.now_ms());

        click_at(&mut engine, &mut driver, catalog.items[0].at.bounds());
        driver.run_frames(&mut engine, 2);
        click_at(&mut engine, &mut driver, catalog.items[1].at.bounds());
        assert!(!engine.is_cg_playing());

        driver.advance(COMPLETION_DELAY_MS);
        driver.step(&mut engine);

        assert_eq!(engine.current_cg(), Some(&catalog.completion_cg));
    }

    #[test]
    fn digit_key_uses_held_item() {
        let catalog = Catalog::builtin();
        let mut engine = wired_engine(&catalog);
        engine.add_to_inventory(
            ItemDescription::new("lamp", "icons/lamp", "A lamp.").with_on_use(ItemAction::Inspect),
        );

        engine.key_down("Digit1");

        assert_eq!(engine.dialogue_text(), Some("A lamp."));
    }

    #[test]
    fn ending_plays_once_when_last_pickups_are_close_together() {
        let catalog = Catalog::builtin();
        let mut engine = wired_engine(&catalog);
        let plays = Rc::new(Cell::new(0));
        let counter = Rc::clone(&plays);
        engine.subscribe(channels::CG_PLAYED, move |_, _| counter.set(counter.get() + 1));
        let mut driver = HeadlessDriver::new(500.0, (960, 540));
        engine.set_scene(HALL);
        engine.start(driver.now_ms());
        for placed in &catalog.items {
            engine.add_to_inventory(placed.item.clone());
        }

        engine.publish(channels::ITEM_COLLECTED, collected(&catalog, 0));
        driver.run_frames(&mut engine, 2);
        engine.publish(channels::ITEM_COLLECTED, collected(&catalog, 1));

        driver.step(&mut engine);
        assert!(!engine.is_cg_playing(), "earlier check must not fire");
        driver.run_frames(&mut engine, 2);
        assert!(engine.is_cg_playing());
        assert_eq!(plays.get(), 1);

        engine.pointer_click(10.0, 10.0);
        driver.step(&mut engine);
        assert!(!engine.is_cg_playing());
        driver.run_frames(&mut engine, 4);

        assert!(!engine.is_cg_playing());
        assert_eq!(plays.get(), 1);
    }

    #[test]
    fn pickups_after_the_ending_schedule_nothing() {
        let catalog = Catalog::builtin();
        let mut engine = wired_engine(&catalog);
        engine.present_cg(catalog.completion_cg.clone());
        engine.dismiss_cg();
        let pending = engine.pending_task_count();

        engine.publish(channels::ITEM_COLLECTED, collected(&catalog, 0));

        assert_eq!(engine.pending_task_count(), pending);
    }
}
