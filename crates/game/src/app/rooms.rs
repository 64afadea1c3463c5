use keepsake_engine::{Background, Bounds, Item, Prop, Scene};
use tracing::{debug, warn};

use super::catalog::Catalog;

pub(crate) const HALL: &str = "hall";
pub(crate) const STUDY: &str = "study";

const HALL_FLOOR: [u8; 4] = [46, 38, 34, 255];
const STUDY_FLOOR: [u8; 4] = [30, 36, 48, 255];
const RUG_COLOR: [u8; 4] = [110, 40, 46, 255];
const DOOR_COLOR: [u8; 4] = [84, 58, 36, 255];
const SHELF_COLOR: [u8; 4] = [70, 52, 40, 255];
const DESK_COLOR: [u8; 4] = [96, 70, 48, 255];

/// Builds both rooms. Items are placed lazily by each room's init hook, so a
/// room nobody visits never allocates its items.
pub(crate) fn build_rooms(catalog: &Catalog) -> Vec<Scene> {
    for placed in &catalog.items {
        if placed.room != HALL && placed.room != STUDY {
            warn!(item = %placed.item.name, room = %placed.room, "catalog_item_room_unknown");
        }
    }
    vec![hall(catalog), study(catalog)]
}

fn hall(catalog: &Catalog) -> Scene {
    let items = items_for(catalog, HALL);
    Scene::new(HALL, Background::Color(HALL_FLOOR)).with_init(move |scene| {
        scene.add_entity(Prop::solid("rug", Bounds::new(300.0, 260.0, 360.0, 180.0), RUG_COLOR));
        scene.add_entity(
            Prop::solid("study_door", Bounds::new(860.0, 200.0, 60.0, 120.0), DOOR_COLOR).blocking(),
        );
        scene.add_entity(Prop::image("portrait", Bounds::new(420.0, 40.0, 120.0, 90.0), "props/portrait"));
        place_items(scene, items);
    })
}

fn study(catalog: &Catalog) -> Scene {
    let items = items_for(catalog, STUDY);
    Scene::new(STUDY, Background::Color(STUDY_FLOOR)).with_init(move |scene| {
        scene.add_entity(
            Prop::solid("bookshelf", Bounds::new(40.0, 60.0, 160.0, 320.0), SHELF_COLOR).blocking(),
        );
        scene.add_entity(
            Prop::solid("desk", Bounds::new(360.0, 300.0, 240.0, 100.0), DESK_COLOR).blocking(),
        );
        place_items(scene, items);
    })
}

fn items_for(catalog: &Catalog, room: &str) -> Vec<Item> {
    catalog
        .items_in(room)
        .map(|placed| Item::new(placed.item.clone(), placed.at.bounds()))
        .collect()
}

fn place_items(scene: &mut Scene, items: Vec<Item>) {
    let count = items.len();
    for item in items {
        scene.add_entity(item);
    }
    debug!(scene = scene.name(), item_count = count, "room_items_placed");
}

#[cfg(test)]
mod tests {
    use keepsake_engine::{Engine, EngineConfig, Entity};

    use super::*;

    #[test]
    fn rooms_fill_on_first_activation() {
        let catalog = Catalog::builtin();
        let mut engine = Engine::new(EngineConfig::default());
        for room in build_rooms(&catalog) {
            assert!(engine.add_scene(room));
        }

        assert_eq!(engine.scene(STUDY).expect("study").entity_count(), 0);
        assert!(engine.set_scene(STUDY));

        let study = engine.scene(STUDY).expect("study");
        let names: Vec<_> = study
            .entities()
            .iter()
            .map(|(_, entity)| entity.debug_name().to_string())
            .collect();
        assert_eq!(names, vec!["bookshelf", "desk", "letter"]);
    }

    #[test]
    fn held_items_are_hidden_when_a_room_first_opens() {
        let catalog = Catalog::builtin();
        let mut engine = Engine::new(EngineConfig::default());
        for room in build_rooms(&catalog) {
            engine.add_scene(room);
        }
        engine.restore_inventory(vec![catalog.items[1].item.clone()]);

        engine.set_scene(STUDY);

        let study = engine.scene(STUDY).expect("study");
        let letter_visible = study
            .entities()
            .iter()
            .find(|(_, entity)| entity.debug_name() == "letter")
            .map(|(_, entity)| entity.is_visible());
        assert_eq!(letter_visible, Some(false));
    }

    #[test]
    fn furniture_blocks_but_the_rug_does_not() {
        let catalog = Catalog::builtin();
        let mut engine = Engine::new(EngineConfig::default());
        for room in build_rooms(&catalog) {
            engine.add_scene(room);
        }
        engine.set_scene(HALL);
        engine.set_scene(STUDY);

        let hall = engine.scene(HALL).expect("hall").obstacles();
        let study = engine.scene(STUDY).expect("study").obstacles();
        assert_eq!(hall, vec![Bounds::new(860.0, 200.0, 60.0, 120.0)]);
        assert_eq!(study.len(), 2);
    }
}
