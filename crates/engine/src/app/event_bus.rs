use std::collections::HashMap;
use std::fmt;

use tracing::trace;

use super::commands::Commands;
use super::inventory::ItemDescription;
use super::overlay::CgPayload;
use super::Vec2;

/// Channel names other components rely on. Nothing stops a caller from using
/// its own channel names; these are conventions, not a registry.
pub mod channels {
    pub const ITEM_COLLECTED: &str = "itemCollected";
    pub const ITEM_USED: &str = "itemUsed";
    pub const INVENTORY_CHANGED: &str = "inventoryChanged";
    pub const CG_PLAYED: &str = "cgPlayed";
    pub const CG_ENDED: &str = "cgEnded";
    pub const DIALOGUE_SHOWN: &str = "dialogueShown";
    pub const KEY_DOWN: &str = "keyDown";
    pub const KEY_UP: &str = "keyUp";
    pub const POINTER_CLICK: &str = "pointerClick";
    pub const SCENE_CHANGED: &str = "sceneChanged";
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    ItemCollected(ItemDescription),
    ItemUsed(ItemDescription),
    InventoryChanged { len: usize, capacity: usize },
    CgPlayed(CgPayload),
    /// Carries the payload that was on screen when the slot was cleared.
    CgEnded(Option<CgPayload>),
    DialogueShown(String),
    KeyDown(String),
    KeyUp(String),
    PointerClick(Vec2),
    SceneChanged(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

type Handler = Box<dyn FnMut(&Event, &mut Commands)>;

struct Subscriber {
    id: SubscriptionId,
    handler: Handler,
}

/// Synchronous named-channel publish/subscribe.
///
/// Handlers run in subscription order on the caller's stack and receive the
/// command sink, which is how they react: they queue engine commands instead
/// of reaching back into the engine. Because `publish` holds `&mut self`, a
/// handler cannot subscribe or unsubscribe while its channel is firing.
#[derive(Default)]
pub struct EventBus {
    channels: HashMap<String, Vec<Subscriber>>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut counts: Vec<(&str, usize)> = self
            .channels
            .iter()
            .map(|(name, subscribers)| (name.as_str(), subscribers.len()))
            .collect();
        counts.sort_unstable();
        f.debug_struct("EventBus")
            .field("channels", &counts)
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, channel: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event, &mut Commands) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.channels
            .entry(channel.to_string())
            .or_default()
            .push(Subscriber {
                id,
                handler: Box::new(handler),
            });
        id
    }

    /// Removes the subscription if it is registered on `channel`.
    pub fn unsubscribe(&mut self, channel: &str, id: SubscriptionId) -> bool {
        let Some(subscribers) = self.channels.get_mut(channel) else {
            return false;
        };
        let Some(index) = subscribers.iter().position(|entry| entry.id == id) else {
            return false;
        };
        subscribers.remove(index);
        true
    }

    /// Invokes every handler on `channel` in subscription order and returns
    /// how many ran.
    pub fn publish(&mut self, channel: &str, event: &Event, commands: &mut Commands) -> usize {
        let Some(subscribers) = self.channels.get_mut(channel) else {
            trace!(channel, "bus_publish_no_subscribers");
            return 0;
        };
        for subscriber in subscribers.iter_mut() {
            (subscriber.handler)(event, commands);
        }
        subscribers.len()
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.channels.get(channel).map_or(0, Vec::len)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::app::commands::Command;

    fn key_event(code: &str) -> Event {
        Event::KeyDown(code.to_string())
    }

    #[test]
    fn publish_without_subscribers_is_noop() {
        let mut bus = EventBus::new();
        let mut commands = Commands::default();

        assert_eq!(bus.publish("nobody", &key_event("KeyA"), &mut commands), 0);
        assert!(commands.is_empty());
    }

    #[test]
    fn handlers_fire_in_subscription_order() {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for label in ["first", "second", "third"] {
            let log = Rc::clone(&log);
            bus.subscribe("tick", move |_, _| log.borrow_mut().push(label));
        }

        bus.publish("tick", &key_event("KeyA"), &mut Commands::default());
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn unsubscribed_handler_is_not_invoked() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(0u32));
        let counter = Rc::clone(&hits);
        let id = bus.subscribe("ping", move |_, _| *counter.borrow_mut() += 1);

        bus.publish("ping", &key_event("KeyA"), &mut Commands::default());
        assert!(bus.unsubscribe("ping", id));
        bus.publish("ping", &key_event("KeyA"), &mut Commands::default());

        assert_eq!(*hits.borrow(), 1);
        assert_eq!(bus.subscriber_count("ping"), 0);
    }

    #[test]
    fn unsubscribing_unknown_handler_is_noop() {
        let mut bus = EventBus::new();
        let id = bus.subscribe("a", |_, _| {});

        assert!(!bus.unsubscribe("b", id));
        assert!(!bus.unsubscribe("missing", id));
        assert!(bus.unsubscribe("a", id));
        assert!(!bus.unsubscribe("a", id));
    }

    #[test]
    fn unsubscribe_removes_only_the_matching_handler() {
        let mut bus = EventBus::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let ids: Vec<_> = ["a", "b", "c"]
            .into_iter()
            .map(|label| {
                let log = Rc::clone(&log);
                bus.subscribe("ch", move |_, _| log.borrow_mut().push(label))
            })
            .collect();

        bus.unsubscribe("ch", ids[1]);
        bus.publish("ch", &key_event("KeyA"), &mut Commands::default());
        assert_eq!(*log.borrow(), vec!["a", "c"]);
    }

    #[test]
    fn channels_are_isolated() {
        let mut bus = EventBus::new();
        let hits = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&hits);
        bus.subscribe(channels::KEY_DOWN, move |event, _| {
            sink.borrow_mut().push(event.clone())
        });

        bus.publish(channels::KEY_UP, &Event::KeyUp("KeyA".into()), &mut Commands::default());
        bus.publish(channels::KEY_DOWN, &key_event("KeyB"), &mut Commands::default());

        assert_eq!(*hits.borrow(), vec![key_event("KeyB")]);
    }

    #[test]
    fn handlers_react_through_command_sink() {
        let mut bus = EventBus::new();
        bus.subscribe(channels::KEY_DOWN, |event, commands| {
            if let Event::KeyDown(code) = event {
                commands.push(Command::ShowDialogue(format!("pressed {code}")));
            }
        });

        let mut commands = Commands::default();
        bus.publish(channels::KEY_DOWN, &key_event("KeyE"), &mut commands);

        assert_eq!(
            commands.pop(),
            Some(Command::ShowDialogue("pressed KeyE".to_string()))
        );
    }
}
