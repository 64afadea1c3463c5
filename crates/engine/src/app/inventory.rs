use serde::{Deserialize, Serialize};

pub const DEFAULT_INVENTORY_CAPACITY: usize = 10;

/// What happens when a held item is used from the inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemAction {
    #[default]
    None,
    /// Shows the item's text as dialogue.
    Inspect,
    /// Presents a full-surface CG using the item's text as caption.
    ShowCg { image: String },
}

/// Immutable record describing an item, shared by the world entity and the
/// inventory slot it ends up in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDescription {
    pub name: String,
    pub icon: String,
    pub text: String,
    #[serde(default)]
    pub on_use: ItemAction,
    #[serde(default)]
    pub dialogue: Option<String>,
    #[serde(default)]
    pub duration_ms: Option<u64>,
}

impl ItemDescription {
    pub fn new(name: impl Into<String>, icon: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: icon.into(),
            text: text.into(),
            on_use: ItemAction::None,
            dialogue: None,
            duration_ms: None,
        }
    }

    pub fn with_on_use(mut self, on_use: ItemAction) -> Self {
        self.on_use = on_use;
        self
    }

    pub fn with_dialogue(mut self, dialogue: impl Into<String>) -> Self {
        self.dialogue = Some(dialogue.into());
        self
    }

    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }
}

/// Bounded, insertion-ordered item list. Duplicates are allowed; callers that
/// care query [`Inventory::has_item`] first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inventory {
    items: Vec<ItemDescription>,
    capacity: usize,
}

impl Default for Inventory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_INVENTORY_CAPACITY)
    }
}

impl Inventory {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Appends the item unless the inventory is full.
    #[must_use]
    pub fn add_item(&mut self, item: ItemDescription) -> bool {
        if self.is_full() {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Removes the first item with `name`.
    pub fn remove_item(&mut self, name: &str) -> bool {
        match self.items.iter().position(|item| item.name == name) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn has_item(&self, name: &str) -> bool {
        self.items.iter().any(|item| item.name == name)
    }

    pub fn find(&self, name: &str) -> Option<&ItemDescription> {
        self.items.iter().find(|item| item.name == name)
    }

    /// Looks up the use action of a held item. Using an item never consumes it.
    pub fn use_item(&self, name: &str) -> Option<ItemAction> {
        self.find(name).map(|item| item.on_use.clone())
    }

    pub fn get(&self, index: usize) -> Option<&ItemDescription> {
        self.items.get(index)
    }

    pub fn items(&self) -> &[ItemDescription] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    /// Replaces the contents, dropping anything past capacity. Returns how
    /// many items were dropped.
    pub fn replace_all(&mut self, items: Vec<ItemDescription>) -> usize {
        let dropped = items.len().saturating_sub(self.capacity);
        self.items = items;
        self.items.truncate(self.capacity);
        dropped
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
