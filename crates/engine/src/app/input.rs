use std::collections::BTreeSet;

use super::Vec2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputAction {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
}

const ACTION_COUNT: usize = 4;

impl InputAction {
    pub const ALL: [InputAction; ACTION_COUNT] = [
        InputAction::MoveUp,
        InputAction::MoveDown,
        InputAction::MoveLeft,
        InputAction::MoveRight,
    ];

    /// Key codes bound to the action, named after physical keys ("KeyW", "ArrowUp").
    pub fn key_codes(self) -> &'static [&'static str] {
        match self {
            InputAction::MoveUp => &["KeyW", "ArrowUp"],
            InputAction::MoveDown => &["KeyS", "ArrowDown"],
            InputAction::MoveLeft => &["KeyA", "ArrowLeft"],
            InputAction::MoveRight => &["KeyD", "ArrowRight"],
        }
    }

    const fn index(self) -> usize {
        match self {
            InputAction::MoveUp => 0,
            InputAction::MoveDown => 1,
            InputAction::MoveLeft => 2,
            InputAction::MoveRight => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ActionStates {
    down: [bool; ACTION_COUNT],
}

impl ActionStates {
    pub(crate) fn set(&mut self, action: InputAction, is_down: bool) {
        self.down[action.index()] = is_down;
    }

    pub(crate) fn is_down(&self, action: InputAction) -> bool {
        self.down[action.index()]
    }

    fn from_keys(keys: &BTreeSet<String>) -> Self {
        let mut states = Self::default();
        for action in InputAction::ALL {
            let down = action
                .key_codes()
                .iter()
                .any(|code| keys.contains(*code));
            states.set(action, down);
        }
        states
    }
}

/// Live input state owned by the engine. Raw host events land here; entities
/// only ever see an [`InputSnapshot`].
#[derive(Debug, Default)]
pub(crate) struct InputState {
    pressed_keys: BTreeSet<String>,
    pointer: Vec2,
    clicked: bool,
}

impl InputState {
    /// Returns `true` only on the press edge; OS key repeat is ignored.
    pub(crate) fn key_down(&mut self, code: &str) -> bool {
        self.pressed_keys.insert(code.to_string())
    }

    pub(crate) fn key_up(&mut self, code: &str) -> bool {
        self.pressed_keys.remove(code)
    }

    pub(crate) fn is_key_down(&self, code: &str) -> bool {
        self.pressed_keys.contains(code)
    }

    /// Releases every held key and returns the codes, in sorted order.
    pub(crate) fn release_all(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pressed_keys).into_iter().collect()
    }

    pub(crate) fn set_pointer(&mut self, x: f32, y: f32) {
        self.pointer = Vec2 { x, y };
    }

    pub(crate) fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub(crate) fn click(&mut self) {
        self.clicked = true;
    }

    pub(crate) fn clicked(&self) -> bool {
        self.clicked
    }

    /// Drops the pending click so nothing downstream observes it this frame.
    pub(crate) fn consume_click(&mut self) -> bool {
        std::mem::take(&mut self.clicked)
    }

    pub(crate) fn snapshot(&self, surface_size: (u32, u32)) -> InputSnapshot {
        InputSnapshot {
            actions: ActionStates::from_keys(&self.pressed_keys),
            pressed_keys: self.pressed_keys.clone(),
            pointer: self.pointer,
            clicked: self.clicked,
            surface_width: surface_size.0,
            surface_height: surface_size.1,
        }
    }

    /// Click is a one-frame edge; cleared once the update that saw it finishes.
    pub(crate) fn end_update(&mut self) {
        self.clicked = false;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InputSnapshot {
    actions: ActionStates,
    pressed_keys: BTreeSet<String>,
    pointer: Vec2,
    clicked: bool,
    surface_width: u32,
    surface_height: u32,
}

impl InputSnapshot {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_down(&self, action: InputAction) -> bool {
        self.actions.is_down(action)
    }

    pub fn is_key_down(&self, code: &str) -> bool {
        self.pressed_keys.contains(code)
    }

    pub fn pointer(&self) -> Vec2 {
        self.pointer
    }

    pub fn clicked(&self) -> bool {
        self.clicked
    }

    pub fn surface_size(&self) -> (u32, u32) {
        (self.surface_width, self.surface_height)
    }

    pub fn with_key_down(mut self, code: &str) -> Self {
        self.pressed_keys.insert(code.to_string());
        self.actions = ActionStates::from_keys(&self.pressed_keys);
        self
    }

    pub fn with_pointer(mut self, x: f32, y: f32) -> Self {
        self.pointer = Vec2 { x, y };
        self
    }

    pub fn with_clicked(mut self, clicked: bool) -> Self {
        self.clicked = clicked;
        self
    }

    pub fn with_surface_size(mut self, surface_size: (u32, u32)) -> Self {
        self.surface_width = surface_size.0;
        self.surface_height = surface_size.1;
        self
    }
}
