use tracing::{debug, info, trace, warn};

use super::commands::{Command, Commands};
use super::entity::{Entity, EntityId, EntityList, FrameContext};
use super::event_bus::{channels, Event, EventBus, SubscriptionId};
use super::input::InputState;
use super::inventory::{Inventory, ItemAction, ItemDescription, DEFAULT_INVENTORY_CAPACITY};
use super::overlay::{CgPayload, CgPresenter, DialogueBox};
use super::rendering::Surface;
use super::scene::{Scene, SceneMachine, SceneSwitch};
use super::timers::{DeferredTask, TaskHandle, TaskOwner, TaskScheduler};
use super::Vec2;

pub const DEFAULT_SURFACE_WIDTH: u32 = 960;
pub const DEFAULT_SURFACE_HEIGHT: u32 = 540;
pub const DEFAULT_DIALOGUE_DURATION_MS: u64 = 3000;
/// Upper bound on commands applied per drain. Handlers that keep re-queueing
/// work are cut off here instead of spinning forever.
const MAX_COMMANDS_PER_DRAIN: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub surface_width: u32,
    pub surface_height: u32,
    pub inventory_capacity: usize,
    pub dialogue_duration_ms: u64,
    /// Activated by the session on the first start if no scene is active.
    pub initial_scene: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            surface_width: DEFAULT_SURFACE_WIDTH,
            surface_height: DEFAULT_SURFACE_HEIGHT,
            inventory_capacity: DEFAULT_INVENTORY_CAPACITY,
            dialogue_duration_ms: DEFAULT_DIALOGUE_DURATION_MS,
            initial_scene: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Still running; the host should request another frame.
    Continue,
    Halted,
}

/// Owns the world and drives it one frame at a time.
///
/// The host feeds raw input through [`Engine::key_down`],
/// [`Engine::pointer_click`] and friends, then calls [`Engine::tick`] once
/// per frame with a monotonic timestamp. Entities and bus handlers never hold
/// a reference to the engine; they queue [`Command`]s that are applied after
/// they return.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    scenes: SceneMachine,
    globals: EntityList,
    input: InputState,
    bus: EventBus,
    inventory: Inventory,
    presenter: CgPresenter,
    dialogue: DialogueBox,
    tasks: TaskScheduler,
    commands: Commands,
    running: bool,
    last_time_ms: Option<f64>,
    clock_ms: f64,
    surface_size: (u32, u32),
    frame_count: u64,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Engine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            scenes: SceneMachine::default(),
            globals: EntityList::default(),
            input: InputState::default(),
            bus: EventBus::new(),
            inventory: Inventory::with_capacity(config.inventory_capacity),
            presenter: CgPresenter::default(),
            dialogue: DialogueBox::default(),
            tasks: TaskScheduler::default(),
            commands: Commands::default(),
            running: false,
            last_time_ms: None,
            clock_ms: 0.0,
            surface_size: (config.surface_width, config.surface_height),
            frame_count: 0,
            config,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    // Scenes and entities

    pub fn add_scene(&mut self, scene: Scene) -> bool {
        self.scenes.register(scene)
    }

    /// Activates `name`. Returns true only when the active scene changed.
    pub fn set_scene(&mut self, name: &str) -> bool {
        let changed = self.switch_scene(name);
        self.apply_commands();
        changed
    }

    pub fn active_scene_name(&self) -> Option<&str> {
        self.scenes.active_name()
    }

    pub fn active_scene(&self) -> Option<&Scene> {
        self.scenes.active()
    }

    pub fn scene(&self, name: &str) -> Option<&Scene> {
        self.scenes.get(name)
    }

    pub fn scene_mut(&mut self, name: &str) -> Option<&mut Scene> {
        self.scenes.get_mut(name)
    }

    pub fn has_scene(&self, name: &str) -> bool {
        self.scenes.contains(name)
    }

    /// Adds an entity that lives outside every scene (HUD and the like). It
    /// updates after the active scene and paints on top of it.
    pub fn add_game_object(&mut self, entity: impl Entity + 'static) -> EntityId {
        self.globals.add(Box::new(entity))
    }

    pub fn remove_game_object(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        self.globals.remove(id)
    }

    pub fn game_object_count(&self) -> usize {
        self.globals.len()
    }

    // Frame loop

    pub fn start(&mut self, now_ms: f64) {
        if self.running {
            return;
        }
        self.running = true;
        self.last_time_ms = Some(now_ms);
        // A click made while stopped must not land on the first frame.
        self.input.consume_click();
        info!(
            scene = self.scenes.active_name().unwrap_or("<none>"),
            "engine_started"
        );
    }

    /// Stops the loop and releases held keys, publishing `keyUp` for each.
    pub fn stop(&mut self) {
        self.stop_now();
        self.apply_commands();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// One frame: due tasks, update, render. A stopped engine does nothing.
    pub fn tick(&mut self, now_ms: f64, surface: &mut dyn Surface) -> TickOutcome {
        if !self.running {
            return TickOutcome::Halted;
        }
        let delta_ms = match self.last_time_ms {
            Some(last) if (now_ms - last).is_finite() => (now_ms - last).max(0.0),
            _ => 0.0,
        };
        self.last_time_ms = Some(now_ms);
        self.clock_ms += delta_ms;
        self.surface_size = surface.size();
        self.frame_count = self.frame_count.saturating_add(1);

        self.run_due_tasks();
        self.update(delta_ms);
        self.render(surface);

        if self.running {
            TickOutcome::Continue
        } else {
            TickOutcome::Halted
        }
    }

    pub fn update(&mut self, dt_ms: f64) {
        // The CG is modal for clicks: the click only dismisses it.
        if self.presenter.is_playing() && self.input.consume_click() {
            self.dismiss_current_cg();
        }

        let snapshot = self.input.snapshot(self.surface_size);
        let obstacles = self
            .scenes
            .active()
            .map(Scene::obstacles)
            .unwrap_or_default();
        {
            let mut ctx = FrameContext {
                input: &snapshot,
                obstacles: &obstacles,
                inventory: &mut self.inventory,
                commands: &mut self.commands,
            };
            if let Some(scene) = self.scenes.active_mut() {
                scene.update(dt_ms, &mut ctx);
            }
            self.globals.update_all(dt_ms, &mut ctx);
        }
        self.apply_commands();
        self.input.end_update();
    }

    pub fn render(&self, surface: &mut dyn Surface) {
        let full = surface.full_rect();
        surface.clear_rect(full);
        if let Some(scene) = self.scenes.active() {
            scene.render(surface);
        }
        self.globals.render_all(surface);
        self.dialogue.render(surface);
        self.presenter.render(surface);
    }

    pub fn clock_ms(&self) -> f64 {
        self.clock_ms
    }

    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    pub fn surface_size(&self) -> (u32, u32) {
        self.surface_size
    }

    pub fn set_surface_size(&mut self, width: u32, height: u32) {
        self.surface_size = (width, height);
    }

    // Input

    pub fn key_down(&mut self, code: &str) {
        if self.input.key_down(code) {
            self.emit(channels::KEY_DOWN, Event::KeyDown(code.to_string()));
            self.apply_commands();
        }
    }

    pub fn key_up(&mut self, code: &str) {
        if self.input.key_up(code) {
            self.emit(channels::KEY_UP, Event::KeyUp(code.to_string()));
            self.apply_commands();
        }
    }

    pub fn is_key_down(&self, code: &str) -> bool {
        self.input.is_key_down(code)
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) {
        self.input.set_pointer(x, y);
    }

    /// Moves the pointer and raises the click edge for the next update.
    pub fn pointer_click(&mut self, x: f32, y: f32) {
        self.input.set_pointer(x, y);
        self.input.click();
        self.emit(channels::POINTER_CLICK, Event::PointerClick(Vec2::new(x, y)));
        self.apply_commands();
    }

    pub fn pointer(&self) -> Vec2 {
        self.input.pointer()
    }

    pub fn click_pending(&self) -> bool {
        self.input.clicked()
    }

    // Event bus

    pub fn subscribe<F>(&mut self, channel: &str, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event, &mut Commands) + 'static,
    {
        self.bus.subscribe(channel, handler)
    }

    pub fn unsubscribe(&mut self, channel: &str, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(channel, id)
    }

    /// Publishes and then applies whatever the handlers queued.
    pub fn publish(&mut self, channel: &str, event: Event) -> usize {
        let invoked = self.emit(channel, event);
        self.apply_commands();
        invoked
    }

    pub fn subscriber_count(&self, channel: &str) -> usize {
        self.bus.subscriber_count(channel)
    }

    // Inventory

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn add_to_inventory(&mut self, item: ItemDescription) -> bool {
        if !self.inventory.add_item(item) {
            return false;
        }
        self.emit_inventory_changed();
        self.apply_commands();
        true
    }

    pub fn remove_from_inventory(&mut self, name: &str) -> bool {
        if !self.inventory.remove_item(name) {
            return false;
        }
        self.emit_inventory_changed();
        self.apply_commands();
        true
    }

    /// Replaces the inventory wholesale and marks every world item whose name
    /// is now held as collected, in every scene. Returns how many items did
    /// not fit.
    pub fn restore_inventory(&mut self, items: Vec<ItemDescription>) -> usize {
        let dropped = self.inventory.replace_all(items);
        if dropped > 0 {
            warn!(dropped, capacity = self.inventory.capacity(), "inventory_restore_truncated");
        }
        self.scenes.sync_with_inventory(&self.inventory);
        self.globals.sync_with_inventory(&self.inventory);
        self.emit_inventory_changed();
        self.apply_commands();
        dropped
    }

    pub fn use_item(&mut self, name: &str) -> bool {
        let used = self.use_item_now(name);
        self.apply_commands();
        used
    }

    pub fn use_item_at(&mut self, index: usize) -> bool {
        let used = self.use_item_at_now(index);
        self.apply_commands();
        used
    }

    // Overlays

    /// Returns false when another CG is already on screen.
    pub fn present_cg(&mut self, payload: CgPayload) -> bool {
        let presented = self.present_cg_now(payload);
        self.apply_commands();
        presented
    }

    pub fn dismiss_cg(&mut self) -> Option<CgPayload> {
        let dismissed = self.dismiss_current_cg();
        self.apply_commands();
        dismissed
    }

    pub fn is_cg_playing(&self) -> bool {
        self.presenter.is_playing()
    }

    pub fn current_cg(&self) -> Option<&CgPayload> {
        self.presenter.current()
    }

    pub fn show_dialogue(&mut self, text: impl Into<String>) {
        self.show_dialogue_now(text.into());
        self.apply_commands();
    }

    pub fn dialogue_text(&self) -> Option<&str> {
        self.dialogue.current()
    }

    pub fn dialogue_duration_ms(&self) -> u64 {
        self.config.dialogue_duration_ms
    }

    pub fn set_dialogue_duration_ms(&mut self, duration_ms: u64) {
        self.config.dialogue_duration_ms = duration_ms;
    }

    // Deferred tasks

    pub fn schedule(&mut self, delay_ms: f64, owner: TaskOwner, task: DeferredTask) -> TaskHandle {
        self.tasks.schedule(self.clock_ms, delay_ms, owner, task)
    }

    pub fn cancel_task(&mut self, handle: TaskHandle) -> bool {
        self.tasks.cancel(handle)
    }

    pub fn cancel_tasks_owned_by(&mut self, owner: &TaskOwner) -> usize {
        self.tasks.cancel_owned_by(owner)
    }

    pub fn pending_task_count(&self) -> usize {
        self.tasks.pending_count()
    }

    // Internals. None of these drain the command queue; the public wrappers
    // above and `apply_commands` itself do.

    fn emit(&mut self, channel: &str, event: Event) -> usize {
        self.bus.publish(channel, &event, &mut self.commands)
    }

    fn emit_inventory_changed(&mut self) {
        let event = Event::InventoryChanged {
            len: self.inventory.len(),
            capacity: self.inventory.capacity(),
        };
        self.emit(channels::INVENTORY_CHANGED, event);
    }

    fn stop_now(&mut self) {
        if !self.running {
            return;
        }
        self.running = false;
        for code in self.input.release_all() {
            self.emit(channels::KEY_UP, Event::KeyUp(code));
        }
        info!(frame_count = self.frame_count, "engine_stopped");
    }

    fn apply_commands(&mut self) {
        let mut applied = 0usize;
        while let Some(command) = self.commands.pop() {
            if applied >= MAX_COMMANDS_PER_DRAIN {
                warn!(
                    dropped = self.commands.len() + 1,
                    limit = MAX_COMMANDS_PER_DRAIN,
                    "command_drain_limit_reached"
                );
                self.commands.clear();
                break;
            }
            applied += 1;
            self.apply_command(command);
        }
    }

    fn apply_command(&mut self, command: Command) {
        trace!(?command, "command_apply");
        match command {
            Command::Publish { channel, event } => {
                self.emit(&channel, event);
            }
            Command::ShowDialogue(text) => self.show_dialogue_now(text),
            Command::PresentCg(payload) => {
                self.present_cg_now(payload);
            }
            Command::DismissCg => {
                self.dismiss_current_cg();
            }
            Command::Schedule {
                delay_ms,
                owner,
                task,
            } => {
                self.tasks.schedule(self.clock_ms, delay_ms, owner, task);
            }
            Command::CancelTasks(owner) => {
                let cancelled = self.tasks.cancel_owned_by(&owner);
                debug!(?owner, cancelled, "deferred_tasks_cancelled");
            }
            Command::SetScene(name) => {
                self.switch_scene(&name);
            }
            Command::UseItem(name) => {
                self.use_item_now(&name);
            }
            Command::UseItemAt(index) => {
                self.use_item_at_now(index);
            }
            Command::Stop => self.stop_now(),
        }
    }

    fn switch_scene(&mut self, name: &str) -> bool {
        match self.scenes.switch_to(name) {
            SceneSwitch::Activated => {
                if let Some(scene) = self.scenes.get_mut(name) {
                    scene.sync_with_inventory(&self.inventory);
                }
                self.emit(channels::SCENE_CHANGED, Event::SceneChanged(name.to_string()));
                true
            }
            SceneSwitch::AlreadyActive | SceneSwitch::Unknown => false,
        }
    }

    fn present_cg_now(&mut self, payload: CgPayload) -> bool {
        let Some(id) = self.presenter.present(payload.clone()) else {
            debug!(image = %payload.image, "cg_present_rejected_busy");
            return false;
        };
        info!(image = %payload.image, duration_ms = ?payload.duration_ms, "cg_presented");
        if let Some(duration_ms) = payload.duration_ms {
            self.tasks.schedule(
                self.clock_ms,
                duration_ms as f64,
                TaskOwner::Engine,
                DeferredTask::DismissCg(id),
            );
        }
        self.emit(channels::CG_PLAYED, Event::CgPlayed(payload));
        true
    }

    fn dismiss_current_cg(&mut self) -> Option<CgPayload> {
        let payload = self.presenter.dismiss()?;
        self.announce_cg_ended(payload.clone());
        Some(payload)
    }

    fn announce_cg_ended(&mut self, payload: CgPayload) {
        info!(image = %payload.image, "cg_dismissed");
        self.emit(channels::CG_ENDED, Event::CgEnded(Some(payload)));
    }

    fn show_dialogue_now(&mut self, text: String) {
        let id = self.dialogue.show(text.clone());
        self.tasks.schedule(
            self.clock_ms,
            self.config.dialogue_duration_ms as f64,
            TaskOwner::Engine,
            DeferredTask::DismissDialogue(id),
        );
        self.emit(channels::DIALOGUE_SHOWN, Event::DialogueShown(text));
    }

    fn use_item_now(&mut self, name: &str) -> bool {
        let (Some(action), Some(item)) = (self.inventory.use_item(name), self.inventory.find(name).cloned())
        else {
            debug!(item = name, "item_use_not_held");
            return false;
        };
        match action {
            ItemAction::None => {}
            ItemAction::Inspect => self.show_dialogue_now(item.text.clone()),
            ItemAction::ShowCg { image } => {
                let mut payload = CgPayload::new(image).with_text(item.text.clone());
                if let Some(duration_ms) = item.duration_ms {
                    payload = payload.with_duration_ms(duration_ms);
                }
                self.present_cg_now(payload);
            }
        }
        debug!(item = name, "item_used");
        self.emit(channels::ITEM_USED, Event::ItemUsed(item));
        true
    }

    fn use_item_at_now(&mut self, index: usize) -> bool {
        let Some(name) = self.inventory.get(index).map(|item| item.name.clone()) else {
            debug!(index, "item_use_empty_slot");
            return false;
        };
        self.use_item_now(&name)
    }

    fn run_due_tasks(&mut self) {
        for (handle, task) in self.tasks.take_due(self.clock_ms) {
            trace!(?handle, ?task, "deferred_task_due");
            match task {
                DeferredTask::DismissCg(id) => {
                    if let Some(payload) = self.presenter.dismiss_if_current(id) {
                        self.announce_cg_ended(payload);
                    }
                }
                DeferredTask::DismissDialogue(id) => {
                    self.dialogue.clear_if_current(id);
                }
                DeferredTask::PresentWhenCollected { required, payload } => {
                    let missing = required
                        .iter()
                        .filter(|name| !self.inventory.has_item(name))
                        .count();
                    if missing == 0 {
                        self.present_cg_now(payload);
                    } else {
                        debug!(image = %payload.image, missing, "deferred_cg_skipped");
                    }
                }
                DeferredTask::ShowDialogue(text) => self.show_dialogue_now(text),
            }
        }
        self.apply_commands();
    }
}
