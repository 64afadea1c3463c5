mod collision;
mod commands;
mod engine;
mod entities;
mod entity;
mod event_bus;
mod headless;
mod input;
mod inventory;
mod loop_runner;
mod metrics;
mod overlay;
mod rendering;
mod scene;
mod timers;

pub use collision::{contains_point, is_colliding, Bounds};
pub use commands::{Command, Commands};
pub use engine::{
    Engine, EngineConfig, TickOutcome, DEFAULT_DIALOGUE_DURATION_MS, DEFAULT_SURFACE_HEIGHT,
    DEFAULT_SURFACE_WIDTH,
};
pub use entities::{direction_from_input, Item, Player, Prop, PropLook, DEFAULT_PLAYER_SPEED};
pub use entity::{Entity, EntityId, FrameContext, Vec2};
pub use event_bus::{channels, Event, EventBus, SubscriptionId};
pub use headless::{HeadlessDriver, DEFAULT_HEADLESS_FRAME_MS};
pub use input::{InputAction, InputSnapshot};
pub use inventory::{Inventory, ItemAction, ItemDescription, DEFAULT_INVENTORY_CAPACITY};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use metrics::{FrameStats, FrameStatsAccumulator};
pub use overlay::{CgPayload, CgPresenter, DialogueBox, DialogueId, PresentationId};
pub use rendering::{
    text_width, DrawCommand, LoadedSprite, PixelSurface, RecordingSurface, Rgba, SpriteCache,
    Surface, TextAlign, TEXT_LINE_HEIGHT, TEXT_SCALE,
};
pub use scene::{Background, Scene, SceneSwitch, DEFAULT_BACKGROUND};
pub use timers::{DeferredTask, TaskHandle, TaskOwner, TaskScheduler};
