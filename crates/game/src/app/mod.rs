pub(crate) mod bootstrap;
mod catalog;
mod hud;
pub(crate) mod loop_runner;
mod reactions;
mod rooms;
