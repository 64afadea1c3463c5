mod item;
mod player;
mod prop;

pub use item::Item;
pub use player::{direction_from_input, Player, DEFAULT_PLAYER_SPEED};
pub use prop::{Prop, PropLook};
