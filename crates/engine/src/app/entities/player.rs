use std::f32::consts::FRAC_1_SQRT_2;

use crate::app::collision::is_colliding;
use crate::app::entity::{Entity, FrameContext};
use crate::app::input::{InputAction, InputSnapshot};
use crate::app::rendering::{Rgba, Surface};
use crate::app::{Bounds, Vec2};

pub const DEFAULT_PLAYER_SPEED: f32 = 200.0;
const PLAYER_COLOR: Rgba = [222, 184, 92, 255];

/// Keyboard-driven avatar. Speed is in surface pixels per second.
#[derive(Debug, Clone)]
pub struct Player {
    position: Vec2,
    size: Vec2,
    direction: Vec2,
    speed: f32,
    sprite: Option<String>,
    visible: bool,
}

impl Player {
    pub fn new(position: Vec2, size: Vec2, speed: f32) -> Self {
        Self {
            position,
            size: Vec2::new(size.x.max(0.0), size.y.max(0.0)),
            direction: Vec2::ZERO,
            speed,
            sprite: None,
            visible: true,
        }
    }

    pub fn with_sprite(mut self, sprite: impl Into<String>) -> Self {
        self.sprite = Some(sprite.into());
        self
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn speed(&self) -> f32 {
        self.speed
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    /// Integrates one step. `dx`/`dy` are clamped to [-1, 1]; when both are
    /// non-zero they are scaled by 1/sqrt(2) so diagonals are not faster.
    pub fn integrate(&mut self, dx: f32, dy: f32, dt_ms: f64, surface_size: (u32, u32)) {
        self.integrate_blocked(dx, dy, dt_ms, surface_size, &[]);
    }

    /// Like [`Player::integrate`], but each axis is moved separately and a
    /// step that would newly overlap an obstacle is dropped, so the player
    /// slides along walls. Obstacles already overlapped never block.
    pub fn integrate_blocked(
        &mut self,
        dx: f32,
        dy: f32,
        dt_ms: f64,
        surface_size: (u32, u32),
        obstacles: &[Bounds],
    ) {
        self.direction = normalized_direction(dx, dy);
        let seconds = (dt_ms.max(0.0) / 1000.0) as f32;
        let step_x = self.direction.x * self.speed * seconds;
        let step_y = self.direction.y * self.speed * seconds;

        let next = Vec2::new(self.position.x + step_x, self.position.y);
        let next = self.clamped(next, surface_size);
        if !self.blocked_towards(next, obstacles) {
            self.position = next;
        }
        let next = Vec2::new(self.position.x, self.position.y + step_y);
        let next = self.clamped(next, surface_size);
        if !self.blocked_towards(next, obstacles) {
            self.position = next;
        }
    }

    /// Tests the whole swept area so a large step cannot tunnel through.
    fn blocked_towards(&self, next: Vec2, obstacles: &[Bounds]) -> bool {
        let before = self.bounds();
        let after = Bounds::from_position_size(next, self.size);
        let swept = Bounds::new(
            before.x.min(after.x),
            before.y.min(after.y),
            before.right().max(after.right()) - before.x.min(after.x),
            before.bottom().max(after.bottom()) - before.y.min(after.y),
        );
        obstacles
            .iter()
            .any(|obstacle| is_colliding(&swept, obstacle) && !is_colliding(&before, obstacle))
    }

    fn clamped(&self, position: Vec2, (width, height): (u32, u32)) -> Vec2 {
        let max_x = (width as f32 - self.size.x).max(0.0);
        let max_y = (height as f32 - self.size.y).max(0.0);
        Vec2::new(clamp_finite(position.x, max_x), clamp_finite(position.y, max_y))
    }
}

impl Entity for Player {
    fn bounds(&self) -> Bounds {
        Bounds::from_position_size(self.position, self.size)
    }

    fn is_visible(&self) -> bool {
        self.visible
    }

    fn update(&mut self, dt_ms: f64, ctx: &mut FrameContext<'_>) {
        let (dx, dy) = direction_from_input(ctx.input);
        self.integrate_blocked(dx, dy, dt_ms, ctx.input.surface_size(), ctx.obstacles);
    }

    fn render(&self, surface: &mut dyn Surface) {
        match self.sprite.as_deref() {
            Some(sprite) => surface.draw_image(sprite, self.bounds()),
            None => surface.fill_rect(self.bounds(), PLAYER_COLOR),
        }
    }

    fn debug_name(&self) -> &str {
        "player"
    }
}

/// Surface coordinates grow downward, so "up" is negative y.
pub fn direction_from_input(input: &InputSnapshot) -> (f32, f32) {
    let axis = |negative: InputAction, positive: InputAction| {
        let mut value = 0.0;
        if input.is_down(negative) {
            value -= 1.0;
        }
        if input.is_down(positive) {
            value += 1.0;
        }
        value
    };
    (
        axis(InputAction::MoveLeft, InputAction::MoveRight),
        axis(InputAction::MoveUp, InputAction::MoveDown),
    )
}

fn normalized_direction(dx: f32, dy: f32) -> Vec2 {
    let dx = sanitize_axis(dx);
    let dy = sanitize_axis(dy);
    if dx != 0.0 && dy != 0.0 {
        Vec2::new(dx * FRAC_1_SQRT_2, dy * FRAC_1_SQRT_2)
    } else {
        Vec2::new(dx, dy)
    }
}

fn sanitize_axis(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

fn clamp_finite(value: f32, max: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, max)
    } else {
        0.0
    }
}
