use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use pixels::{Error as PixelsError, Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::{debug, info, warn};
use winit::dpi::LogicalSize;
use winit::error::{EventLoopError, OsError};
use winit::event::{ElementState, Event, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::WindowBuilder;

use crate::persistence::{BlobStore, Session};
use crate::StartupError;

use super::engine::{Engine, TickOutcome};
use super::metrics::{FrameStats, FrameStatsAccumulator};
use super::rendering::{PixelSurface, Rgba, SpriteCache, Surface, TextAlign, TEXT_LINE_HEIGHT};

const PAUSE_SHADE: Rgba = [0, 0, 0, 150];
const BANNER_COLOR: Rgba = [240, 240, 240, 255];
const STATS_COLOR: Rgba = [120, 255, 120, 255];

#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub window_title: String,
    pub window_width: u32,
    pub window_height: u32,
    pub metrics_log_interval: Duration,
    /// Root for `<key>.png` image lookups. `None` draws placeholders.
    pub sprite_dir: Option<PathBuf>,
    pub show_stats: bool,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            window_title: "Keepsake".to_string(),
            window_width: 960,
            window_height: 540,
            metrics_log_interval: Duration::from_secs(1),
            sprite_dir: None,
            show_stats: false,
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("event loop failed: {0}")]
    EventLoopRun(#[source] EventLoopError),
}

/// Menu-level keys the host handles itself instead of forwarding to the
/// engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostAction {
    StartOrResume,
    Pause,
    Save,
    Load,
    Quit,
}

/// Opens a window and runs the engine in it until the window closes or the
/// quit key is pressed. The engine starts paused; Enter starts it.
///
/// A frame is requested only while the engine is running, so a paused game
/// sits idle until input arrives.
pub fn run_app<S>(config: LoopConfig, mut engine: Engine, mut session: Session<S>) -> Result<(), AppError>
where
    S: BlobStore + 'static,
{
    let event_loop = EventLoop::new().map_err(AppError::CreateEventLoop)?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window_title.clone())
            .with_inner_size(LogicalSize::new(
                config.window_width as f64,
                config.window_height as f64,
            ))
            .build(&event_loop)
            .map_err(AppError::CreateWindow)?,
    );

    let (buffer_width, buffer_height) = engine.surface_size();
    let mut pixels = {
        let size = window.inner_size();
        let texture = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        Pixels::new(buffer_width, buffer_height, texture).map_err(AppError::CreateRenderer)?
    };
    let mut sprites = match &config.sprite_dir {
        Some(dir) => SpriteCache::new(dir),
        None => SpriteCache::default(),
    };

    info!(
        buffer_width,
        buffer_height,
        window_width = config.window_width,
        window_height = config.window_height,
        metrics_log_interval_ms = config.metrics_log_interval.as_millis() as u64,
        sprite_dir = ?config.sprite_dir,
        "loop_config"
    );

    let origin = Instant::now();
    let mut last_frame_ms: Option<f64> = None;
    let mut frame_stats =
        FrameStatsAccumulator::new(config.metrics_log_interval.as_secs_f64() * 1000.0);
    let show_stats = config.show_stats;

    event_loop.set_control_flow(ControlFlow::Wait);
    window.request_redraw();

    event_loop
        .run(move |event, window_target| match event {
            Event::WindowEvent { window_id, event } if window_id == window.id() => match event {
                WindowEvent::CloseRequested => {
                    info!(reason = "window_close", "shutdown_requested");
                    window_target.exit();
                }
                WindowEvent::Resized(size) => {
                    if size.width > 0 && size.height > 0 {
                        if let Err(error) = pixels.resize_surface(size.width, size.height) {
                            warn!(error = %error, "renderer_resize_failed");
                            window_target.exit();
                        }
                    }
                    window.request_redraw();
                }
                WindowEvent::CursorMoved { position, .. } => {
                    let (x, y) = pixels
                        .window_pos_to_pixel((position.x as f32, position.y as f32))
                        .unwrap_or_else(|outside| pixels.clamp_pixel_pos(outside));
                    engine.pointer_move(x as f32, y as f32);
                }
                WindowEvent::MouseInput {
                    state: ElementState::Pressed,
                    button: MouseButton::Left,
                    ..
                } => {
                    if forwards_gameplay_input(engine.is_running(), ElementState::Pressed) {
                        let pointer = engine.pointer();
                        engine.pointer_click(pointer.x, pointer.y);
                    }
                }
                WindowEvent::KeyboardInput { event, .. } => {
                    let PhysicalKey::Code(code) = event.physical_key else {
                        return;
                    };
                    if let Some(action) = host_action(code) {
                        if event.state == ElementState::Pressed && !event.repeat {
                            let now_ms = elapsed_ms(origin);
                            if !apply_host_action(action, &mut engine, &mut session, now_ms) {
                                window_target.exit();
                            }
                            window.request_redraw();
                        }
                        return;
                    }
                    if !forwards_gameplay_input(engine.is_running(), event.state) {
                        return;
                    }
                    let name = key_code_name(code);
                    match event.state {
                        ElementState::Pressed => engine.key_down(&name),
                        ElementState::Released => engine.key_up(&name),
                    }
                }
                WindowEvent::RedrawRequested => {
                    let now_ms = elapsed_ms(origin);
                    let outcome = {
                        let mut surface = PixelSurface::new(
                            pixels.frame_mut(),
                            buffer_width,
                            buffer_height,
                            &mut sprites,
                        );
                        let outcome = if engine.is_running() {
                            engine.tick(now_ms, &mut surface)
                        } else {
                            engine.render(&mut surface);
                            TickOutcome::Halted
                        };
                        let stats = if show_stats { frame_stats.last() } else { None };
                        draw_host_overlay(&mut surface, !engine.is_running(), stats);
                        outcome
                    };
                    if let Err(error) = pixels.render() {
                        warn!(error = %error, "renderer_draw_failed");
                        window_target.exit();
                    }

                    if outcome == TickOutcome::Continue {
                        let delta_ms = last_frame_ms.map_or(0.0, |last| (now_ms - last).max(0.0));
                        last_frame_ms = Some(now_ms);
                        frame_stats.record_frame(now_ms, delta_ms);
                        if let Some(stats) = frame_stats.maybe_snapshot(now_ms) {
                            info!(
                                fps = stats.fps,
                                mean_frame_ms = stats.mean_frame_ms,
                                max_frame_ms = stats.max_frame_ms,
                                scene = engine.active_scene_name().unwrap_or("<none>"),
                                items = engine.inventory().len(),
                                "loop_metrics"
                            );
                        }
                    } else {
                        // Time spent paused is not a frame.
                        last_frame_ms = None;
                        frame_stats.reset();
                    }
                }
                _ => {}
            },
            Event::AboutToWait => {
                if engine.is_running() {
                    window.request_redraw();
                }
            }
            Event::LoopExiting => {
                engine.stop();
                info!("shutdown");
            }
            _ => {}
        })
        .map_err(AppError::EventLoopRun)
}

fn elapsed_ms(origin: Instant) -> f64 {
    origin.elapsed().as_secs_f64() * 1000.0
}

/// Engine key codes are winit's `KeyCode` names (`"KeyW"`, `"ArrowUp"`).
fn key_code_name(code: KeyCode) -> String {
    format!("{code:?}")
}

/// Gameplay presses and clicks are dropped while paused; releases always
/// pass so held-key state stays consistent.
fn forwards_gameplay_input(engine_running: bool, state: ElementState) -> bool {
    engine_running || state == ElementState::Released
}

fn host_action(code: KeyCode) -> Option<HostAction> {
    match code {
        KeyCode::Enter | KeyCode::NumpadEnter => Some(HostAction::StartOrResume),
        KeyCode::Escape => Some(HostAction::Pause),
        KeyCode::F5 => Some(HostAction::Save),
        KeyCode::F9 => Some(HostAction::Load),
        KeyCode::KeyQ => Some(HostAction::Quit),
        _ => None,
    }
}

/// Returns false when the host should exit.
fn apply_host_action<S: BlobStore>(
    action: HostAction,
    engine: &mut Engine,
    session: &mut Session<S>,
    now_ms: f64,
) -> bool {
    match action {
        HostAction::StartOrResume => {
            if !engine.is_running() {
                session.start_game(engine, now_ms);
            }
        }
        HostAction::Pause => session.stop_game(engine),
        HostAction::Save => {
            if let Err(error) = session.save(engine) {
                warn!(error = %error, "save_failed");
            }
        }
        HostAction::Load => {
            if !session.load(engine) {
                debug!("load_found_no_snapshot");
            }
        }
        HostAction::Quit => {
            info!(reason = "quit_key", "shutdown_requested");
            return false;
        }
    }
    true
}

fn draw_host_overlay(surface: &mut dyn Surface, paused: bool, stats: Option<FrameStats>) {
    let (width, height) = surface.size();
    if paused {
        let full = surface.full_rect();
        surface.fill_rect(full, PAUSE_SHADE);
        let center_x = width as f32 / 2.0;
        let center_y = height as f32 / 2.0;
        surface.fill_text(
            "PAUSED",
            center_x,
            center_y - TEXT_LINE_HEIGHT * 2.0,
            TextAlign::Center,
            BANNER_COLOR,
        );
        surface.fill_text(
            "ENTER TO PLAY  F5 SAVE  F9 LOAD  Q QUIT",
            center_x,
            center_y,
            TextAlign::Center,
            BANNER_COLOR,
        );
    }
    if let Some(stats) = stats {
        let line = format!("{:.0} FPS {:.1} MS", stats.fps, stats.mean_frame_ms);
        surface.fill_text(&line, 4.0, 4.0, TextAlign::Left, STATS_COLOR);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::rendering::RecordingSurface;
    use crate::app::{Background, EngineConfig, ItemDescription, Scene};
    use crate::persistence::{MemoryBlobStore, INVENTORY_KEY};

    fn engine() -> Engine {
        let mut engine = Engine::new(EngineConfig {
            initial_scene: Some("hall".into()),
            ..EngineConfig::default()
        });
        engine.add_scene(Scene::new("hall", Background::default()));
        engine
    }

    #[test]
    fn key_names_match_engine_key_codes() {
        assert_eq!(key_code_name(KeyCode::KeyW), "KeyW");
        assert_eq!(key_code_name(KeyCode::ArrowUp), "ArrowUp");
        assert_eq!(key_code_name(KeyCode::Digit3), "Digit3");
    }

    #[test]
    fn paused_engine_only_receives_releases() {
        assert!(forwards_gameplay_input(true, ElementState::Pressed));
        assert!(forwards_gameplay_input(true, ElementState::Released));
        assert!(!forwards_gameplay_input(false, ElementState::Pressed));
        assert!(forwards_gameplay_input(false, ElementState::Released));
    }

    #[test]
    fn menu_keys_map_to_host_actions() {
        assert_eq!(host_action(KeyCode::Enter), Some(HostAction::StartOrResume));
        assert_eq!(host_action(KeyCode::Escape), Some(HostAction::Pause));
        assert_eq!(host_action(KeyCode::F5), Some(HostAction::Save));
        assert_eq!(host_action(KeyCode::F9), Some(HostAction::Load));
        assert_eq!(host_action(KeyCode::KeyQ), Some(HostAction::Quit));
        assert_eq!(host_action(KeyCode::KeyW), None);
    }

    #[test]
    fn start_pause_and_quit_drive_the_session() {
        let mut engine = engine();
        let mut session = Session::new(MemoryBlobStore::new());

        assert!(apply_host_action(HostAction::StartOrResume, &mut engine, &mut session, 0.0));
        assert!(engine.is_running());
        assert_eq!(engine.active_scene_name(), Some("hall"));

        assert!(apply_host_action(HostAction::Pause, &mut engine, &mut session, 5.0));
        assert!(!engine.is_running());

        assert!(!apply_host_action(HostAction::Quit, &mut engine, &mut session, 6.0));
    }

    #[test]
    fn save_and_load_keys_round_trip_inventory() {
        let mut engine = engine();
        let mut session = Session::new(MemoryBlobStore::new());
        assert!(engine.add_to_inventory(ItemDescription::new("lamp", "icons/lamp", "A lamp")));

        apply_host_action(HostAction::Save, &mut engine, &mut session, 0.0);
        assert!(session.store().get(INVENTORY_KEY).is_some());

        let mut fresh = self::engine();
        apply_host_action(HostAction::Load, &mut fresh, &mut session, 0.0);
        assert!(fresh.inventory().has_item("lamp"));
    }

    #[test]
    fn paused_overlay_draws_banner_and_optional_stats() {
        let mut surface = RecordingSurface::new(320, 180);
        draw_host_overlay(&mut surface, true, None);
        assert!(surface.texts().any(|text| text == "PAUSED"));

        let mut surface = RecordingSurface::new(320, 180);
        let stats = FrameStats {
            fps: 60.0,
            mean_frame_ms: 16.7,
            max_frame_ms: 20.0,
            frames: 60,
        };
        draw_host_overlay(&mut surface, false, Some(stats));
        let texts: Vec<_> = surface.texts().collect();
        assert_eq!(texts, vec!["60 FPS 16.7 MS"]);
    }
}
