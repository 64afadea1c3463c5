use std::process::ExitCode;

use keepsake_engine::app::DEFAULT_HEADLESS_FRAME_MS;
use keepsake_engine::{run_app, HeadlessDriver};
use tracing::{error, info};

use super::bootstrap::{AppWiring, RunMode};

pub(crate) fn run(app: AppWiring, mode: RunMode) -> ExitCode {
    match mode {
        RunMode::Windowed => {
            if let Err(err) = run_app(app.config, app.engine, app.session) {
                error!(error = %err, "startup_failed");
                return ExitCode::FAILURE;
            }
        }
        RunMode::Headless { frames } => run_headless(app, frames),
    }

    ExitCode::SUCCESS
}

fn run_headless(app: AppWiring, frames: u32) {
    let AppWiring {
        mut engine,
        mut session,
        ..
    } = app;
    let mut driver = HeadlessDriver::new(DEFAULT_HEADLESS_FRAME_MS, engine.surface_size());
    session.start_game(&mut engine, driver.now_ms());
    let ticked = driver.run_frames(&mut engine, frames);
    info!(
        frames_requested = frames,
        frames_ticked = ticked,
        clock_ms = engine.clock_ms(),
        scene = engine.active_scene_name().unwrap_or("<none>"),
        items = engine.inventory().len(),
        "headless_run_finished"
    );
    session.stop_game(&mut engine);
}
