use tracing::debug;

use super::engine::{Engine, TickOutcome};
use super::metrics::{FrameStats, FrameStatsAccumulator};
use super::rendering::RecordingSurface;

pub const DEFAULT_HEADLESS_FRAME_MS: f64 = 1000.0 / 60.0;

/// Drives an engine without a window, feeding it evenly spaced synthetic
/// timestamps and a recording surface.
#[derive(Debug)]
pub struct HeadlessDriver {
    frame_ms: f64,
    now_ms: f64,
    surface: RecordingSurface,
    stats: FrameStatsAccumulator,
}

impl HeadlessDriver {
    pub fn new(frame_ms: f64, surface_size: (u32, u32)) -> Self {
        let frame_ms = if frame_ms.is_finite() && frame_ms > 0.0 {
            frame_ms
        } else {
            DEFAULT_HEADLESS_FRAME_MS
        };
        Self {
            frame_ms,
            now_ms: 0.0,
            surface: RecordingSurface::new(surface_size.0, surface_size.1),
            stats: FrameStatsAccumulator::new(1000.0),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.now_ms
    }

    pub fn frame_ms(&self) -> f64 {
        self.frame_ms
    }

    /// Draw calls of the most recent frame.
    pub fn surface(&self) -> &RecordingSurface {
        &self.surface
    }

    pub fn last_stats(&self) -> Option<FrameStats> {
        self.stats.last()
    }

    /// Moves the synthetic clock without ticking, as if the host stalled.
    pub fn advance(&mut self, ms: f64) {
        if ms.is_finite() && ms > 0.0 {
            self.now_ms += ms;
        }
    }

    pub fn step(&mut self, engine: &mut Engine) -> TickOutcome {
        self.now_ms += self.frame_ms;
        self.surface.take_commands();
        let was_running = engine.is_running();
        let outcome = engine.tick(self.now_ms, &mut self.surface);
        if was_running {
            self.stats.record_frame(self.now_ms, self.frame_ms);
            if let Some(stats) = self.stats.maybe_snapshot(self.now_ms) {
                debug!(fps = stats.fps, frames = stats.frames, "headless_metrics");
            }
        }
        outcome
    }

    /// Ticks up to `frames` times, stopping early once the engine halts.
    /// Returns how many ticks reported `Continue`.
    pub fn run_frames(&mut self, engine: &mut Engine, frames: u32) -> u32 {
        let mut continued = 0;
        for _ in 0..frames {
            if self.step(engine) == TickOutcome::Halted {
                break;
            }
            continued += 1;
        }
        continued
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::{Command, EngineConfig, Event};

    #[test]
    fn stopped_engine_halts_immediately() {
        let mut engine = Engine::default();
        let mut driver = HeadlessDriver::new(16.0, (320, 180));

        assert_eq!(driver.run_frames(&mut engine, 10), 0);
        assert!(driver.surface().commands().is_empty());
    }

    #[test]
    fn running_engine_advances_by_frame_interval() {
        let mut engine = Engine::new(EngineConfig::default());
        let mut driver = HeadlessDriver::new(20.0, (320, 180));
        engine.start(driver.now_ms());

        assert_eq!(driver.run_frames(&mut engine, 5), 5);
        assert_eq!(engine.frame_count(), 5);
        assert!((engine.clock_ms() - 100.0).abs() < 1e-9);
        assert!(!driver.surface().commands().is_empty());
    }

    #[test]
    fn stop_from_handler_ends_run_early() {
        let mut engine = Engine::default();
        engine.subscribe("halt", |_, commands| commands.push(Command::Stop));
        let mut driver = HeadlessDriver::new(16.0, (320, 180));
        engine.start(0.0);
        assert_eq!(driver.run_frames(&mut engine, 2), 2);

        engine.publish("halt", Event::SceneChanged("x".into()));

        assert_eq!(driver.run_frames(&mut engine, 10), 0);
        assert!(!engine.is_running());
    }

    #[test]
    fn invalid_frame_interval_uses_default() {
        let driver = HeadlessDriver::new(f64::NAN, (1, 1));
        assert_eq!(driver.frame_ms(), DEFAULT_HEADLESS_FRAME_MS);
    }
}
