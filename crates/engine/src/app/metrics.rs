/// Aggregated frame timing over one reporting interval.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FrameStats {
    pub fps: f32,
    pub mean_frame_ms: f32,
    pub max_frame_ms: f32,
    pub frames: u32,
}

/// Collects frame deltas against host timestamps in milliseconds, so the
/// same accumulator serves the windowed loop and headless runs.
#[derive(Debug)]
pub struct FrameStatsAccumulator {
    interval_ms: f64,
    interval_start_ms: Option<f64>,
    frames: u32,
    delta_sum_ms: f64,
    delta_max_ms: f64,
    last: Option<FrameStats>,
}

impl FrameStatsAccumulator {
    pub fn new(interval_ms: f64) -> Self {
        Self {
            interval_ms: interval_ms.max(1.0),
            interval_start_ms: None,
            frames: 0,
            delta_sum_ms: 0.0,
            delta_max_ms: 0.0,
            last: None,
        }
    }

    pub fn record_frame(&mut self, now_ms: f64, delta_ms: f64) {
        if self.interval_start_ms.is_none() {
            self.interval_start_ms = Some(now_ms);
        }
        let delta_ms = delta_ms.max(0.0);
        self.frames = self.frames.saturating_add(1);
        self.delta_sum_ms += delta_ms;
        self.delta_max_ms = self.delta_max_ms.max(delta_ms);
    }

    /// Closes the interval once it has elapsed and returns its stats.
    pub fn maybe_snapshot(&mut self, now_ms: f64) -> Option<FrameStats> {
        let start = self.interval_start_ms?;
        let elapsed_ms = now_ms - start;
        if elapsed_ms < self.interval_ms {
            return None;
        }

        let mean_frame_ms = if self.frames == 0 {
            0.0
        } else {
            self.delta_sum_ms / f64::from(self.frames)
        };
        let stats = FrameStats {
            fps: (f64::from(self.frames) * 1000.0 / elapsed_ms.max(f64::EPSILON)) as f32,
            mean_frame_ms: mean_frame_ms as f32,
            max_frame_ms: self.delta_max_ms as f32,
            frames: self.frames,
        };

        self.interval_start_ms = Some(now_ms);
        self.frames = 0;
        self.delta_sum_ms = 0.0;
        self.delta_max_ms = 0.0;
        self.last = Some(stats);
        Some(stats)
    }

    /// Most recent closed interval, for on-screen display.
    pub fn last(&self) -> Option<FrameStats> {
        self.last
    }

    /// Forgets the open interval. Used when the loop resumes after a pause so
    /// the paused time does not count as one long frame.
    pub fn reset(&mut self) {
        self.interval_start_ms = None;
        self.frames = 0;
        self.delta_sum_ms = 0.0;
        self.delta_max_ms = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_computes_expected_values() {
        let mut stats = FrameStatsAccumulator::new(1000.0);
        stats.record_frame(0.0, 10.0);
        stats.record_frame(500.0, 30.0);

        let snapshot = stats.maybe_snapshot(1000.0).expect("interval elapsed");

        assert_eq!(snapshot.frames, 2);
        assert!((snapshot.fps - 2.0).abs() < 0.001);
        assert!((snapshot.mean_frame_ms - 20.0).abs() < 0.001);
        assert!((snapshot.max_frame_ms - 30.0).abs() < 0.001);
        assert_eq!(stats.last(), Some(snapshot));
    }

    #[test]
    fn snapshot_not_emitted_before_interval() {
        let mut stats = FrameStatsAccumulator::new(1000.0);
        assert!(stats.maybe_snapshot(5000.0).is_none());

        stats.record_frame(100.0, 16.0);
        assert!(stats.maybe_snapshot(600.0).is_none());
    }

    #[test]
    fn reset_discards_open_interval() {
        let mut stats = FrameStatsAccumulator::new(1000.0);
        stats.record_frame(0.0, 16.0);
        stats.reset();
        stats.record_frame(10_000.0, 16.0);

        assert!(stats.maybe_snapshot(10_500.0).is_none());
        let snapshot = stats.maybe_snapshot(11_000.0).expect("interval elapsed");
        assert_eq!(snapshot.frames, 1);
    }
}
