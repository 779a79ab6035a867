use std::time::{Duration, Instant};

const FPS_SAMPLE_COUNT: usize = 60;

/// Timing snapshot handed to every `update` call for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GameTime {
    pub elapsed: Duration,
    pub total: Duration,
    pub frame: u64,
}

impl GameTime {
    pub fn from_elapsed(elapsed: Duration) -> Self {
        Self {
            elapsed,
            total: elapsed,
            frame: 0,
        }
    }

    pub fn elapsed_us(&self) -> u64 {
        self.elapsed.as_micros() as u64
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed.as_secs_f32()
    }
}

/// Variable-step frame clock with a cap on the per-frame delta and a rolling
/// FPS average for diagnostics.
pub struct FrameClock {
    pub max_elapsed: Duration,
    total: Duration,
    frame: u64,
    last_instant: Option<Instant>,
    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self {
            max_elapsed: Duration::from_millis(250),
            total: Duration::ZERO,
            frame: 0,
            last_instant: None,
            fps_samples: [1.0 / 60.0; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
            smoothed_fps: 60.0,
            smoothed_frame_time_ms: 16.667,
        }
    }

    /// Measure wall-clock time since the previous call. The first call
    /// reports a zero delta.
    pub fn tick(&mut self) -> GameTime {
        let now = Instant::now();
        let elapsed = self
            .last_instant
            .map(|last| now.duration_since(last))
            .unwrap_or(Duration::ZERO);
        self.last_instant = Some(now);
        self.advance(elapsed)
    }

    /// Advance by an explicit delta. Used by `tick` and by deterministic tests.
    pub fn advance(&mut self, elapsed: Duration) -> GameTime {
        let mut elapsed = elapsed;
        if elapsed > self.max_elapsed {
            log::warn!(
                "Frame took {:.1}ms, capping delta to {}ms",
                elapsed.as_secs_f64() * 1000.0,
                self.max_elapsed.as_millis()
            );
            elapsed = self.max_elapsed;
        }
        self.total += elapsed;
        self.frame += 1;

        self.fps_samples[self.fps_sample_index] = elapsed.as_secs_f64();
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };

        GameTime {
            elapsed,
            total: self.total,
            frame: self.frame,
        }
    }

    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn total(&self) -> Duration {
        self.total
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_accumulates_total_and_frames() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::from_millis(10));
        let t = clock.advance(Duration::from_millis(20));
        assert_eq!(t.elapsed, Duration::from_millis(20));
        assert_eq!(t.total, Duration::from_millis(30));
        assert_eq!(t.frame, 2);
        assert_eq!(clock.frame_count(), 2);
    }

    #[test]
    fn advance_caps_long_frames() {
        let mut clock = FrameClock::new();
        let t = clock.advance(Duration::from_secs(3));
        assert_eq!(t.elapsed, clock.max_elapsed);
        assert_eq!(clock.total(), clock.max_elapsed);
    }

    #[test]
    fn first_tick_reports_zero_delta() {
        let mut clock = FrameClock::new();
        let t = clock.tick();
        assert_eq!(t.elapsed, Duration::ZERO);
        assert_eq!(t.frame, 1);
    }

    #[test]
    fn smoothed_fps_converges_to_steady_rate() {
        let mut clock = FrameClock::new();
        for _ in 0..FPS_SAMPLE_COUNT {
            clock.advance(Duration::from_millis(20));
        }
        assert!((clock.smoothed_fps - 50.0).abs() < 0.01);
        assert!((clock.smoothed_frame_time_ms - 20.0).abs() < 0.01);
    }

    #[test]
    fn game_time_unit_helpers() {
        let t = GameTime::from_elapsed(Duration::from_millis(16));
        assert_eq!(t.elapsed_us(), 16_000);
        assert!((t.elapsed_secs() - 0.016).abs() < 1e-6);
    }
}
