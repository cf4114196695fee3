use std::time::{Duration, Instant};

/// Fixed step used by [`Timer::single_step`] unless configured otherwise (30 Hz).
pub const DEFAULT_FIXED_STEP: Duration = Duration::from_nanos(1_000_000_000 / 30);

/// Largest unscaled delta a single update may report.
pub const DEFAULT_MAX_DELTA: Duration = Duration::from_millis(250);

/// Frame timing snapshot.
#[derive(Debug, Copy, Clone)]
pub struct FrameTime {
    /// Scaled seconds since the previous update.
    pub dt: f32,

    /// Accumulated scaled seconds.
    pub total: f64,

    /// Monotonic timestamp taken at the update.
    pub now: Instant,

    /// Monotonic frame counter.
    pub frame_index: u64,
}

/// High-resolution frame timer.
///
/// Delta time is scaled by `time_scale` and accumulated into `total`. Raw
/// elapsed time is clamped to `max_delta` first, so a debugger break or a
/// minimized window does not produce one enormous step.
#[derive(Debug, Clone)]
pub struct Timer {
    last: Instant,
    delta: f32,
    total: f64,
    time_scale: f32,
    paused: bool,
    fixed_step: Duration,
    max_delta: Duration,
    frame_index: u64,
}

impl Timer {
    pub fn new() -> Self {
        Self::with_start(0.0)
    }

    /// Creates a timer whose total time starts at `start_seconds`.
    pub fn with_start(start_seconds: f64) -> Self {
        Self {
            last: Instant::now(),
            delta: 0.0,
            total: start_seconds,
            time_scale: 1.0,
            paused: false,
            fixed_step: DEFAULT_FIXED_STEP,
            max_delta: DEFAULT_MAX_DELTA,
            frame_index: 0,
        }
    }

    /// Overrides the step used by [`single_step`](Self::single_step).
    pub fn with_fixed_step(mut self, step: Duration) -> Self {
        self.fixed_step = step;
        self
    }

    /// Overrides the raw delta clamp.
    pub fn with_max_delta(mut self, max_delta: Duration) -> Self {
        self.max_delta = max_delta;
        self
    }

    /// Advances using the current monotonic time.
    pub fn update(&mut self) -> FrameTime {
        self.update_at(Instant::now())
    }

    /// Advances to `now`.
    ///
    /// While paused the baseline follows `now` and the delta is zero, so
    /// resuming does not report the paused interval.
    pub fn update_at(&mut self, now: Instant) -> FrameTime {
        let elapsed = now.saturating_duration_since(self.last).min(self.max_delta);
        self.last = now;

        if self.paused {
            self.delta = 0.0;
        } else {
            self.delta = elapsed.as_secs_f32() * self.time_scale;
            self.total += self.delta as f64;
        }

        self.snapshot(now)
    }

    /// Advances by one fixed step (scaled), ignoring wall time.
    ///
    /// Does nothing but report a zero delta while paused.
    pub fn single_step(&mut self) -> FrameTime {
        if self.paused {
            self.delta = 0.0;
        } else {
            self.delta = self.fixed_step.as_secs_f32() * self.time_scale;
            self.total += self.delta as f64;
        }

        self.snapshot(self.last)
    }

    pub fn pause(&mut self) {
        if !self.paused {
            log::debug!("timer paused at {:.3}s", self.total);
        }
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Sets the delta multiplier; negative values are clamped to zero.
    pub fn set_time_scale(&mut self, scale: f32) {
        self.time_scale = if scale.is_finite() { scale.max(0.0) } else { 1.0 };
    }

    #[inline]
    pub fn time_scale(&self) -> f32 {
        self.time_scale
    }

    /// Scaled seconds reported by the last update or step.
    #[inline]
    pub fn delta_time(&self) -> f32 {
        self.delta
    }

    /// Accumulated scaled seconds.
    #[inline]
    pub fn total_time(&self) -> f64 {
        self.total
    }

    #[inline]
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// Resets the baseline to now and clears delta and total time.
    ///
    /// Useful after surface reconfigure events or when resuming from suspension.
    pub fn reset(&mut self) {
        self.last = Instant::now();
        self.delta = 0.0;
        self.total = 0.0;
    }

    fn snapshot(&mut self, now: Instant) -> FrameTime {
        let ft = FrameTime {
            dt: self.delta,
            total: self.total,
            now,
            frame_index: self.frame_index,
        };
        self.frame_index = self.frame_index.wrapping_add(1);
        ft
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-4
    }

    /// Timer with a known baseline so `update_at` is deterministic.
    fn timer_at(base: Instant) -> Timer {
        let mut t = Timer::new();
        t.last = base;
        t
    }

    #[test]
    fn update_accumulates_elapsed_time() {
        let base = Instant::now();
        let mut t = timer_at(base);

        let ft = t.update_at(base + Duration::from_millis(16));
        assert!(approx(ft.dt as f64, 0.016));

        t.update_at(base + Duration::from_millis(40));
        assert!(approx(t.delta_time() as f64, 0.024));
        assert!(approx(t.total_time(), 0.040));
    }

    #[test]
    fn time_scale_multiplies_delta() {
        let base = Instant::now();
        let mut t = timer_at(base);
        t.set_time_scale(0.5);

        t.update_at(base + Duration::from_millis(100));
        assert!(approx(t.delta_time() as f64, 0.05));
        assert!(approx(t.total_time(), 0.05));
    }

    #[test]
    fn negative_time_scale_is_clamped() {
        let mut t = Timer::new();
        t.set_time_scale(-2.0);
        assert_eq!(t.time_scale(), 0.0);
    }

    #[test]
    fn long_stall_is_clamped() {
        let base = Instant::now();
        let mut t = timer_at(base).with_max_delta(Duration::from_millis(100));

        t.update_at(base + Duration::from_secs(5));
        assert!(approx(t.delta_time() as f64, 0.1));
    }

    #[test]
    fn paused_timer_does_not_advance_or_jump_on_resume() {
        let base = Instant::now();
        let mut t = timer_at(base);
        t.update_at(base + Duration::from_millis(10));

        t.pause();
        let ft = t.update_at(base + Duration::from_millis(200));
        assert_eq!(ft.dt, 0.0);
        assert!(approx(t.total_time(), 0.010));

        t.resume();
        t.update_at(base + Duration::from_millis(216));
        assert!(approx(t.delta_time() as f64, 0.016));
        assert!(approx(t.total_time(), 0.026));
    }

    #[test]
    fn single_step_uses_fixed_step_and_scale() {
        let mut t = Timer::with_start(1.0);
        t.single_step();
        assert!(approx(t.delta_time() as f64, 1.0 / 30.0));
        assert!(approx(t.total_time(), 1.0 + 1.0 / 30.0));

        t.set_time_scale(2.0);
        t.single_step();
        assert!(approx(t.delta_time() as f64, 2.0 / 30.0));
    }

    #[test]
    fn single_step_is_ignored_while_paused() {
        let mut t = Timer::new();
        t.pause();
        t.single_step();
        assert_eq!(t.delta_time(), 0.0);
        assert_eq!(t.total_time(), 0.0);
    }

    #[test]
    fn frame_index_increments_per_snapshot() {
        let mut t = Timer::new();
        assert_eq!(t.single_step().frame_index, 0);
        assert_eq!(t.update().frame_index, 1);
        assert_eq!(t.frame_index(), 2);
    }

    #[test]
    fn reset_clears_accumulated_time() {
        let mut t = Timer::with_start(3.0).with_fixed_step(Duration::from_millis(500));
        t.single_step();
        t.reset();
        assert_eq!(t.total_time(), 0.0);
        assert_eq!(t.delta_time(), 0.0);
    }
}
