use std::time::{Duration, Instant};

/// Monotonic clock reporting time elapsed since the presentation started.
///
/// State machines in this crate take `now: Duration` rather than reading a
/// clock themselves, so tests can drive them with simulated time.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    origin: Instant,
}

impl Clock {
    pub fn start() -> Self {
        Self {
            origin: Instant::now(),
        }
    }

    pub fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::start()
    }
}

/// Normalised progress of `elapsed` through `total`, clamped to `[0, 1]`.
pub fn progress(elapsed: Duration, total: Duration) -> f64 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f64() / total.as_secs_f64()).clamp(0.0, 1.0)
}

/// CSS-style `ease` approximation used by every decorative animation.
pub fn ease_out(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}
