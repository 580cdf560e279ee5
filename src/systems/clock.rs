//! Wall clock and frame pacing for the host driver

use std::time::{Duration, Instant};

/// Monotonic clock that also paces frames to a target rate
pub struct FrameClock {
    start: Instant,
    interval: Duration,
    next_frame: Instant,
}

impl FrameClock {
    /// Start the clock; `target_fps` of 0 is treated as 1
    pub fn new(target_fps: u32) -> Self {
        let start = Instant::now();
        let interval = Duration::from_secs_f64(1.0 / target_fps.max(1) as f64);
        Self {
            start,
            interval,
            next_frame: start + interval,
        }
    }

    /// Seconds since the clock started
    pub fn elapsed(&self) -> f64 {
        self.start.elapsed().as_secs_f64()
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until the next frame is due
    ///
    /// A host that falls behind skips ahead instead of trying to catch up.
    pub fn wait_for_next_frame(&mut self) {
        let now = Instant::now();
        if now < self.next_frame {
            std::thread::sleep(self.next_frame - now);
            self.next_frame += self.interval;
        } else {
            self.next_frame = now + self.interval;
        }
    }
}
