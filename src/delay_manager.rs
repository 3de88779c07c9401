use std::thread;
use std::time::{Duration, Instant};

use log::debug;
use rand::Rng;

/// A pause that starts counting when it is created. `wait` blocks until
/// at least the requested duration has passed since then.
#[derive(Debug, Clone, Copy)]
pub struct Delay {
    started: Instant,
    duration: Duration,
}

impl Delay {
    pub fn new(duration: Duration) -> Self {
        Delay {
            started: Instant::now(),
            duration,
        }
    }

    /// Fixed base plus a uniformly random extra in `0..=jitter_ms`.
    pub fn with_jitter(base_ms: u64, jitter_ms: u64) -> Self {
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=jitter_ms)
        };
        Delay::new(Duration::from_millis(base_ms + extra))
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.started.elapsed())
    }

    pub fn wait(self) {
        let left = self.remaining();
        if left.is_zero() {
            return;
        }
        debug!("Waiting for {} ms...", left.as_millis());
        thread::sleep(left);
    }
}

pub fn delay(ms: u64) -> Delay {
    Delay::new(Duration::from_millis(ms))
}

pub fn pause(ms: u64) {
    delay(ms).wait();
}
