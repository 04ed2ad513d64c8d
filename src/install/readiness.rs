//! Bounded polling with exponential backoff
//!
//! Used wherever the installer has to wait for something external to come
//! up (systemd reporting `active`, the server accepting connections).

use std::thread;
use std::time::{Duration, Instant};

use super::signals;

/// Poll schedule: start at `initial`, double up to `max`, give up after `deadline`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    pub initial: Duration,
    pub max: Duration,
    pub deadline: Duration,
}

impl Backoff {
    pub const fn new(initial: Duration, max: Duration, deadline: Duration) -> Self {
        Self {
            initial,
            max,
            deadline,
        }
    }

    /// Delay to wait after an attempt that waited `previous`.
    fn next_delay(&self, previous: Duration) -> Duration {
        previous.saturating_mul(2).min(self.max)
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(
            Duration::from_millis(500),
            Duration::from_secs(4),
            Duration::from_secs(30),
        )
    }
}

/// Call `probe` until it yields a value or the deadline passes.
///
/// The probe always runs at least once. Returns `None` on timeout or when
/// the process has been asked to stop.
pub fn poll_until<T>(backoff: &Backoff, mut probe: impl FnMut() -> Option<T>) -> Option<T> {
    let started = Instant::now();
    let mut delay = backoff.initial;
    let mut attempt = 1u32;

    loop {
        if let Some(value) = probe() {
            return Some(value);
        }
        let elapsed = started.elapsed();
        if elapsed >= backoff.deadline || signals::interrupted() {
            log::debug!("Gave up after {attempt} attempts ({:.1}s)", elapsed.as_secs_f64());
            return None;
        }
        let remaining = backoff.deadline - elapsed;
        thread::sleep(delay.min(remaining));
        delay = backoff.next_delay(delay);
        attempt += 1;
    }
}
