//! Process-local monotonic clock.

use tokio::time::Instant;

use crate::traits::Clock;

/// Milliseconds since the clock was created.
///
/// Backed by `tokio::time::Instant`, so it follows paused and advanced time
/// in `#[tokio::test(start_paused = true)]` tests the same way the timers do.
///
/// # Example
///
/// ```rust
/// use rs_departures::hal::MonotonicClock;
/// use rs_departures::traits::Clock;
///
/// let clock = MonotonicClock::new();
/// let start = clock.now_ms();
/// assert!(clock.now_ms() >= start);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose zero is now.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_ms(&self) -> u64 {
        u64::try_from(self.epoch.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn follows_paused_time() {
        let clock = MonotonicClock::new();
        assert_eq!(clock.now_ms(), 0);

        tokio::time::advance(Duration::from_millis(1_500)).await;
        assert_eq!(clock.now_ms(), 1_500);
    }
}
