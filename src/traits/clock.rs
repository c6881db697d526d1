//! Time source abstraction.
//!
//! The cache TTL and the progress bar both measure elapsed time. Routing
//! every read through [`Clock`] lets tests drive time by hand with
//! [`MockClock`](crate::hal::MockClock), or use tokio's paused time through
//! [`MonotonicClock`](crate::hal::MonotonicClock).

/// Monotonic time source.
///
/// # Example
///
/// ```rust
/// use rs_departures::traits::Clock;
/// use rs_departures::hal::MockClock;
///
/// let clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.advance(100);
/// assert_eq!(clock.now_ms(), 100);
/// ```
pub trait Clock: Send + Sync {
    /// Returns current time in milliseconds since an arbitrary epoch.
    ///
    /// Must be monotonically increasing.
    fn now_ms(&self) -> u64;

    /// Milliseconds elapsed since `earlier_ms`, zero if the clock is behind it.
    fn elapsed_since(&self, earlier_ms: u64) -> u64 {
        self.now_ms().saturating_sub(earlier_ms)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }
}
