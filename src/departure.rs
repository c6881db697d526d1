//! Departure data model.
//!
//! A [`Departure`] is one upcoming vehicle at a stop, flattened out of the
//! nested upstream response. A [`StopSnapshot`] is the client's cache entry
//! for a stop: the full countdown-sorted list plus the time it was fetched.
//!
//! Both types are immutable once produced. A refresh replaces a snapshot
//! instead of editing it.

use serde::{Deserialize, Serialize};

/// A single upcoming departure.
///
/// # Example
///
/// ```rust
/// use rs_departures::Departure;
///
/// let dep = Departure::new("U1", "LEOPOLDAU", 3);
/// assert_eq!(dep.line, "U1");
/// assert!(!dep.is_due());
///
/// let due = Departure::new("26A", "KAGRAN", 0);
/// assert!(due.is_due());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Departure {
    /// Line code (e.g. "U1", "26A", "N49").
    pub line: String,
    /// Destination as reported upstream (usually upper case).
    pub towards: String,
    /// Minutes until departure. Zero or negative means now/overdue.
    pub countdown: i64,
    /// Platform label (e.g. "1", "Steig 2").
    pub platform: String,
    /// Wheelchair accessible vehicle.
    pub barrier_free: bool,
    /// Upstream vehicle type (e.g. "ptMetro", "ptTram", "ptBusCity").
    pub vehicle_type: String,
}

impl Departure {
    /// Creates a departure with empty platform and vehicle type.
    ///
    /// Mostly useful for tests and fixtures; the client fills every field.
    pub fn new(line: impl Into<String>, towards: impl Into<String>, countdown: i64) -> Self {
        Self {
            line: line.into(),
            towards: towards.into(),
            countdown,
            platform: String::new(),
            barrier_free: false,
            vehicle_type: String::new(),
        }
    }

    /// Set the platform label
    pub fn with_platform(mut self, platform: impl Into<String>) -> Self {
        self.platform = platform.into();
        self
    }

    /// Set the accessibility flag
    pub fn with_barrier_free(mut self, barrier_free: bool) -> Self {
        self.barrier_free = barrier_free;
        self
    }

    /// Set the vehicle type
    pub fn with_vehicle_type(mut self, vehicle_type: impl Into<String>) -> Self {
        self.vehicle_type = vehicle_type.into();
        self
    }

    /// True when the vehicle is departing now or is overdue.
    pub fn is_due(&self) -> bool {
        self.countdown <= 0
    }
}

/// Cached departures for one stop.
///
/// `departures` is sorted ascending by countdown, ties kept in the order
/// the upstream response listed them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StopSnapshot {
    /// Stop identifier (RBL number).
    pub stop_id: i64,
    /// All departures for the stop, soonest first.
    pub departures: Vec<Departure>,
    /// Clock time the snapshot was fetched, in milliseconds.
    pub fetched_at_ms: u64,
}

impl StopSnapshot {
    /// Age of the snapshot at `now_ms`.
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.fetched_at_ms)
    }

    /// Whether the snapshot is still usable for the given time-to-live.
    pub fn is_fresh(&self, now_ms: u64, ttl_ms: u64) -> bool {
        self.age_ms(now_ms) < ttl_ms
    }

    /// The first `limit` departures.
    pub fn take(&self, limit: usize) -> Vec<Departure> {
        self.departures.iter().take(limit).cloned().collect()
    }
}
