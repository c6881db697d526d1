//! Wire types for the upstream monitor API and inbound host messages.
//!
//! The upstream response is nested `data → monitors → lines → departures`.
//! Only the fields the widget needs are modelled; unknown fields are ignored
//! and most known fields default when absent, so a sparse line still parses.
//! `departureTime.countdown` is the one required leaf.
//!
//! # Example
//!
//! ```
//! use rs_departures::messages::MonitorResponse;
//!
//! let json = r#"{
//!     "data": { "monitors": [ { "lines": [ {
//!         "name": "U1", "towards": "LEOPOLDAU", "platform": "1",
//!         "barrierFree": true, "type": "ptMetro",
//!         "departures": { "departure": [ { "departureTime": { "countdown": 3 } } ] }
//!     } ] } ] }
//! }"#;
//! let resp: MonitorResponse = serde_json::from_str(json).unwrap();
//! assert_eq!(resp.monitors().len(), 1);
//! ```

use serde::{Deserialize, Serialize};

use crate::Departure;

// ============================================================================
// Upstream response
// ============================================================================

/// Top-level monitor response.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorResponse {
    /// Payload; absent on some upstream error responses.
    #[serde(default)]
    pub data: Option<MonitorData>,
    /// Status message block.
    #[serde(default)]
    pub message: Option<ResponseMessage>,
}

impl MonitorResponse {
    /// Monitors in the response, empty when `data` or `monitors` is missing.
    pub fn monitors(&self) -> &[Monitor] {
        self.data
            .as_ref()
            .and_then(|d| d.monitors.as_deref())
            .unwrap_or(&[])
    }

    /// Flattens every line's departures into one list, soonest first.
    ///
    /// Each departure is tagged with its line's name, destination, platform,
    /// accessibility flag and vehicle type. The sort is stable, so equal
    /// countdowns keep upstream order.
    pub fn flatten(&self) -> Vec<Departure> {
        let mut departures: Vec<Departure> = self
            .monitors()
            .iter()
            .flat_map(|monitor| monitor.lines.iter())
            .flat_map(|line| {
                line.departures.departure.iter().map(move |entry| Departure {
                    line: line.name.clone(),
                    towards: line.towards.clone(),
                    countdown: entry.departure_time.countdown,
                    platform: line.platform.clone(),
                    barrier_free: line.barrier_free,
                    vehicle_type: line.vehicle_type.clone(),
                })
            })
            .collect();

        departures.sort_by_key(|d| d.countdown);
        departures
    }
}

/// `data` block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MonitorData {
    /// One monitor per platform matching the requested stop.
    #[serde(default)]
    pub monitors: Option<Vec<Monitor>>,
}

/// A monitored platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitor {
    /// Stop location, used for log context only.
    #[serde(default)]
    pub location_stop: Option<LocationStop>,
    /// Lines serving this platform.
    #[serde(default)]
    pub lines: Vec<Line>,
}

impl Monitor {
    /// Human-readable stop name, if present.
    pub fn stop_title(&self) -> Option<&str> {
        self.location_stop
            .as_ref()
            .and_then(|l| l.properties.as_ref())
            .map(|p| p.title.as_str())
    }
}

/// GeoJSON-ish stop location.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocationStop {
    /// Stop properties.
    #[serde(default)]
    pub properties: Option<StopProperties>,
}

/// Stop properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StopProperties {
    /// Display name of the stop.
    #[serde(default)]
    pub title: String,
    /// Municipality (usually "Wien").
    #[serde(default)]
    pub municipality: String,
}

/// A line serving a monitored platform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Line {
    /// Line code (e.g. "U1", "49", "26A", "N49").
    #[serde(default)]
    pub name: String,
    /// Destination of the line.
    #[serde(default)]
    pub towards: String,
    /// Platform label.
    #[serde(default)]
    pub platform: String,
    /// Wheelchair accessible.
    #[serde(default)]
    pub barrier_free: bool,
    /// Vehicle type (e.g. "ptMetro", "ptTram", "ptBusCity", "ptBusNight").
    #[serde(default, rename = "type")]
    pub vehicle_type: String,
    /// Upcoming departures.
    #[serde(default)]
    pub departures: LineDepartures,
}

/// Wrapper object around the departure list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LineDepartures {
    /// Departures in upstream order.
    #[serde(default)]
    pub departure: Vec<DepartureEntry>,
}

/// One departure entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureEntry {
    /// Timing information.
    pub departure_time: DepartureTime,
}

/// Departure timing. `countdown` is authoritative over the time strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartureTime {
    /// Minutes until departure.
    pub countdown: i64,
    /// Scheduled time, ISO 8601.
    #[serde(default)]
    pub time_planned: Option<String>,
    /// Real-time estimate, ISO 8601.
    #[serde(default)]
    pub time_real: Option<String>,
}

/// Upstream status message block.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMessage {
    /// Status text (e.g. "OK").
    #[serde(default)]
    pub value: String,
    /// Status code (1 = OK).
    #[serde(default)]
    pub message_code: i64,
    /// Server timestamp.
    #[serde(default)]
    pub server_time: String,
}

// ============================================================================
// Host messages
// ============================================================================

/// Message sent to the plugin from the host's settings panel.
///
/// ```json
/// {"event": "refreshNow"}
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum PluginMessage {
    /// Bypass the cache and refresh immediately.
    #[serde(rename = "refreshNow")]
    RefreshNow,
    /// Any other event; ignored.
    #[serde(other)]
    Unknown,
}

impl PluginMessage {
    /// Interprets an arbitrary JSON payload. Anything unrecognised is `Unknown`.
    pub fn from_value(payload: &serde_json::Value) -> Self {
        serde_json::from_value(payload.clone()).unwrap_or(Self::Unknown)
    }
}
