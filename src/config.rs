//! Configuration: per-widget settings from the host and process-wide config.
//!
//! Two layers:
//!
//! - [`WidgetSettings`] arrives from the host for each widget (camelCase JSON,
//!   every field optional). Accessors apply defaults and floors.
//! - [`Config`] is process-wide (upstream URL, cache TTL, timer cadence, web
//!   host port). Builder-style setters for code, [`Config::load`] for
//!   `DEPARTURES_`-prefixed environment variables.
//!
//! # Example
//!
//! ```rust
//! use rs_departures::config::{Config, MonitorConfig, UpstreamConfig, WebConfig};
//!
//! // Use defaults
//! let config = Config::default();
//! assert_eq!(config.upstream.cache_ttl_ms, 30_000);
//!
//! // Or customize
//! let config = Config::default()
//!     .with_upstream(UpstreamConfig::default().with_cache_ttl_ms(10_000))
//!     .with_web(WebConfig::default().with_port(3000));
//! assert_eq!(config.web.port, 3000);
//! ```

use std::time::Duration;

use figment::providers::{Env, Serialized};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::selector::{LineFilter, SelectionConfig};

/// Default background color.
pub const DEFAULT_BACKGROUND_COLOR: &str = "#000000";
/// Default text color.
pub const DEFAULT_TEXT_COLOR: &str = "#d0cd08";
/// Default progress bar color.
pub const DEFAULT_PROGRESS_BAR_COLOR: &str = "#525003";

/// Environment variable prefix read by [`Config::load`].
pub const ENV_PREFIX: &str = "DEPARTURES_";

/// Default refresh interval ceiling, one day.
pub const MAX_REFRESH_SECS: u64 = 86_400;

// ============================================================================
// Main Config
// ============================================================================

/// Complete application configuration
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Upstream API configuration
    #[serde(default)]
    pub upstream: UpstreamConfig,
    /// Widget timer configuration
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Web host configuration
    #[serde(default)]
    pub web: WebConfig,
}

impl Config {
    /// Defaults layered under `DEPARTURES_*` environment variables.
    ///
    /// Nested keys use a double underscore, e.g.
    /// `DEPARTURES_UPSTREAM__CACHE_TTL_MS=15000`.
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load configuration from defaults and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    /// Set upstream configuration
    pub fn with_upstream(mut self, upstream: UpstreamConfig) -> Self {
        self.upstream = upstream;
        self
    }

    /// Set monitor configuration
    pub fn with_monitor(mut self, monitor: MonitorConfig) -> Self {
        self.monitor = monitor;
        self
    }

    /// Set web configuration
    pub fn with_web(mut self, web: WebConfig) -> Self {
        self.web = web;
        self
    }
}

// ============================================================================
// Upstream Config
// ============================================================================

/// Upstream API configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Monitor endpoint; the stop is appended as `?rbl=<id>`
    pub base_url: String,
    /// How long a fetched stop stays cached, in milliseconds
    pub cache_ttl_ms: u64,
    /// Request timeout in milliseconds (transport-level, not a retry)
    pub request_timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.wienerlinien.at/ogd_realtime/monitor".into(),
            cache_ttl_ms: 30_000,
            request_timeout_ms: 10_000,
        }
    }
}

impl UpstreamConfig {
    /// Set the endpoint URL
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the cache time-to-live
    pub fn with_cache_ttl_ms(mut self, ms: u64) -> Self {
        self.cache_ttl_ms = ms;
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout_ms(mut self, ms: u64) -> Self {
        self.request_timeout_ms = ms;
        self
    }

    /// Request timeout as a `Duration`
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

// ============================================================================
// Monitor Config
// ============================================================================

/// Widget timer configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Refresh interval used when a widget doesn't set one, in seconds
    pub default_refresh_secs: f64,
    /// Lower bound for any widget's refresh interval, in seconds
    pub min_refresh_secs: f64,
    /// Upper bound for any widget's refresh interval, in seconds
    pub max_refresh_secs: f64,
    /// Progress bar re-render cadence in milliseconds
    pub progress_tick_ms: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            default_refresh_secs: 30.0,
            min_refresh_secs: 10.0,
            max_refresh_secs: MAX_REFRESH_SECS as f64,
            progress_tick_ms: 100,
        }
    }
}

impl MonitorConfig {
    /// Set the default refresh interval
    pub fn with_default_refresh_secs(mut self, secs: f64) -> Self {
        self.default_refresh_secs = secs;
        self
    }

    /// Set the refresh interval floor
    pub fn with_min_refresh_secs(mut self, secs: f64) -> Self {
        self.min_refresh_secs = secs;
        self
    }

    /// Set the refresh interval ceiling
    pub fn with_max_refresh_secs(mut self, secs: f64) -> Self {
        self.max_refresh_secs = secs;
        self
    }

    /// Set the progress tick cadence
    pub fn with_progress_tick_ms(mut self, ms: u64) -> Self {
        self.progress_tick_ms = ms.max(1);
        self
    }

    /// Progress tick cadence as a `Duration`
    pub fn progress_tick(&self) -> Duration {
        Duration::from_millis(self.progress_tick_ms.max(1))
    }
}

// ============================================================================
// Web Config
// ============================================================================

/// Web host configuration
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WebConfig {
    /// Port to listen on
    pub port: u16,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_permissive: true,
        }
    }
}

impl WebConfig {
    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Set CORS mode
    pub fn with_cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }
}

// ============================================================================
// Widget Settings
// ============================================================================

/// Settings the host stores for one widget.
///
/// Field names match the host's JSON:
///
/// ```json
/// {
///   "rbl": "4111",
///   "lineFilter": "U1, 26A",
///   "refreshInterval": 30,
///   "showTwoDepartures": true,
///   "showProgressBar": true,
///   "backgroundColor": "#000000",
///   "textColor": "#d0cd08",
///   "progressBarColor": "#525003"
/// }
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WidgetSettings {
    /// Stop identifier (RBL number) as entered by the user
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rbl: Option<String>,
    /// Comma-separated line codes to keep
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_filter: Option<String>,
    /// Refresh interval in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_interval: Option<f64>,
    /// Show a second departure of the same line
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_two_departures: Option<bool>,
    /// Show the refresh progress bar
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show_progress_bar: Option<bool>,
    /// Background color as hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub background_color: Option<String>,
    /// Text color as hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    /// Progress bar color as hex
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_bar_color: Option<String>,
}

impl WidgetSettings {
    /// Settings for a stop, everything else default.
    pub fn for_stop(rbl: impl Into<String>) -> Self {
        Self {
            rbl: Some(rbl.into()),
            ..Default::default()
        }
    }

    /// Set the line filter
    pub fn with_line_filter(mut self, filter: &str) -> Self {
        self.line_filter = Some(filter.into());
        self
    }

    /// Set the refresh interval in seconds
    pub fn with_refresh_interval(mut self, secs: f64) -> Self {
        self.refresh_interval = Some(secs);
        self
    }

    /// Set two-departure mode
    pub fn with_show_two_departures(mut self, show: bool) -> Self {
        self.show_two_departures = Some(show);
        self
    }

    /// Set progress bar visibility
    pub fn with_show_progress_bar(mut self, show: bool) -> Self {
        self.show_progress_bar = Some(show);
        self
    }

    /// Set all three colors
    pub fn with_colors(mut self, background: &str, text: &str, progress_bar: &str) -> Self {
        self.background_color = Some(background.into());
        self.text_color = Some(text.into());
        self.progress_bar_color = Some(progress_bar.into());
        self
    }

    /// Parsed stop identifier.
    ///
    /// Absent or empty is [`ConfigError::MissingStopId`]. Otherwise the
    /// leading integer is used, after leading whitespace and with an
    /// optional sign, so `"4111 abc"` is stop 4111. Without leading digits
    /// (including whitespace-only values) it is [`ConfigError::InvalidStopId`].
    pub fn stop_id(&self) -> Result<i64, ConfigError> {
        let raw = match self.rbl.as_deref() {
            None | Some("") => return Err(ConfigError::MissingStopId),
            Some(raw) => raw,
        };
        leading_integer(raw).ok_or_else(|| ConfigError::InvalidStopId(raw.to_string()))
    }

    /// Two-departure mode, default on.
    pub fn show_two_departures(&self) -> bool {
        self.show_two_departures.unwrap_or(true)
    }

    /// Progress bar, default on.
    pub fn show_progress_bar(&self) -> bool {
        self.show_progress_bar.unwrap_or(true)
    }

    /// Effective refresh interval in seconds.
    ///
    /// Missing or zero falls back to the default; the result stays between
    /// the configured floor and ceiling.
    pub fn refresh_interval_secs(&self, limits: &MonitorConfig) -> f64 {
        let requested = match self.refresh_interval {
            Some(secs) if secs != 0.0 && secs.is_finite() => secs,
            _ => limits.default_refresh_secs,
        };
        requested
            .min(limits.max_refresh_secs)
            .max(limits.min_refresh_secs)
    }

    /// Effective refresh interval as a `Duration`.
    ///
    /// Falls back to the ceiling if the limits themselves don't fit a `Duration`.
    pub fn refresh_interval(&self, limits: &MonitorConfig) -> Duration {
        Duration::try_from_secs_f64(self.refresh_interval_secs(limits))
            .unwrap_or(Duration::from_secs(MAX_REFRESH_SECS))
    }

    /// Selector configuration derived from these settings.
    pub fn selection_config(&self) -> SelectionConfig {
        SelectionConfig {
            line_filter: self.line_filter.as_deref().and_then(LineFilter::parse),
            show_two_departures: self.show_two_departures(),
        }
    }

    /// Colors with defaults applied.
    pub fn colors(&self) -> ColorConfig {
        ColorConfig {
            background: pick_color(self.background_color.as_deref(), DEFAULT_BACKGROUND_COLOR),
            text: pick_color(self.text_color.as_deref(), DEFAULT_TEXT_COLOR),
            progress_bar: pick_color(self.progress_bar_color.as_deref(), DEFAULT_PROGRESS_BAR_COLOR),
        }
    }
}

fn leading_integer(raw: &str) -> Option<i64> {
    let text = raw.trim_start();
    let unsigned = text.strip_prefix(['+', '-']).unwrap_or(text);
    let digits = unsigned
        .find(|c: char| !c.is_ascii_digit())
        .map_or(unsigned, |end| &unsigned[..end]);
    if digits.is_empty() {
        return None;
    }
    let sign_len = text.len() - unsigned.len();
    text[..sign_len + digits.len()].parse().ok()
}

// ============================================================================
// Colors
// ============================================================================

/// Resolved render colors, each a valid `#rgb` or `#rrggbb` string.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorConfig {
    /// Canvas fill
    pub background: String,
    /// Text fill
    pub text: String,
    /// Progress bar fill
    pub progress_bar: String,
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND_COLOR.into(),
            text: DEFAULT_TEXT_COLOR.into(),
            progress_bar: DEFAULT_PROGRESS_BAR_COLOR.into(),
        }
    }
}

fn pick_color(candidate: Option<&str>, fallback: &str) -> String {
    match candidate.map(str::trim) {
        Some(c) if parse_hex_color(c).is_some() => c.to_string(),
        _ => fallback.to_string(),
    }
}

/// Parses `#rgb` or `#rrggbb` into RGB components.
///
/// ```rust
/// use rs_departures::config::parse_hex_color;
///
/// assert_eq!(parse_hex_color("#d0cd08"), Some((0xd0, 0xcd, 0x08)));
/// assert_eq!(parse_hex_color("#fff"), Some((0xff, 0xff, 0xff)));
/// assert_eq!(parse_hex_color("red"), None);
/// ```
pub fn parse_hex_color(s: &str) -> Option<(u8, u8, u8)> {
    let hex = s.strip_prefix('#')?;
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize, width: usize| u8::from_str_radix(&hex[i..i + width], 16).ok();
    match hex.len() {
        3 => {
            let expand = |v: u8| v * 17;
            Some((expand(channel(0, 1)?), expand(channel(1, 1)?), expand(channel(2, 1)?)))
        }
        6 => Some((channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
