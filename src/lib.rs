//! # rs-departures
//!
//! Real-time departure widgets for Vienna's public transit monitor API.
//!
//! ## Features
//!
//! - **Cached polling**: One upstream request per stop per 30 seconds, shared by all widgets
//! - **Line filtering**: Comma-separated line lists, optional same-line second departure
//! - **Rendering**: Deterministic 144×144 SVG, or raster via embedded-graphics (`graphics` feature)
//! - **Per-widget timers**: Independent refresh and progress-bar timers with safe restarts
//! - **Desktop host**: HTTP simulation of the widget host (`web` feature)
//!
//! ## Architecture
//!
//! The crate is structured so everything runs in tests without a network or host:
//!
//! - `traits` - Clock, transport, surface and renderer abstractions
//! - `client` - Upstream client with the per-stop cache
//! - `selector` - Line filtering and departure pairing
//! - `render` - Render states and renderers
//! - `monitor` - Widget registry and timers
//! - `hal` - Concrete implementations (mock for testing, reqwest for the real API)
//!
//! ## Example
//!
//! ```rust
//! use rs_departures::{select, Departure, SelectionConfig, SelectionResult, LineFilter};
//! use rs_departures::config::ColorConfig;
//! use rs_departures::render::{RenderState, SvgRenderer};
//! use rs_departures::traits::ImageRenderer;
//!
//! let departures = vec![
//!     Departure::new("13A", "HAUPTBAHNHOF", 0),
//!     Departure::new("U1", "LEOPOLDAU", 2),
//!     Departure::new("U1", "LEOPOLDAU", 7),
//! ];
//! let config = SelectionConfig {
//!     line_filter: LineFilter::parse("u1"),
//!     show_two_departures: true,
//! };
//!
//! let SelectionResult::Selected { first, second } = select(&departures, &config) else {
//!     panic!("expected a selection");
//! };
//! let state = RenderState::Departures { first, second, progress_percent: Some(0.0) };
//! let image = SvgRenderer.render(&state, &ColorConfig::default());
//!
//! assert!(image.to_data_url().starts_with("data:image/svg+xml;charset=utf-8,"));
//! ```

#![warn(missing_docs)]

/// Upstream API client with the per-stop cache.
pub mod client;
/// Widget settings and application configuration.
pub mod config;
/// Departure data model.
pub mod departure;
/// Error types.
pub mod error;
/// Concrete trait implementations, including mocks for testing.
pub mod hal;
/// Wire types for the upstream API and host messages.
pub mod messages;
/// Widget scheduler.
pub mod monitor;
/// Render states and renderers.
pub mod render;
/// Type-erased renderers for runtime selection.
pub mod renderer_dyn;
/// Departure filtering and pairing.
pub mod selector;
/// Core traits for the network, host, clock and rendering seams.
pub mod traits;

/// Desktop host over HTTP (feature-gated).
#[cfg(feature = "web")]
pub mod services;

// Re-exports for convenience
pub use client::{CacheStats, UpstreamClient};
pub use config::{
    ColorConfig, Config, MonitorConfig, UpstreamConfig, WebConfig, WidgetSettings,
};
pub use departure::{Departure, StopSnapshot};
pub use error::{ConfigError, SurfaceError, TransportError, UpstreamError};
pub use messages::PluginMessage;
pub use monitor::{progress_percent, DepartureMonitor, TimerStatus, WidgetId, WidgetStatus};
pub use render::{
    DisplayPair, ImageFormat, PlaceholderKind, RenderState, RenderedImage, SvgRenderer,
};
pub use renderer_dyn::AnyRenderer;
pub use selector::{fetch_limit, select, LineFilter, SelectionConfig, SelectionResult};
pub use traits::{Clock, HttpResponse, ImageRenderer, Transport, WidgetSurface};
