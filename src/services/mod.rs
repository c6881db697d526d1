//! Desktop host services.
//!
//! The `web` feature runs an Axum HTTP server that plays the role of the
//! device host: it owns a [`DepartureMonitor`](crate::DepartureMonitor)
//! pushing into a [`MemorySurface`](crate::hal::MemorySurface) and turns
//! HTTP calls into widget lifecycle events.
//!
//! ```ignore
//! use rs_departures::services::{run_server, WebServerConfig};
//!
//! let monitor = DepartureMonitor::new(client, MemorySurface::new(), config.monitor.clone());
//! run_server(monitor, WebServerConfig::from_config(&config.web)).await?;
//! ```

pub mod api;
pub mod web;

pub use api::*;
pub use web::*;
