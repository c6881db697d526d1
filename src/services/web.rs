//! Axum-based desktop host for departure widgets.
//!
//! Stands in for the device host: widgets appear, change settings, get key
//! presses and disappear through HTTP, and their latest image is served back.
//!
//! - GET `/api/widgets` - Status of every widget
//! - GET `/api/widgets/:id` - Status of one widget
//! - PUT `/api/widgets/:id` - Settings JSON; widget appears or is reconfigured
//! - DELETE `/api/widgets/:id` - Widget disappears
//! - POST `/api/widgets/:id/key` - Key press (manual refresh)
//! - POST `/api/widgets/:id/message` - Settings-panel message, e.g. `{"event":"refreshNow"}`
//! - GET `/api/widgets/:id/image` - Latest image (`image/svg+xml`)
//! - GET `/api/cache` - Cached stops
//! - DELETE `/api/cache` - Clear the cache

use std::net::SocketAddr;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::config::{WebConfig, WidgetSettings};
use crate::hal::MemorySurface;
use crate::monitor::{DepartureMonitor, WidgetStatus};
use crate::traits::{Clock, Transport};

use super::api::{ApiResponse, CacheStats, CommandResponse};

/// Monitor type served by the desktop host.
pub type HostMonitor<T, C> = DepartureMonitor<T, MemorySurface, C>;

// ============================================================================
// Route Handlers
// ============================================================================

fn unknown_widget(id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err(format!("Unknown widget {id}"))),
    )
        .into_response()
}

/// GET /api/widgets - Status of every widget
async fn list_widgets<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
) -> Json<ApiResponse<Vec<WidgetStatus>>> {
    let statuses = monitor
        .widget_ids()
        .iter()
        .filter_map(|id| monitor.widget_status(id))
        .collect();
    Json(ApiResponse::ok(statuses))
}

/// GET /api/widgets/:id - Status of one widget
async fn get_widget<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
    Path(id): Path<String>,
) -> Response {
    match monitor.widget_status(&id) {
        Some(status) => Json(ApiResponse::ok(status)).into_response(),
        None => unknown_widget(&id),
    }
}

/// PUT /api/widgets/:id - Widget appeared or its settings changed
///
/// Accepts the host settings JSON: `{"rbl": "4111", "lineFilter": "U1"}`
async fn put_settings<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let settings: WidgetSettings = match serde_json::from_slice(&body) {
        Ok(settings) => settings,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(ApiResponse::<()>::err(format!("Invalid settings: {e}"))),
            )
                .into_response()
        }
    };

    monitor.start_monitoring(&id, settings).await;
    Json(ApiResponse::ok(CommandResponse::accepted("monitoring_started"))).into_response()
}

/// DELETE /api/widgets/:id - Widget disappeared
async fn hide_widget<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
    Path(id): Path<String>,
) -> Response {
    if monitor.settings(&id).is_none() {
        return unknown_widget(&id);
    }
    monitor.stop_monitoring(&id);
    Json(ApiResponse::ok(CommandResponse::accepted("monitoring_stopped"))).into_response()
}

/// POST /api/widgets/:id/key - Key press
async fn key_down<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
    Path(id): Path<String>,
) -> Response {
    if monitor.settings(&id).is_none() {
        return unknown_widget(&id);
    }
    monitor.manual_refresh(&id).await;
    Json(ApiResponse::ok(CommandResponse::accepted("refreshed"))).into_response()
}

/// POST /api/widgets/:id/message - Message from the settings panel
async fn send_message<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
    Path(id): Path<String>,
    body: Bytes,
) -> Response {
    let Ok(payload) = serde_json::from_slice::<serde_json::Value>(&body) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(ApiResponse::<()>::err("Invalid message")),
        )
            .into_response();
    };
    if monitor.settings(&id).is_none() {
        return unknown_widget(&id);
    }
    monitor.handle_plugin_message(&id, &payload).await;
    Json(ApiResponse::ok(CommandResponse::accepted("delivered"))).into_response()
}

/// GET /api/widgets/:id/image - Latest pushed image
async fn get_image<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
    Path(id): Path<String>,
) -> Response {
    match monitor.surface().latest_image(&id) {
        Some(image) => (
            [(header::CONTENT_TYPE, image.format.mime_type())],
            image.bytes,
        )
            .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(ApiResponse::<()>::err(format!("No image for widget {id}"))),
        )
            .into_response(),
    }
}

/// GET /api/cache - Cached stops
async fn cache_stats<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
) -> Json<ApiResponse<CacheStats>> {
    Json(ApiResponse::ok(monitor.client().cache_stats()))
}

/// DELETE /api/cache - Clear every cached stop
async fn clear_cache<T: Transport + 'static, C: Clock + 'static>(
    State(monitor): State<HostMonitor<T, C>>,
) -> Json<ApiResponse<CommandResponse>> {
    monitor.client().clear_cache(None);
    Json(ApiResponse::ok(CommandResponse::accepted("cache_cleared")))
}

/// Fallback handler for 404
async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ApiResponse::<()>::err("Not found")),
    )
}

// ============================================================================
// Server Builder
// ============================================================================

/// Configuration for the web server
#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Address to bind to
    pub addr: SocketAddr,
    /// Whether to enable CORS for all origins
    pub cors_permissive: bool,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self::from_config(&WebConfig::default())
    }
}

impl WebServerConfig {
    /// Create a new config with the given address
    pub fn new(addr: impl Into<SocketAddr>) -> Self {
        Self {
            addr: addr.into(),
            ..Default::default()
        }
    }

    /// Set whether CORS should be permissive
    pub fn cors(mut self, permissive: bool) -> Self {
        self.cors_permissive = permissive;
        self
    }

    /// Create from shared WebConfig
    pub fn from_config(config: &WebConfig) -> Self {
        Self {
            addr: ([0, 0, 0, 0], config.port).into(),
            cors_permissive: config.cors_permissive,
        }
    }
}

/// Build the Axum router with all routes
pub fn build_router<T: Transport + 'static, C: Clock + 'static>(
    monitor: HostMonitor<T, C>,
    config: &WebServerConfig,
) -> Router {
    let mut router = Router::new()
        .route("/api/widgets", get(list_widgets::<T, C>))
        .route(
            "/api/widgets/:id",
            get(get_widget::<T, C>)
                .put(put_settings::<T, C>)
                .delete(hide_widget::<T, C>),
        )
        .route("/api/widgets/:id/key", post(key_down::<T, C>))
        .route("/api/widgets/:id/message", post(send_message::<T, C>))
        .route("/api/widgets/:id/image", get(get_image::<T, C>))
        .route(
            "/api/cache",
            get(cache_stats::<T, C>).delete(clear_cache::<T, C>),
        )
        .fallback(not_found)
        .with_state(monitor);

    if config.cors_permissive {
        router = router.layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        );
    }

    router
}

/// Start the web server
///
/// Runs until the listener fails. Stops every widget on the way out.
pub async fn run_server<T: Transport + 'static, C: Clock + 'static>(
    monitor: HostMonitor<T, C>,
    config: WebServerConfig,
) -> Result<(), std::io::Error> {
    let router = build_router(monitor.clone(), &config);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    info!(addr = %config.addr, "web host listening");

    let result = axum::serve(listener, router).await;
    monitor.shutdown();
    result
}
