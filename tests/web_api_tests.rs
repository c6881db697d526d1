//! Integration tests for the desktop host HTTP API.

#![cfg(feature = "web")]

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use tower::ServiceExt;

use rs_departures::hal::{MemorySurface, MockClock, MockTransport};
use rs_departures::services::{
    build_router, ApiResponse, CacheStats, CommandResponse, HostMonitor, WebServerConfig,
    WidgetStatus,
};
use rs_departures::{DepartureMonitor, MonitorConfig, UpstreamClient, UpstreamConfig};

const ONE_DEPARTURE: &str = r#"{"data":{"monitors":[{"lines":[{
    "name":"U1","towards":"LEOPOLDAU",
    "departures":{"departure":[{"departureTime":{"countdown":3}}]}}]}]}}"#;

fn create_test_app() -> (Router, HostMonitor<MockTransport, MockClock>, MockTransport) {
    let transport = MockTransport::new();
    transport.respond_json(ONE_DEPARTURE);
    let client =
        UpstreamClient::new(transport.clone(), MockClock::new(), &UpstreamConfig::default())
            .unwrap();
    let monitor = DepartureMonitor::new(client, MemorySurface::new(), MonitorConfig::default());
    let router = build_router(monitor.clone(), &WebServerConfig::default());
    (router, monitor, transport)
}

fn request(method: &str, uri: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_put_settings_starts_widget() {
    let (app, monitor, transport) = create_test_app();

    let response = app
        .oneshot(request("PUT", "/api/widgets/key-1", r#"{"rbl":"4111","lineFilter":"u1"}"#))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json: ApiResponse<CommandResponse> = json_body(response).await;
    assert!(json.success);
    assert_eq!(json.data, Some(CommandResponse::accepted("monitoring_started")));

    assert_eq!(transport.request_count(), 1);
    let status = monitor.widget_status("key-1").unwrap();
    assert!(status.visible);
    assert_eq!(status.showing_line.as_deref(), Some("U1"));
    monitor.shutdown();
}

#[tokio::test]
async fn test_invalid_settings_rejected() {
    let (app, monitor, _) = create_test_app();

    let response = app
        .oneshot(request("PUT", "/api/widgets/key-1", "{not json"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json: ApiResponse<()> = json_body(response).await;
    assert!(!json.success);
    assert!(json.error.unwrap().starts_with("Invalid settings"));
    assert!(monitor.widget_ids().is_empty());
}

#[tokio::test]
async fn test_widget_status_routes() {
    let (app, monitor, _) = create_test_app();

    app.clone()
        .oneshot(request("PUT", "/api/widgets/b", r#"{"rbl":"4111"}"#))
        .await
        .unwrap();
    app.clone()
        .oneshot(request("PUT", "/api/widgets/a", r#"{}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", "/api/widgets", ""))
        .await
        .unwrap();
    let json: ApiResponse<Vec<WidgetStatus>> = json_body(response).await;
    let ids: Vec<String> = json.data.unwrap().into_iter().map(|s| s.id).collect();
    assert_eq!(ids, vec!["a".to_string(), "b".to_string()]);

    let response = app
        .clone()
        .oneshot(request("GET", "/api/widgets/a", ""))
        .await
        .unwrap();
    let json: ApiResponse<WidgetStatus> = json_body(response).await;
    let status = json.data.unwrap();
    assert!(!status.timers.refresh);
    assert_eq!(status.showing_line, None);

    let response = app
        .oneshot(request("GET", "/api/widgets/missing", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    monitor.shutdown();
}

#[tokio::test]
async fn test_image_route_serves_svg() {
    let (app, monitor, _) = create_test_app();

    app.clone()
        .oneshot(request("PUT", "/api/widgets/key-1", r#"{"rbl":"4111"}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", "/api/widgets/key-1/image", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "image/svg+xml"
    );
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let svg = String::from_utf8(body.to_vec()).unwrap();
    assert!(svg.contains(">Leopoldau</text>"));

    let response = app
        .oneshot(request("GET", "/api/widgets/other/image", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    monitor.shutdown();
}

#[tokio::test]
async fn test_key_and_message_refresh() {
    let (app, monitor, transport) = create_test_app();

    app.clone()
        .oneshot(request("PUT", "/api/widgets/key-1", r#"{"rbl":"4111"}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("POST", "/api/widgets/key-1/key", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.request_count(), 2);

    let response = app
        .clone()
        .oneshot(request("POST", "/api/widgets/key-1/message", r#"{"event":"refreshNow"}"#))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(transport.request_count(), 3);

    let response = app
        .clone()
        .oneshot(request("POST", "/api/widgets/key-1/message", "nope"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(request("POST", "/api/widgets/ghost/key", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(transport.request_count(), 3);
    monitor.shutdown();
}

#[tokio::test]
async fn test_delete_stops_widget() {
    let (app, monitor, _) = create_test_app();

    app.clone()
        .oneshot(request("PUT", "/api/widgets/key-1", r#"{"rbl":"4111"}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("DELETE", "/api/widgets/key-1", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let status = monitor.widget_status("key-1").unwrap();
    assert!(!status.visible);
    assert!(!status.timers.refresh);
    assert!(!status.timers.progress);

    let response = app
        .oneshot(request("DELETE", "/api/widgets/ghost", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_cache_routes() {
    let (app, monitor, _) = create_test_app();

    app.clone()
        .oneshot(request("PUT", "/api/widgets/key-1", r#"{"rbl":"4111"}"#))
        .await
        .unwrap();

    let response = app
        .clone()
        .oneshot(request("GET", "/api/cache", ""))
        .await
        .unwrap();
    let json: ApiResponse<CacheStats> = json_body(response).await;
    assert_eq!(
        json.data,
        Some(CacheStats {
            size: 1,
            entries: vec![4111],
        })
    );

    let response = app
        .oneshot(request("DELETE", "/api/cache", ""))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(monitor.client().cache_stats().size, 0);
    monitor.shutdown();
}

#[tokio::test]
async fn test_unknown_route() {
    let (app, _, _) = create_test_app();

    let response = app
        .oneshot(request("GET", "/api/nope", ""))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let json: ApiResponse<()> = json_body(response).await;
    assert_eq!(json.error.as_deref(), Some("Not found"));
}
