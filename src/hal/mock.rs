//! Mock implementations for testing without the network or a host.
//!
//! Every mock is a cheap handle: clones share state, so a test can hand one
//! clone to the code under test and inspect another.
//!
//! # Available Mocks
//!
//! | Mock | Trait | Purpose |
//! |------|-------|---------|
//! | [`MockClock`] | [`Clock`] | Controllable time source |
//! | [`MockTransport`] | [`Transport`] | Scripted responses, records requests |
//! | [`MockSurface`] | [`WidgetSurface`] | Records pushed images and titles |
//!
//! # Example
//!
//! ```rust
//! use rs_departures::hal::{MockClock, MockTransport};
//! use rs_departures::{UpstreamClient, UpstreamConfig};
//!
//! # tokio_test_block(async {
//! let transport = MockTransport::new();
//! transport.respond_json(r#"{"data":{"monitors":[{"lines":[]}]}}"#);
//!
//! let client = UpstreamClient::new(transport.clone(), MockClock::new(), &UpstreamConfig::default()).unwrap();
//! let departures = client.fetch_departures(4111, 10).await.unwrap();
//!
//! assert!(departures.is_empty());
//! assert_eq!(transport.request_count(), 1);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```
//!
//! [`Clock`]: crate::traits::Clock
//! [`Transport`]: crate::traits::Transport
//! [`WidgetSurface`]: crate::traits::WidgetSurface

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{SurfaceError, TransportError};
use crate::render::RenderedImage;
use crate::traits::{Clock, HttpResponse, Transport, WidgetSurface};

// ============================================================================
// Clock
// ============================================================================

/// Mock clock for testing.
///
/// Provides a controllable time source for testing time-dependent behavior.
///
/// # Example
///
/// ```rust
/// use rs_departures::hal::MockClock;
/// use rs_departures::traits::Clock;
///
/// let clock = MockClock::new();
/// assert_eq!(clock.now_ms(), 0);
///
/// clock.set(1000);
/// assert_eq!(clock.now_ms(), 1000);
///
/// let shared = clock.clone();
/// shared.advance(500);
/// assert_eq!(clock.now_ms(), 1500);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockClock {
    current_ms: Arc<AtomicU64>,
}

impl MockClock {
    /// Creates a new mock clock starting at 0ms.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the current time in milliseconds.
    pub fn set(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::SeqCst);
    }

    /// Advances the clock by the given duration.
    pub fn advance(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Transport
// ============================================================================

#[derive(Debug, Default)]
struct TransportScript {
    queued: VecDeque<Result<HttpResponse, TransportError>>,
    fallback: Option<Result<HttpResponse, TransportError>>,
    requests: Vec<String>,
}

/// Scripted HTTP transport.
///
/// Queued responses are served once each, in order. When the queue is empty
/// the fallback (set with [`respond_json`](Self::respond_json) or
/// [`respond`](Self::respond)) is served on every request. With neither, the
/// request fails with a transport error.
///
/// # Example
///
/// ```rust
/// use rs_departures::hal::MockTransport;
/// use rs_departures::traits::HttpResponse;
/// use rs_departures::TransportError;
///
/// let transport = MockTransport::new();
/// transport.queue(Err(TransportError::new("timed out")));
/// transport.queue(Ok(HttpResponse::with_status(500, "Internal Server Error", "")));
/// transport.respond_json("{}");
///
/// assert_eq!(transport.request_count(), 0);
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockTransport {
    script: Arc<Mutex<TransportScript>>,
}

impl MockTransport {
    /// Creates a transport with nothing scripted.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `body` with 200 OK for every unqueued request.
    pub fn respond_json(&self, body: &str) {
        self.respond(Ok(HttpResponse::ok(body)));
    }

    /// Serve `response` for every unqueued request.
    pub fn respond(&self, response: Result<HttpResponse, TransportError>) {
        self.with_script(|s| s.fallback = Some(response));
    }

    /// Serve `response` once, ahead of the fallback.
    pub fn queue(&self, response: Result<HttpResponse, TransportError>) {
        self.with_script(|s| s.queued.push_back(response));
    }

    /// Number of requests issued so far.
    pub fn request_count(&self) -> usize {
        self.with_script(|s| s.requests.len())
    }

    /// Every requested URL, oldest first.
    pub fn requests(&self) -> Vec<String> {
        self.with_script(|s| s.requests.clone())
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut TransportScript) -> R) -> R {
        let mut guard = self.script.lock().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

impl Transport for MockTransport {
    async fn get_json(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.with_script(|s| {
            s.requests.push(url.to_string());
            match s.queued.pop_front() {
                Some(response) => response,
                None => s
                    .fallback
                    .clone()
                    .unwrap_or_else(|| Err(TransportError::new("no response scripted"))),
            }
        })
    }
}

// ============================================================================
// Surface
// ============================================================================

/// One call recorded by [`MockSurface`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SurfaceUpdate {
    /// `set_image` was called.
    Image {
        /// Target widget.
        widget: String,
        /// Pushed image.
        image: RenderedImage,
    },
    /// `set_title` was called.
    Title {
        /// Target widget.
        widget: String,
        /// Pushed title.
        title: String,
    },
}

/// Recording widget surface.
///
/// # Example
///
/// ```rust
/// use rs_departures::hal::MockSurface;
///
/// let surface = MockSurface::new();
/// assert_eq!(surface.image_count("key-1"), 0);
/// assert!(surface.last_svg("key-1").is_none());
/// ```
#[derive(Clone, Debug, Default)]
pub struct MockSurface {
    updates: Arc<Mutex<Vec<SurfaceUpdate>>>,
    failing: Arc<AtomicBool>,
}

impl MockSurface {
    /// Creates an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following call fail (still recorded).
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// All recorded calls, oldest first.
    pub fn updates(&self) -> Vec<SurfaceUpdate> {
        self.lock().clone()
    }

    /// Images pushed to `widget`, oldest first.
    pub fn images(&self, widget: &str) -> Vec<RenderedImage> {
        self.lock()
            .iter()
            .filter_map(|u| match u {
                SurfaceUpdate::Image { widget: w, image } if w == widget => Some(image.clone()),
                _ => None,
            })
            .collect()
    }

    /// Titles pushed to `widget`, oldest first.
    pub fn titles(&self, widget: &str) -> Vec<String> {
        self.lock()
            .iter()
            .filter_map(|u| match u {
                SurfaceUpdate::Title { widget: w, title } if w == widget => Some(title.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of images pushed to `widget`.
    pub fn image_count(&self, widget: &str) -> usize {
        self.images(widget).len()
    }

    /// Most recent image for `widget` as SVG text.
    pub fn last_svg(&self, widget: &str) -> Option<String> {
        self.images(widget)
            .last()
            .and_then(|image| image.as_svg().map(str::to_string))
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<SurfaceUpdate>> {
        self.updates.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn outcome(&self) -> Result<(), SurfaceError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(SurfaceError::Rejected("mock failure".into()))
        } else {
            Ok(())
        }
    }
}

impl WidgetSurface for MockSurface {
    async fn set_image(&self, widget: &str, image: &RenderedImage) -> Result<(), SurfaceError> {
        self.lock().push(SurfaceUpdate::Image {
            widget: widget.to_string(),
            image: image.clone(),
        });
        self.outcome()
    }

    async fn set_title(&self, widget: &str, title: &str) -> Result<(), SurfaceError> {
        self.lock().push(SurfaceUpdate::Title {
            widget: widget.to_string(),
            title: title.to_string(),
        });
        self.outcome()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{PlaceholderKind, RenderState, SvgRenderer};
    use crate::traits::ImageRenderer;
    use crate::config::ColorConfig;

    #[test]
    fn clock_clones_share_time() {
        let clock = MockClock::new();
        let other = clock.clone();
        other.advance(250);
        assert_eq!(clock.now_ms(), 250);
        assert_eq!(clock.elapsed_since(100), 150);
        assert_eq!(clock.elapsed_since(1000), 0);
    }

    #[tokio::test]
    async fn transport_serves_queue_then_fallback() {
        let transport = MockTransport::new();
        transport.queue(Ok(HttpResponse::with_status(404, "Not Found", "")));
        transport.respond_json("{}");

        let first = transport.get_json("http://a").await.unwrap();
        let second = transport.get_json("http://b").await.unwrap();
        let third = transport.get_json("http://c").await.unwrap();

        assert_eq!(first.status, 404);
        assert_eq!(second.body_str(), Some("{}"));
        assert_eq!(third.status, 200);
        assert_eq!(transport.requests(), vec!["http://a", "http://b", "http://c"]);
    }

    #[tokio::test]
    async fn transport_without_script_fails() {
        let transport = MockTransport::new();
        assert!(transport.get_json("http://a").await.is_err());
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn surface_records_per_widget() {
        let surface = MockSurface::new();
        let image = SvgRenderer.render(
            &RenderState::Placeholder(PlaceholderKind::FetchError),
            &ColorConfig::default(),
        );

        surface.set_image("a", &image).await.unwrap();
        surface.set_title("a", "").await.unwrap();
        surface.set_image("b", &image).await.unwrap();

        assert_eq!(surface.image_count("a"), 1);
        assert_eq!(surface.titles("a"), vec![String::new()]);
        assert_eq!(surface.updates().len(), 3);
        assert!(surface.last_svg("b").unwrap().contains("Fetching"));

        surface.set_failing(true);
        assert!(surface.set_image("a", &image).await.is_err());
        assert_eq!(surface.image_count("a"), 2);
    }
}
