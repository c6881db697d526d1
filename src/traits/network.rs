//! HTTP transport abstraction for the upstream API.
//!
//! The client only ever issues one kind of request: a JSON `GET` against a
//! fully-built URL. [`Transport`] captures exactly that, so the cache and
//! parsing logic can be tested against [`MockTransport`](crate::hal::MockTransport)
//! while production uses [`ReqwestTransport`](crate::hal::ReqwestTransport)
//! (`http` feature).
//!
//! ```text
//! GET https://www.wienerlinien.at/ogd_realtime/monitor?rbl=4111
//! Accept: application/json
//! Content-Type: application/json
//! ```

use core::future::Future;

use crate::error::TransportError;

/// Media type sent in both `Accept` and `Content-Type`.
pub const JSON_MEDIA_TYPE: &str = "application/json";

/// Async HTTP GET transport.
///
/// Implementations must not retry; a single failure is reported as-is.
///
/// # Example
///
/// ```rust,ignore
/// use rs_departures::traits::{HttpResponse, Transport};
///
/// async fn probe<T: Transport>(transport: &T) -> bool {
///     match transport.get_json("https://example.com/monitor?rbl=1").await {
///         Ok(resp) => resp.is_success(),
///         Err(_) => false,
///     }
/// }
/// ```
pub trait Transport: Send + Sync {
    /// Issue a GET with JSON `Accept`/`Content-Type` headers and read the whole body.
    ///
    /// Non-success statuses are returned as `Ok`; only connection-level
    /// failures are errors.
    fn get_json(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

/// A complete HTTP response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    /// HTTP status code (e.g., 200, 404, 500).
    pub status: u16,
    /// Reason phrase (e.g., "OK"), may be empty.
    pub reason: String,
    /// Response body as bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Creates a 200 OK response with the given body.
    pub fn ok(body: impl Into<Vec<u8>>) -> Self {
        Self {
            status: 200,
            reason: "OK".into(),
            body: body.into(),
        }
    }

    /// Creates a response with an arbitrary status and body.
    pub fn with_status(status: u16, reason: &str, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Returns the body as a UTF-8 string, if valid.
    pub fn body_str(&self) -> Option<&str> {
        core::str::from_utf8(&self.body).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_range() {
        assert!(HttpResponse::ok("{}").is_success());
        assert!(HttpResponse::with_status(204, "No Content", "").is_success());
        assert!(!HttpResponse::with_status(301, "Moved", "").is_success());
        assert!(!HttpResponse::with_status(500, "Internal Server Error", "").is_success());
    }

    #[test]
    fn body_str_rejects_invalid_utf8() {
        let resp = HttpResponse::ok(vec![0xff, 0xfe]);
        assert!(resp.body_str().is_none());
        assert_eq!(HttpResponse::ok("abc").body_str(), Some("abc"));
    }
}
