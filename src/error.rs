//! Error types.
//!
//! | Error | Raised by | Resolution |
//! |-------|-----------|------------|
//! | [`ConfigError`] | settings validation, client construction | placeholder render, monitoring does not start |
//! | [`UpstreamError`] | [`UpstreamClient`](crate::UpstreamClient) | `FetchError` placeholder, monitoring continues |
//! | [`TransportError`] | [`Transport`](crate::traits::Transport) impls | wrapped into [`UpstreamError::Transport`] |
//! | [`SurfaceError`] | [`WidgetSurface`](crate::traits::WidgetSurface) impls | logged, never fatal |
//!
//! Empty results and unmatched line filters are not errors; see
//! [`SelectionResult`](crate::SelectionResult).

use thiserror::Error;

/// Invalid or missing widget configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No stop identifier was configured.
    #[error("no stop id configured")]
    MissingStopId,
    /// The stop identifier is not an integer.
    #[error("invalid stop id: {0:?}")]
    InvalidStopId(String),
    /// The upstream base URL does not parse.
    #[error("invalid upstream base url {url:?}: {reason}")]
    InvalidBaseUrl {
        /// The configured URL.
        url: String,
        /// Parser message.
        reason: String,
    },
}

/// Failure talking to the upstream API.
///
/// Every variant carries a human-readable reason. No variant is retried.
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// The request could not be sent or the body could not be read.
    #[error("request failed: {0}")]
    Transport(#[from] TransportError),
    /// The API answered with a non-success status.
    #[error("API request failed: {status} {reason}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Canonical reason phrase, may be empty.
        reason: String,
    },
    /// The body is not JSON of the expected shape.
    #[error("invalid JSON response from API: {0}")]
    Malformed(#[from] serde_json::Error),
    /// The response contained no monitors for the stop.
    #[error("no monitors found for RBL {stop_id}, please verify the RBL number is correct")]
    NoMonitors {
        /// Requested stop.
        stop_id: i64,
    },
}

/// Transport-level failure (connection, timeout, body read).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

impl TransportError {
    /// Creates a transport error from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Failure pushing an image or title to the host.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The host no longer knows this widget.
    #[error("unknown widget {0}")]
    UnknownWidget(String),
    /// Any other host-side failure.
    #[error("host rejected update: {0}")]
    Rejected(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_error_message() {
        let err = UpstreamError::Status {
            status: 503,
            reason: "Service Unavailable".into(),
        };
        assert_eq!(err.to_string(), "API request failed: 503 Service Unavailable");
    }

    #[test]
    fn no_monitors_mentions_stop() {
        let err = UpstreamError::NoMonitors { stop_id: 4111 };
        assert!(err.to_string().contains("4111"));
    }

    #[test]
    fn transport_error_converts() {
        let err: UpstreamError = TransportError::new("connection refused").into();
        assert!(matches!(err, UpstreamError::Transport(_)));
        assert_eq!(err.to_string(), "request failed: connection refused");
    }

    #[test]
    fn malformed_from_serde() {
        let parse = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
        let err: UpstreamError = parse.into();
        assert!(matches!(err, UpstreamError::Malformed(_)));
    }

    #[test]
    fn config_error_messages() {
        assert_eq!(ConfigError::MissingStopId.to_string(), "no stop id configured");
        assert_eq!(
            ConfigError::InvalidStopId("abc".into()).to_string(),
            "invalid stop id: \"abc\""
        );
    }
}
