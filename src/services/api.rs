//! API request and response types for the desktop host.

use serde::{Deserialize, Serialize};

pub use crate::client::CacheStats;
pub use crate::monitor::{TimerStatus, WidgetStatus};

// ============================================================================
// Response Types
// ============================================================================

/// API response wrapper for consistent JSON structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request was successful
    pub success: bool,
    /// Response data (present when success=true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Error message (present when success=false)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    /// Create a successful response with data
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    /// Create an error response
    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Result of a widget command (settings change, key press, message)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandResponse {
    /// Whether the command was accepted
    pub accepted: bool,
    /// Result details
    pub result: String,
}

impl CommandResponse {
    /// Create a response for an accepted command
    pub fn accepted(result: impl Into<String>) -> Self {
        Self {
            accepted: true,
            result: result.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_ok() {
        let response = ApiResponse::ok("test data");
        assert!(response.success);
        assert_eq!(response.data, Some("test data"));
        assert_eq!(response.error, None);
    }

    #[test]
    fn test_api_response_err() {
        let response: ApiResponse<String> = ApiResponse::err("unknown widget");
        assert!(!response.success);
        assert_eq!(response.data, None);
        assert_eq!(response.error, Some("unknown widget".to_string()));
    }

    #[test]
    fn test_api_response_skip_serializing_none() {
        let response = ApiResponse::ok(42);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("error"));

        let response: ApiResponse<i32> = ApiResponse::err("failed");
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("data"));
    }

    #[test]
    fn test_command_response_serde() {
        let response = CommandResponse::accepted("refreshed");
        let json = serde_json::to_string(&response).unwrap();
        let deserialized: CommandResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, response);
        assert!(deserialized.accepted);
    }

    #[test]
    fn test_widget_status_serde() {
        let status = WidgetStatus {
            id: "key-1".into(),
            visible: true,
            timers: TimerStatus {
                refresh: true,
                progress: false,
            },
            last_update_ms: Some(1200),
            showing_line: Some("U1".into()),
        };
        let json = serde_json::to_string(&ApiResponse::ok(vec![status.clone()])).unwrap();
        let back: ApiResponse<Vec<WidgetStatus>> = serde_json::from_str(&json).unwrap();
        assert_eq!(back.data, Some(vec![status]));
    }
}
