//! Stream event and open response types.
//!
//! A [`StreamEvent`] is one message received from the server-push stream.
//! It is what the leader hands to `on_message` and republishes, unchanged,
//! on the broadcast channel for followers.

// ============================================================================
// Imports
// ============================================================================

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// StreamEvent
// ============================================================================

/// One event received from the stream.
///
/// # Format
///
/// ```json
/// {
///   "id": "42",
///   "event": "price",
///   "data": "{\"symbol\":\"ABC\"}",
///   "retry": 3000
/// }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamEvent {
    /// Last event id (empty when the server sent none).
    #[serde(default)]
    pub id: String,

    /// Event type (empty means the default `message` type).
    #[serde(default)]
    pub event: String,

    /// Event payload.
    #[serde(default)]
    pub data: String,

    /// Reconnection interval hint in milliseconds, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry: Option<u64>,
}

impl StreamEvent {
    /// Creates an event carrying only a payload.
    #[inline]
    #[must_use]
    pub fn data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Default::default()
        }
    }

    /// Sets the event id.
    #[inline]
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Sets the event type.
    #[inline]
    #[must_use]
    pub fn with_event(mut self, event: impl Into<String>) -> Self {
        self.event = event.into();
        self
    }

    /// Sets the retry hint.
    #[inline]
    #[must_use]
    pub fn with_retry(mut self, retry_ms: u64) -> Self {
        self.retry = Some(retry_ms);
        self
    }

    /// Returns the event type, defaulting to `message`.
    #[inline]
    #[must_use]
    pub fn event_type(&self) -> &str {
        if self.event.is_empty() {
            "message"
        } else {
            &self.event
        }
    }
}

// ============================================================================
// OpenResponse
// ============================================================================

/// Response the transport received when the stream opened.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OpenResponse {
    /// HTTP status code.
    pub status: u16,

    /// Response headers, keys lower-cased.
    pub headers: FxHashMap<String, String>,
}

impl OpenResponse {
    /// Creates a response with the given status and no headers.
    #[inline]
    #[must_use]
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: FxHashMap::default(),
        }
    }

    /// Creates a `200 OK` event-stream response.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(200).with_header("content-type", "text/event-stream")
    }

    /// Adds a header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.as_ref().to_ascii_lowercase(), value.into());
        self
    }

    /// Returns a header value by case-insensitive name.
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Returns `true` for a 2xx status.
    #[inline]
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_type_defaults_to_message() {
        let event = StreamEvent::data("hello");
        assert_eq!(event.event_type(), "message");
        assert_eq!(event.with_event("tick").event_type(), "tick");
    }

    #[test]
    fn test_event_json_skips_missing_retry() {
        let json = serde_json::to_value(StreamEvent::data("x").with_id("1")).unwrap();
        assert_eq!(json, serde_json::json!({"id": "1", "event": "", "data": "x"}));
    }

    #[test]
    fn test_event_deserialize_partial() {
        let event: StreamEvent = serde_json::from_str(r#"{"data":"only"}"#).unwrap();
        assert_eq!(event, StreamEvent::data("only"));
    }

    #[test]
    fn test_open_response_headers_case_insensitive() {
        let response = OpenResponse::ok();
        assert!(response.is_success());
        assert_eq!(response.header("Content-Type"), Some("text/event-stream"));
        assert!(!OpenResponse::new(404).is_success());
    }
}
