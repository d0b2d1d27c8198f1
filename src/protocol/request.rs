//! Request options forwarded to the transport.
//!
//! The connection never inspects these; they travel verbatim to the
//! [`Transport`](crate::transport::Transport) when the leader opens the stream.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};

// ============================================================================
// Credentials
// ============================================================================

/// Credential mode for the stream request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Credentials {
    /// Never send credentials.
    Omit,
    /// Send credentials to same-origin URLs only.
    #[default]
    SameOrigin,
    /// Always send credentials.
    Include,
}

// ============================================================================
// RequestOptions
// ============================================================================

/// Transport-level request options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestOptions {
    /// HTTP method.
    pub method: String,

    /// Request headers in insertion order.
    #[serde(default)]
    pub headers: Vec<(String, String)>,

    /// Request body.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,

    /// Credential mode.
    #[serde(default)]
    pub credentials: Credentials,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl RequestOptions {
    /// Creates a plain `GET` request.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            method: "GET".to_string(),
            headers: Vec::new(),
            body: None,
            credentials: Credentials::SameOrigin,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl RequestOptions {
    /// Sets the HTTP method.
    #[inline]
    #[must_use]
    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    /// Adds a request header.
    #[inline]
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Sets the request body.
    #[inline]
    #[must_use]
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the credential mode.
    #[inline]
    #[must_use]
    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = credentials;
        self
    }

    /// Returns the first header value matching `name`, case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RequestOptions::default();
        assert_eq!(options.method, "GET");
        assert!(options.headers.is_empty());
        assert_eq!(options.credentials, Credentials::SameOrigin);
    }

    #[test]
    fn test_builder_chain() {
        let options = RequestOptions::new()
            .with_method("POST")
            .with_header("Authorization", "Bearer t")
            .with_body("{}")
            .with_credentials(Credentials::Include);

        assert_eq!(options.method, "POST");
        assert_eq!(options.header("authorization"), Some("Bearer t"));
        assert_eq!(options.body.as_deref(), Some("{}"));
    }

    #[test]
    fn test_credentials_serialize_kebab_case() {
        let json = serde_json::to_string(&Credentials::SameOrigin).unwrap();
        assert_eq!(json, "\"same-origin\"");
    }
}
