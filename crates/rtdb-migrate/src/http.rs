//! HTTP utilities shared by the Firebase clients.
//!
//! This module provides HTTP client creation, URL validation and mapping of
//! error responses onto [`Error`] variants.

use crate::error::{Error, Result};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

/// Default HTTP timeout for every remote call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which remote collaborator produced a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Service {
    /// Firebase Authentication (identity toolkit).
    Identity,
    /// Firebase Realtime Database.
    Store,
}

impl Service {
    fn name(self) -> &'static str {
        match self {
            Self::Identity => "Firebase Auth",
            Self::Store => "Realtime Database",
        }
    }
}

/// Creates a configured HTTP client with timeout.
#[must_use]
pub fn create_http_client() -> Client {
    Client::builder()
        .timeout(DEFAULT_TIMEOUT)
        .connect_timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Validates a service URL.
pub fn validate_url(url: &str) -> Result<()> {
    let has_valid_scheme = ["http://", "https://"].iter().any(|s| url.starts_with(s));

    if !has_valid_scheme {
        return Err(Error::Config(format!(
            "Invalid URL scheme in '{}'. Allowed: http, https",
            url
        )));
    }

    if url.len() < 10 {
        return Err(Error::Config(format!("Invalid URL format: {}", url)));
    }

    Ok(())
}

/// Pulls the human-readable message out of a Firebase error body.
///
/// Identity toolkit answers `{"error": {"message": "EMAIL_EXISTS"}}`, the
/// Realtime Database answers `{"error": "Permission denied"}`. Anything else
/// is returned as-is.
pub fn error_message(body: &str) -> String {
    let Ok(value) = serde_json::from_str::<Value>(body) else {
        return body.trim().to_string();
    };

    match value.get("error") {
        Some(Value::String(msg)) => msg.clone(),
        Some(Value::Object(obj)) => obj
            .get("message")
            .and_then(Value::as_str)
            .map_or_else(|| body.trim().to_string(), String::from),
        _ => body.trim().to_string(),
    }
}

/// Handles HTTP error responses and returns appropriate errors.
pub fn handle_http_error(status_code: u16, body: &str, service: Service) -> Error {
    let message = error_message(body);
    match status_code {
        429 => Error::RateLimit(60),
        401 | 403 => Error::Authentication(format!("{} auth failed: {}", service.name(), message)),
        _ => {
            let detail = format!("{} error {}: {}", service.name(), status_code, message);
            match service {
                Service::Identity => Error::Identity(detail),
                Service::Store => Error::Store(detail),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_identity_shape() {
        let body = r#"{"error":{"code":400,"message":"EMAIL_EXISTS","errors":[]}}"#;
        assert_eq!(error_message(body), "EMAIL_EXISTS");
    }

    #[test]
    fn test_error_message_store_shape() {
        assert_eq!(
            error_message(r#"{"error":"Permission denied"}"#),
            "Permission denied"
        );
    }

    #[test]
    fn test_error_message_plain_text() {
        assert_eq!(error_message("  bad gateway \n"), "bad gateway");
    }

    #[test]
    fn test_handle_http_error_rate_limit() {
        let err = handle_http_error(429, "too many requests", Service::Store);
        assert!(matches!(err, Error::RateLimit(60)));
    }

    #[test]
    fn test_handle_http_error_auth() {
        let err = handle_http_error(401, r#"{"error":"Unauthorized request."}"#, Service::Store);
        assert!(matches!(err, Error::Authentication(_)));
        assert!(err.to_string().contains("Unauthorized request."));
    }

    #[test]
    fn test_handle_http_error_routes_by_service() {
        let identity = handle_http_error(400, "{}", Service::Identity);
        assert!(matches!(identity, Error::Identity(_)));

        let store = handle_http_error(500, "internal error", Service::Store);
        assert!(matches!(store, Error::Store(_)));
        assert!(store.to_string().contains("500"));
    }

    #[test]
    fn test_validate_url_valid() {
        assert!(validate_url("http://localhost:9000").is_ok());
        assert!(validate_url("https://demo-default-rtdb.firebaseio.com").is_ok());
    }

    #[test]
    fn test_validate_url_invalid_scheme() {
        assert!(validate_url("ftp://files.example.com").is_err());
        assert!(validate_url("file:///etc/passwd").is_err());
        assert!(validate_url("demo.firebaseio.com").is_err());
    }

    #[test]
    fn test_create_http_client() {
        let client = create_http_client();
        assert!(client.get("http://example.com").build().is_ok());
    }
}
