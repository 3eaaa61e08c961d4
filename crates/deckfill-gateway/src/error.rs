//! Error types for gateway construction and status mapping

use deckfill_core::GatewayError;
use serde::Deserialize;
use thiserror::Error;

/// Errors building a client
#[derive(Error, Debug)]
pub enum ClientError {
    /// The HTTP client could not be created
    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    /// No access token was found
    #[error("No access token: set {0}")]
    MissingToken(String),
}

/// Result type for client construction
pub type Result<T> = std::result::Result<T, ClientError>;

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
}

/// Map a failed HTTP status to a gateway error
///
/// The message is taken from the API's `{"error": {"message": ...}}` body
/// when there is one, and from the raw body otherwise.
pub fn error_for_status(status: u16, body: &str) -> GatewayError {
    let message = serde_json::from_str::<ErrorBody>(body)
        .map(|b| b.error.message)
        .ok()
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| body.trim().to_string());
    let message = format!("HTTP {}: {}", status, message);

    match status {
        400 => GatewayError::InvalidOperation(message),
        401 | 403 => GatewayError::PermissionDenied(message),
        404 => GatewayError::NotFound(message),
        413 => GatewayError::PayloadTooLarge {
            size: 0,
            limit: deckfill_core::MAX_BATCH_BYTES,
        },
        429 => GatewayError::RateLimited(message),
        _ => GatewayError::Transient(message),
    }
}

/// Map a transport failure to a gateway error
pub fn error_for_transport(err: reqwest::Error) -> GatewayError {
    if err.is_decode() {
        GatewayError::Malformed(err.to_string())
    } else {
        GatewayError::Transient(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(error_for_status(400, ""), GatewayError::InvalidOperation(_)));
        assert!(matches!(error_for_status(401, ""), GatewayError::PermissionDenied(_)));
        assert!(matches!(error_for_status(403, ""), GatewayError::PermissionDenied(_)));
        assert!(matches!(error_for_status(404, ""), GatewayError::NotFound(_)));
        assert!(matches!(error_for_status(413, ""), GatewayError::PayloadTooLarge { .. }));
        assert!(matches!(error_for_status(429, ""), GatewayError::RateLimited(_)));
        assert!(matches!(error_for_status(500, ""), GatewayError::Transient(_)));
        assert!(matches!(error_for_status(503, ""), GatewayError::Transient(_)));
    }

    #[test]
    fn test_message_from_error_body() {
        let body = r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#;
        assert_eq!(
            error_for_status(404, body),
            GatewayError::NotFound("HTTP 404: Requested entity was not found.".to_string())
        );
        assert_eq!(
            error_for_status(500, "upstream timeout\n"),
            GatewayError::Transient("HTTP 500: upstream timeout".to_string())
        );
    }
}
