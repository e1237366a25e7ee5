use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Unified error type for the proxy pool manager
#[derive(Error, Debug)]
pub enum PoolError {
    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database connection failed: {0}")]
    DatabaseConnection(String),

    // Coordination cache errors
    #[error("Cache error: {0}")]
    Cache(#[from] redis::RedisError),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    // Validation errors
    #[error("Proxy not found: {id}")]
    ProxyNotFound { id: i64 },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid proxy address: {0}")]
    InvalidProxyAddress(String),

    #[error("Unsupported proxy protocol: {0}")]
    UnsupportedProtocol(String),

    // Outbound HTTP errors (validator, crawler)
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Request timed out")]
    Timeout,

    // Adapter / crawl errors
    #[error("Adapter '{name}' failed: {reason}")]
    AdapterFailed { name: String, reason: String },

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    // Request errors
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for pool manager operations
pub type Result<T> = std::result::Result<T, PoolError>;

impl PoolError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            PoolError::InvalidRequest(_)
            | PoolError::InvalidProxyAddress(_)
            | PoolError::UnsupportedProtocol(_)
            | PoolError::InvalidConfig(_) => StatusCode::BAD_REQUEST,

            // 404 Not Found
            PoolError::ProxyNotFound { .. } | PoolError::NotFound(_) => StatusCode::NOT_FOUND,

            // 504 Gateway Timeout
            PoolError::Timeout => StatusCode::GATEWAY_TIMEOUT,

            // 502 Bad Gateway
            PoolError::AdapterFailed { .. } | PoolError::Http(_) => StatusCode::BAD_GATEWAY,

            // 503 Service Unavailable
            PoolError::DatabaseConnection(_) | PoolError::CacheUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }

            // 500 Internal Server Error
            PoolError::Database(_)
            | PoolError::Cache(_)
            | PoolError::Io(_)
            | PoolError::MissingEnvVar(_)
            | PoolError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Check if this is a client error (4xx)
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Check if this is a server error (5xx)
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

// Implement IntoResponse for API error responses
impl IntoResponse for PoolError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = json!({
            "success": false,
            "error": self.to_string(),
        });

        (status, Json(body)).into_response()
    }
}

// Convert from URL parse errors
impl From<url::ParseError> for PoolError {
    fn from(err: url::ParseError) -> Self {
        PoolError::InvalidProxyAddress(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_code_mapping() {
        assert_eq!(
            PoolError::InvalidRequest("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PoolError::InvalidProxyAddress("bad".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PoolError::ProxyNotFound { id: 1 }.status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(PoolError::Timeout.status_code(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(
            PoolError::CacheUnavailable("down".into()).status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            PoolError::AdapterFailed {
                name: "src-a".into(),
                reason: "timeout".into()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
    }

    #[test]
    fn test_error_client_server_helpers() {
        assert!(PoolError::InvalidRequest("bad".to_string()).is_client_error());
        assert!(!PoolError::InvalidRequest("bad".to_string()).is_server_error());

        assert!(PoolError::CacheUnavailable("down".into()).is_server_error());
        assert!(!PoolError::CacheUnavailable("down".into()).is_client_error());
    }

    #[test]
    fn test_into_response_wraps_success_false() {
        let resp = PoolError::NotFound("proxy 1".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
