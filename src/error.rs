/// The main error type for Wayfarer operations
#[derive(Debug, thiserror::Error)]
pub enum WayfarerError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Request timeout")]
    RequestTimeout,

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}

impl WayfarerError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn service_unavailable(msg: impl Into<String>) -> Self {
        Self::ServiceUnavailable(msg.into())
    }

    pub fn request_timeout() -> Self {
        Self::RequestTimeout
    }

    /// Whether re-invoking the failed operation may succeed.
    ///
    /// Mutating subscription actions are never retried automatically;
    /// this only informs what the UI offers the user.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ServiceUnavailable(_) | Self::RequestTimeout
        )
    }
}

/// Result type alias for Wayfarer operations
pub type Result<T> = std::result::Result<T, WayfarerError>;

// Common error type conversions

impl From<serde_json::Error> for WayfarerError {
    fn from(err: serde_json::Error) -> Self {
        // Classify based on error category
        if err.is_data() || err.is_syntax() || err.is_eof() {
            WayfarerError::BadRequest(format!("JSON error: {}", err))
        } else {
            // IO errors are internal
            WayfarerError::Internal(format!("JSON serialization error: {}", err))
        }
    }
}

impl From<reqwest::Error> for WayfarerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WayfarerError::RequestTimeout
        } else if err.is_connect() {
            WayfarerError::ServiceUnavailable(format!("Connection error: {}", err))
        } else if err.is_status() {
            // Map HTTP status codes from the collaborator services
            if let Some(status) = err.status() {
                match status.as_u16() {
                    401 => WayfarerError::Unauthorized("Collaborator authentication failed".to_string()),
                    403 => WayfarerError::Forbidden("Collaborator access denied".to_string()),
                    404 => WayfarerError::NotFound("Collaborator resource not found".to_string()),
                    409 => WayfarerError::Conflict("Collaborator state conflict".to_string()),
                    503 => WayfarerError::ServiceUnavailable("Collaborator unavailable".to_string()),
                    _ => WayfarerError::Internal(format!("Collaborator error: {}", err)),
                }
            } else {
                WayfarerError::Internal(format!("HTTP error: {}", err))
            }
        } else {
            WayfarerError::Internal(format!("Request error: {}", err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = WayfarerError::not_found("Subscription");
        assert!(matches!(err, WayfarerError::NotFound(_)));
        assert_eq!(err.to_string(), "Not found: Subscription");

        let err = WayfarerError::conflict("cancellation already scheduled");
        assert_eq!(err.to_string(), "Conflict: cancellation already scheduled");

        let err = WayfarerError::request_timeout();
        assert_eq!(err.to_string(), "Request timeout");
    }

    #[test]
    fn test_retryable_classification() {
        assert!(WayfarerError::request_timeout().is_retryable());
        assert!(WayfarerError::service_unavailable("down").is_retryable());
        assert!(!WayfarerError::bad_request("nope").is_retryable());
        assert!(!WayfarerError::unauthorized("no token").is_retryable());
    }

    #[test]
    fn test_from_serde_json_syntax_error() {
        let result: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ invalid }");
        let err: WayfarerError = result.unwrap_err().into();
        assert!(matches!(err, WayfarerError::BadRequest(_)));
        assert!(err.to_string().contains("JSON error"));
    }

    #[test]
    fn test_anyhow_error() {
        let err: WayfarerError = anyhow::anyhow!("something unexpected").into();
        assert!(matches!(err, WayfarerError::Anyhow(_)));
    }
}
