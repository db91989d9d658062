//! Upstream error types with retry classification.
//!
//! The upstream SDK surface only gives callers a message string, so the
//! message always carries the HTTP status token and any reason codes the
//! upstream returned. The structured `kind` is derived from the status when
//! one exists.

/// Error from a completion call.
#[derive(Debug, Clone)]
pub struct LlmError {
    /// The kind of error
    pub kind: LlmErrorKind,
    /// HTTP status code, if applicable
    pub status_code: Option<u16>,
    /// Error message
    pub message: String,
}

impl LlmError {
    /// Create a rate limit error.
    pub fn rate_limited(message: String) -> Self {
        Self {
            kind: LlmErrorKind::RateLimited,
            status_code: Some(429),
            message,
        }
    }

    /// Create a server error.
    pub fn server_error(status_code: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::ServerError,
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a client error (bad request, auth, etc.).
    pub fn client_error(status_code: u16, message: String) -> Self {
        Self {
            kind: LlmErrorKind::ClientError,
            status_code: Some(status_code),
            message,
        }
    }

    /// Create a network error.
    pub fn network_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::NetworkError,
            status_code: None,
            message,
        }
    }

    /// Create a parse error.
    pub fn parse_error(message: String) -> Self {
        Self {
            kind: LlmErrorKind::ParseError,
            status_code: None,
            message,
        }
    }

    /// Build an error from an HTTP status and the message to carry.
    pub fn from_status(status_code: u16, message: String) -> Self {
        match classify_http_status(status_code) {
            LlmErrorKind::RateLimited => Self::rate_limited(message),
            LlmErrorKind::ClientError => Self::client_error(status_code, message),
            _ => Self::server_error(status_code, message),
        }
    }

    /// Whether the completion client should back off and try again.
    ///
    /// Matches on the structured kind first, then on the message tokens
    /// the upstream SDK uses for throttling (`429`, `RATE_LIMIT`).
    pub fn is_rate_limited(&self) -> bool {
        self.kind == LlmErrorKind::RateLimited || is_retryable_message(&self.message)
    }
}

impl std::fmt::Display for LlmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.status_code {
            Some(code) => write!(f, "{} (HTTP {}): {}", self.kind, code, self.message),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for LlmError {}

/// Classification of upstream errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmErrorKind {
    /// Rate limited (429)
    RateLimited,
    /// Server error (500, 502, 503, 504)
    ServerError,
    /// Client error (400, 401, 403, 404)
    ClientError,
    /// Network error (connection failed, timeout)
    NetworkError,
    /// Response could not be turned into text
    ParseError,
}

impl std::fmt::Display for LlmErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LlmErrorKind::RateLimited => write!(f, "Rate limited"),
            LlmErrorKind::ServerError => write!(f, "Server error"),
            LlmErrorKind::ClientError => write!(f, "Client error"),
            LlmErrorKind::NetworkError => write!(f, "Network error"),
            LlmErrorKind::ParseError => write!(f, "Parse error"),
        }
    }
}

/// Parse HTTP status code into error kind.
pub fn classify_http_status(status: u16) -> LlmErrorKind {
    match status {
        429 => LlmErrorKind::RateLimited,
        500 | 502 | 503 | 504 => LlmErrorKind::ServerError,
        400..=499 => LlmErrorKind::ClientError,
        _ => LlmErrorKind::ServerError,
    }
}

/// Message tokens that make a failure worth retrying. Case-sensitive.
fn is_retryable_message(message: &str) -> bool {
    message.contains("429") || message.contains("RATE_LIMIT")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_classification() {
        assert_eq!(classify_http_status(429), LlmErrorKind::RateLimited);
        assert_eq!(classify_http_status(500), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(503), LlmErrorKind::ServerError);
        assert_eq!(classify_http_status(400), LlmErrorKind::ClientError);
        assert_eq!(classify_http_status(401), LlmErrorKind::ClientError);
        assert_eq!(classify_http_status(403), LlmErrorKind::ClientError);
        assert_eq!(classify_http_status(302), LlmErrorKind::ServerError);
    }

    #[test]
    fn test_rate_limit_detection_from_message() {
        let err = LlmError::network_error("[429 Too Many Requests] slow down".to_string());
        assert!(err.is_rate_limited());

        let err = LlmError::client_error(400, "reason: RATE_LIMIT_EXCEEDED".to_string());
        assert!(err.is_rate_limited());

        // Matching is case-sensitive.
        let err = LlmError::client_error(400, "rate_limit_exceeded".to_string());
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_rate_limit_detection_from_status() {
        let err = LlmError::from_status(429, "Resource has been exhausted".to_string());
        assert_eq!(err.kind, LlmErrorKind::RateLimited);
        assert!(err.is_rate_limited());

        let err = LlmError::from_status(401, "API key not valid".to_string());
        assert_eq!(err.kind, LlmErrorKind::ClientError);
        assert!(!err.is_rate_limited());
    }

    #[test]
    fn test_display_includes_status() {
        let err = LlmError::server_error(503, "overloaded".to_string());
        assert_eq!(err.to_string(), "Server error (HTTP 503): overloaded");

        let err = LlmError::network_error("connection refused".to_string());
        assert_eq!(err.to_string(), "Network error: connection refused");
    }
}
