//! Maps upstream failures onto the three categories callers act on.
//!
//! Checks run in a fixed order and the first match wins: rate limiting,
//! then authentication, then the generic fallback. Upstream messages can
//! contain tokens from more than one category (a 403 page that mentions
//! `RATE_LIMIT_EXCEEDED`), so the order is part of the contract.

use std::time::Duration;

use super::error::{LlmError, LlmErrorKind};

/// Suggested wait before a client retries a rate-limited request.
pub const RATE_LIMIT_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Advisory shown alongside rate-limit responses.
pub const RATE_LIMIT_HINT: &str =
    "Consider switching to a lighter model or enabling billing for the upstream project.";

pub const RATE_LIMIT_MESSAGE: &str =
    "The AI service has reached its request limit. Please wait a minute before trying again.";

pub const UNAUTHORIZED_MESSAGE: &str =
    "Invalid or expired API key. Please check the GEMINI_API_KEY setting.";

/// Message used when the upstream failure carried no text.
pub const DEFAULT_ERROR_MESSAGE: &str =
    "An unexpected error occurred while processing your request.";

const RATE_LIMIT_TOKENS: [&str; 3] = ["429", "RATE_LIMIT_EXCEEDED", "Quota exceeded"];
const AUTH_TOKENS: [&str; 3] = ["API_KEY", "401", "403"];

/// Outward-facing category of an upstream failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassifiedError {
    RateLimited { retry_after: Duration },
    Unauthorized,
    Generic { message: String },
}

impl ClassifiedError {
    /// Default user-facing message for this category.
    pub fn user_message(&self) -> &str {
        match self {
            ClassifiedError::RateLimited { .. } => RATE_LIMIT_MESSAGE,
            ClassifiedError::Unauthorized => UNAUTHORIZED_MESSAGE,
            ClassifiedError::Generic { message } => message,
        }
    }
}

impl std::fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClassifiedError::RateLimited { retry_after } => {
                write!(f, "rate limited (retry after {}s)", retry_after.as_secs())
            }
            ClassifiedError::Unauthorized => write!(f, "unauthorized"),
            ClassifiedError::Generic { message } => write!(f, "{}", message),
        }
    }
}

/// Classify a bare error message using substring checks only.
pub fn classify_message(message: &str) -> ClassifiedError {
    if contains_any(message, &RATE_LIMIT_TOKENS) {
        return rate_limited();
    }
    if contains_any(message, &AUTH_TOKENS) {
        return ClassifiedError::Unauthorized;
    }
    generic(message)
}

/// Classify an upstream error, consulting its structured status at the
/// same precedence as the message tokens.
pub fn classify(error: &LlmError) -> ClassifiedError {
    if error.kind == LlmErrorKind::RateLimited {
        return rate_limited();
    }
    match classify_message(&error.message) {
        ClassifiedError::Generic { .. } if matches!(error.status_code, Some(401 | 403)) => {
            ClassifiedError::Unauthorized
        }
        classified => classified,
    }
}

fn contains_any(message: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|token| message.contains(token))
}

fn rate_limited() -> ClassifiedError {
    ClassifiedError::RateLimited {
        retry_after: RATE_LIMIT_RETRY_AFTER,
    }
}

fn generic(message: &str) -> ClassifiedError {
    let message = if message.trim().is_empty() {
        DEFAULT_ERROR_MESSAGE.to_string()
    } else {
        message.to_string()
    };
    ClassifiedError::Generic { message }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_tokens() {
        for msg in [
            "[429 Too Many Requests] slow down",
            "reason: RATE_LIMIT_EXCEEDED",
            "Quota exceeded for quota metric 'Generate Content API requests per minute'",
        ] {
            assert_eq!(
                classify_message(msg),
                ClassifiedError::RateLimited {
                    retry_after: Duration::from_secs(60)
                },
                "{msg}"
            );
        }
    }

    #[test]
    fn test_auth_tokens() {
        for msg in [
            "API key not valid. [API_KEY_INVALID]",
            "[401 Unauthorized]",
            "[403 Forbidden] permission denied",
        ] {
            assert_eq!(classify_message(msg), ClassifiedError::Unauthorized, "{msg}");
        }
    }

    #[test]
    fn test_rate_limit_wins_over_auth() {
        let classified = classify_message("[403 Forbidden] RATE_LIMIT_EXCEEDED");
        assert!(matches!(classified, ClassifiedError::RateLimited { .. }));
    }

    #[test]
    fn test_generic_keeps_message() {
        assert_eq!(
            classify_message("model overloaded"),
            ClassifiedError::Generic {
                message: "model overloaded".to_string()
            }
        );
    }

    #[test]
    fn test_empty_message_uses_default() {
        let classified = classify_message("");
        assert_eq!(classified.user_message(), DEFAULT_ERROR_MESSAGE);
    }

    #[test]
    fn test_lowercase_quota_is_generic() {
        assert!(matches!(
            classify_message("quota exceeded"),
            ClassifiedError::Generic { .. }
        ));
    }

    #[test]
    fn test_structured_status_is_consulted() {
        let throttled = LlmError::rate_limited("Resource has been exhausted".to_string());
        assert!(matches!(
            classify(&throttled),
            ClassifiedError::RateLimited { .. }
        ));

        let forbidden = LlmError::client_error(403, "Permission denied".to_string());
        assert_eq!(classify(&forbidden), ClassifiedError::Unauthorized);

        let bad_request = LlmError::client_error(400, "Invalid argument".to_string());
        assert!(matches!(
            classify(&bad_request),
            ClassifiedError::Generic { .. }
        ));
    }

    #[test]
    fn test_rate_limit_precedence_with_structured_fields() {
        // A 401 status with a rate-limit token still classifies as rate limited.
        let err = LlmError::client_error(401, "[401 Unauthorized] Quota exceeded".to_string());
        assert!(matches!(classify(&err), ClassifiedError::RateLimited { .. }));

        let err = LlmError::rate_limited("API_KEY_INVALID".to_string());
        assert!(matches!(classify(&err), ClassifiedError::RateLimited { .. }));
    }

    #[test]
    fn test_display() {
        assert_eq!(rate_limited().to_string(), "rate limited (retry after 60s)");
        assert_eq!(ClassifiedError::Unauthorized.to_string(), "unauthorized");
        assert_eq!(generic("model overloaded").to_string(), "model overloaded");
    }

    #[test]
    fn test_classification_is_deterministic() {
        let err = LlmError::network_error("connection reset".to_string());
        assert_eq!(classify(&err), classify(&err));
    }
}
