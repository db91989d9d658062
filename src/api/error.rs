//! Outward error taxonomy and its HTTP mapping.

use std::time::Duration;

use axum::{
    extract::rejection::JsonRejection,
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

use super::types::ErrorResponse;
use crate::gateway::GatewayError;
use crate::llm::{ClassifiedError, RATE_LIMIT_HINT, RATE_LIMIT_MESSAGE, UNAUTHORIZED_MESSAGE};

/// Whole seconds a client should wait, rounded up and never below one.
pub(crate) fn wait_secs(wait: Duration) -> u64 {
    let secs = wait.as_secs() + u64::from(wait.subsec_nanos() > 0);
    secs.max(1)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Missing or blank required field, or an unreadable body (400)
    InvalidInput { error: String, message: String },
    /// Body over the configured size limit (413)
    PayloadTooLarge,
    /// No upstream credential configured (503)
    ServiceUnavailable,
    /// Upstream throttling (429)
    RateLimited { retry_after: Duration },
    /// Inbound request limit for this client hit (429)
    TooManyRequests { retry_after: Duration },
    /// Bad or expired upstream credential (401)
    Unauthorized,
    /// Anything else (500)
    Generic { message: String },
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::RateLimited { .. } | ApiError::TooManyRequests { .. } => {
                StatusCode::TOO_MANY_REQUESTS
            }
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Generic { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            ApiError::RateLimited { retry_after } | ApiError::TooManyRequests { retry_after } => {
                Some(*retry_after)
            }
            _ => None,
        }
    }

    pub fn body(&self) -> ErrorResponse {
        let (error, message, details) = match self {
            ApiError::InvalidInput { error, message } => (error.clone(), message.clone(), None),
            ApiError::PayloadTooLarge => (
                "Request body too large".to_string(),
                "The request body exceeds the allowed size. Try sending less text.".to_string(),
                None,
            ),
            ApiError::ServiceUnavailable => (
                "GEMINI_API_KEY is not set".to_string(),
                "Please set your API key as an environment variable before using AI features. \
                 In development, create a .env file and add: GEMINI_API_KEY=<your key>"
                    .to_string(),
                None,
            ),
            ApiError::RateLimited { .. } => (
                "Rate limit exceeded".to_string(),
                RATE_LIMIT_MESSAGE.to_string(),
                Some(RATE_LIMIT_HINT.to_string()),
            ),
            ApiError::TooManyRequests { .. } => (
                "Too many requests, please try again later.".to_string(),
                "You are sending requests too quickly. Please slow down.".to_string(),
                None,
            ),
            ApiError::Unauthorized => (
                "Authentication failed".to_string(),
                UNAUTHORIZED_MESSAGE.to_string(),
                None,
            ),
            ApiError::Generic { message } => {
                ("AI service error".to_string(), message.clone(), None)
            }
        };

        ErrorResponse {
            error,
            message,
            details,
            retry_after: self.retry_after().map(wait_secs),
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let body = self.body();
        write!(f, "{} ({}): {}", body.error, self.status(), body.message)
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status(), Json(self.body())).into_response();
        if let Some(retry_after) = self.retry_after() {
            if let Ok(value) = HeaderValue::from_str(&wait_secs(retry_after).to_string()) {
                response.headers_mut().insert(header::RETRY_AFTER, value);
            }
        }
        response
    }
}

impl From<ClassifiedError> for ApiError {
    fn from(classified: ClassifiedError) -> Self {
        match classified {
            ClassifiedError::RateLimited { retry_after } => ApiError::RateLimited { retry_after },
            ClassifiedError::Unauthorized => ApiError::Unauthorized,
            ClassifiedError::Generic { message } => ApiError::Generic { message },
        }
    }
}

impl From<GatewayError> for ApiError {
    fn from(error: GatewayError) -> Self {
        match error {
            GatewayError::InvalidInput(e) => ApiError::InvalidInput {
                error: e.to_string(),
                message: "Please fill in the required field and try again.".to_string(),
            },
            GatewayError::Upstream(classified) => classified.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        ApiError::InvalidInput {
            error: "Invalid request body".to_string(),
            message: rejection.body_text(),
        }
    }
}
