//! Request guards: upstream credential check and inbound rate limiting.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{HeaderMap, HeaderName, HeaderValue, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::sync::Mutex;
use tokio::time::Instant;

use super::error::{wait_secs, ApiError};
use super::routes::AppState;
use crate::config::RateLimitConfig;

/// Window entries are swept once the table grows past this size.
const SWEEP_THRESHOLD: usize = 10_000;

/// Rejects task calls with 503 when no upstream credential is configured.
pub async fn require_api_key(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    if !state.config.has_api_key() {
        tracing::warn!(
            "Rejecting {} {}: GEMINI_API_KEY is not set",
            req.method(),
            req.uri().path()
        );
        return ApiError::ServiceUnavailable.into_response();
    }
    next.run(req).await
}

/// Fixed-window request counter per client key.
pub struct RateLimiter {
    config: RateLimitConfig,
    windows: Mutex<HashMap<String, Window>>,
}

struct Window {
    started: Instant,
    count: u32,
}

/// Outcome of counting one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateDecision {
    pub allowed: bool,
    pub limit: u32,
    pub remaining: u32,
    /// Time until the current window closes
    pub reset: Duration,
}

impl RateDecision {
    /// Set the `RateLimit-*` headers on a response.
    pub fn apply_headers(&self, headers: &mut HeaderMap) {
        let reset_secs = wait_secs(self.reset);
        for (name, value) in [
            ("ratelimit-limit", self.limit as u64),
            ("ratelimit-remaining", self.remaining as u64),
            ("ratelimit-reset", reset_secs),
        ] {
            if let Ok(value) = HeaderValue::from_str(&value.to_string()) {
                headers.insert(HeaderName::from_static(name), value);
            }
        }
    }
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Count a request from `key` and decide whether it may proceed.
    pub async fn check(&self, key: &str) -> RateDecision {
        let now = Instant::now();
        let window_len = self.config.window;
        let limit = self.config.max_requests;

        let mut windows = self.windows.lock().await;
        if windows.len() > SWEEP_THRESHOLD {
            windows.retain(|_, w| now.duration_since(w.started) < window_len);
        }

        let window = windows.entry(key.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(window.started) >= window_len {
            window.started = now;
            window.count = 0;
        }

        let reset = window_len.saturating_sub(now.duration_since(window.started));
        if window.count >= limit {
            return RateDecision {
                allowed: false,
                limit,
                remaining: 0,
                reset,
            };
        }

        window.count += 1;
        RateDecision {
            allowed: true,
            limit,
            remaining: limit - window.count,
            reset,
        }
    }
}

/// Applies the inbound rate limit, keyed by peer IP address.
pub async fn rate_limit(
    State(state): State<Arc<AppState>>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let key = client_key(&req);
    let decision = state.limiter.check(&key).await;

    if decision.allowed {
        let mut response = next.run(req).await;
        decision.apply_headers(response.headers_mut());
        response
    } else {
        tracing::warn!("Inbound rate limit hit for {}", key);
        rejection(&decision)
    }
}

/// 429 response for a request the limiter turned away.
fn rejection(decision: &RateDecision) -> Response {
    let mut response = ApiError::TooManyRequests {
        retry_after: decision.reset,
    }
    .into_response();
    decision.apply_headers(response.headers_mut());
    response
}

/// Peer IP when the server was started with connect info, otherwise a
/// shared bucket.
fn client_key(req: &Request<Body>) -> String {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
