//! Completion client module for the upstream generative-language API.
//!
//! This module provides a trait-based abstraction over the upstream
//! provider, with Gemini as the concrete implementation and a retrying
//! wrapper that adds exponential backoff on rate limits.

mod classify;
mod error;
mod gemini;
mod retry;

pub use classify::{
    classify, classify_message, ClassifiedError, DEFAULT_ERROR_MESSAGE, RATE_LIMIT_HINT,
    RATE_LIMIT_MESSAGE, RATE_LIMIT_RETRY_AFTER, UNAUTHORIZED_MESSAGE,
};
pub use error::{classify_http_status, LlmError, LlmErrorKind};
pub use gemini::{GeminiClient, DEFAULT_API_BASE};
pub use retry::{RetryConfig, RetryingClient};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Text produced by the upstream model for one prompt.
#[derive(Debug, Clone)]
pub struct Completion {
    pub text: String,
    pub usage: Option<TokenUsage>,
}

impl Completion {
    /// A completion without usage information.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            usage: None,
        }
    }
}

/// Token usage information (if provided by the upstream provider).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

impl TokenUsage {
    /// Create a usage object ensuring `total_tokens` is consistent.
    pub fn new(prompt_tokens: u64, completion_tokens: u64) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
            total_tokens: prompt_tokens.saturating_add(completion_tokens),
        }
    }
}

/// Trait for completion clients.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate text for a single prompt.
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError>;

    /// Model identifier this client talks to.
    fn model(&self) -> &str;
}
