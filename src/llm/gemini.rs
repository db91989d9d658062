//! Gemini `generateContent` client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::LlmError;
use super::{Completion, CompletionClient, TokenUsage};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini REST client. Makes exactly one upstream call per `generate`;
/// wrap it in a `RetryingClient` for backoff.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    api_base: String,
}

impl GeminiClient {
    pub fn with_options(
        api_key: String,
        model: String,
        api_base: String,
        timeout: Duration,
    ) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!("Failed to build tuned HTTP client ({}), using defaults", e);
                Client::new()
            });

        Self {
            client,
            api_key,
            model,
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.api_base, self.model
        )
    }
}

#[async_trait]
impl CompletionClient for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<Completion, LlmError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        tracing::debug!("Sending request to Gemini: model={}", self.model);

        let response = match self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(LlmError::network_error(format!("Request timeout: {}", e)));
                } else if e.is_connect() {
                    return Err(LlmError::network_error(format!("Connection failed: {}", e)));
                } else {
                    return Err(LlmError::network_error(format!("Request failed: {}", e)));
                }
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::from_status(
                status.as_u16(),
                error_message(status, &body),
            ));
        }

        let completion = parse_response(&body)?;
        if let Some(ref usage) = completion.usage {
            tracing::debug!(
                "Gemini usage: prompt={} completion={} total={}",
                usage.prompt_tokens,
                usage.completion_tokens,
                usage.total_tokens
            );
        }
        Ok(completion)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

/// Decode a successful response body.
///
/// The error message names only the failure category. Body text and
/// line/column positions stay out of it so stray digits cannot trip
/// message-based classification.
fn parse_response(body: &str) -> Result<Completion, LlmError> {
    let parsed: GenerateContentResponse = serde_json::from_str(body).map_err(|e| {
        tracing::debug!("Unparseable Gemini response ({} bytes): {}", body.len(), e);
        LlmError::parse_error(format!("Failed to parse response ({:?} error)", e.classify()))
    })?;
    parsed.into_completion()
}

/// Render an upstream failure as `[<code> <reason>] <message> [<REASON>, ...]`.
///
/// The status token and the `ErrorInfo` reasons stay in the text so that
/// message-based classification sees `429`, `RATE_LIMIT_EXCEEDED`,
/// `API_KEY_INVALID` and friends.
fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    let status_token = format!(
        "[{} {}]",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );

    let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) else {
        let body = body.trim();
        return if body.is_empty() {
            status_token
        } else {
            format!("{} {}", status_token, body)
        };
    };

    let mut message = format!("{} {}", status_token, envelope.error.message);
    let reasons: Vec<&str> = envelope
        .error
        .details
        .iter()
        .filter_map(|d| d.reason.as_deref())
        .collect();
    if !reasons.is_empty() {
        message.push_str(&format!(" [{}]", reasons.join(", ")));
    } else if let Some(ref status_name) = envelope.error.status {
        message.push_str(&format!(" [{}]", status_name));
    }
    message
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

impl GenerateContentResponse {
    fn into_completion(self) -> Result<Completion, LlmError> {
        if let Some(reason) = self.prompt_feedback.and_then(|f| f.block_reason) {
            return Err(LlmError::parse_error(format!(
                "Response was blocked due to {}",
                reason
            )));
        }

        let candidate = self
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::parse_error("No candidates in response".to_string()))?;

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();

        if text.is_empty() {
            let reason = candidate.finish_reason.unwrap_or_else(|| "unknown".to_string());
            return Err(LlmError::parse_error(format!(
                "Candidate has no text (finish reason: {})",
                reason
            )));
        }

        Ok(Completion {
            text,
            usage: self
                .usage_metadata
                .map(|u| TokenUsage::new(u.prompt_token_count, u.candidates_token_count)),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    details: Vec<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    reason: Option<String>,
}
