//! Request gateway: validate, prompt, call upstream, shape the payload.

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;

use crate::llm::{classify, ClassifiedError, CompletionClient};
use crate::task::{shape_output, TaskRequest, ValidationError};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("{0}")]
    InvalidInput(#[from] ValidationError),

    #[error("upstream failure: {0}")]
    Upstream(ClassifiedError),
}

/// Runs study tasks against a completion client.
///
/// The client is expected to carry its own retry policy (see
/// [`crate::llm::RetryingClient`]); the gateway makes one `generate` call
/// per task.
#[derive(Clone)]
pub struct Gateway {
    client: Arc<dyn CompletionClient>,
}

impl Gateway {
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        Self { client }
    }

    pub fn model(&self) -> &str {
        self.client.model()
    }

    pub async fn run(&self, task: TaskRequest) -> Result<Value, GatewayError> {
        task.validate()?;

        let kind = task.kind();
        let prompt = task.prompt();
        tracing::debug!("Running {} task ({} prompt chars)", kind, prompt.len());

        match self.client.generate(&prompt).await {
            Ok(completion) => Ok(shape_output(kind, completion.text)),
            Err(error) => {
                let classified = classify(&error);
                match classified {
                    ClassifiedError::RateLimited { .. } => {
                        tracing::error!("Rate limit error on {} task: {}", kind, error.message)
                    }
                    ClassifiedError::Unauthorized => {
                        tracing::error!("API key error on {} task: {}", kind, error.message)
                    }
                    ClassifiedError::Generic { .. } => {
                        tracing::error!("Upstream error on {} task: {}", kind, error.message)
                    }
                }
                Err(GatewayError::Upstream(classified))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{Completion, LlmError};
    use crate::task::{AskRequest, QuizRequest, StudyPlanRequest};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        outcome: Result<String, LlmError>,
        calls: AtomicUsize,
    }

    impl Fixed {
        fn new(outcome: Result<&str, LlmError>) -> Arc<Self> {
            Arc::new(Self {
                outcome: outcome.map(str::to_string),
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl CompletionClient for Fixed {
        async fn generate(&self, _prompt: &str) -> Result<Completion, LlmError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.outcome.clone().map(Completion::from_text)
        }

        fn model(&self) -> &str {
            "fixed"
        }
    }

    fn ask(question: &str) -> TaskRequest {
        TaskRequest::Ask(AskRequest {
            question: Some(question.to_string()),
        })
    }

    #[tokio::test]
    async fn test_invalid_input_skips_upstream() {
        let upstream = Fixed::new(Ok("unused"));
        let gateway = Gateway::new(upstream.clone());

        let err = gateway.run(ask("   ")).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::InvalidInput(ValidationError("Question is required"))
        );
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_empty_subjects_skip_upstream() {
        let upstream = Fixed::new(Ok("unused"));
        let gateway = Gateway::new(upstream.clone());

        let task = TaskRequest::StudyPlan(StudyPlanRequest {
            subjects: vec![],
            minutes_per_day: 60,
            days: 7,
            goal: "Improve understanding".to_string(),
        });
        assert!(matches!(
            gateway.run(task).await,
            Err(GatewayError::InvalidInput(_))
        ));
        assert_eq!(upstream.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_answer_is_wrapped() {
        let gateway = Gateway::new(Fixed::new(Ok("Because of gravity.")));
        let value = gateway.run(ask("Why do apples fall?")).await.unwrap();
        assert_eq!(value, serde_json::json!({ "answer": "Because of gravity." }));
    }

    #[tokio::test]
    async fn test_unparseable_quiz_is_not_an_error() {
        let gateway = Gateway::new(Fixed::new(Ok("Sorry, here are some questions...")));
        let task = TaskRequest::Quiz(QuizRequest {
            topic: Some("Rivers".to_string()),
            difficulty: "beginner".to_string(),
            question_count: 3,
        });
        let value = gateway.run(task).await.unwrap();
        assert_eq!(value["quiz"], "Sorry, here are some questions...");
    }

    #[tokio::test]
    async fn test_upstream_failure_is_classified() {
        let gateway = Gateway::new(Fixed::new(Err(LlmError::client_error(
            400,
            "[400 Bad Request] API key not valid. [API_KEY_INVALID]".to_string(),
        ))));
        let err = gateway.run(ask("What is a noun?")).await.unwrap_err();
        assert_eq!(err, GatewayError::Upstream(ClassifiedError::Unauthorized));
    }

    #[test]
    fn test_error_display() {
        let err = GatewayError::Upstream(ClassifiedError::Unauthorized);
        assert_eq!(err.to_string(), "upstream failure: unauthorized");

        let err = GatewayError::Upstream(ClassifiedError::Generic {
            message: "model overloaded".to_string(),
        });
        assert_eq!(err.to_string(), "upstream failure: model overloaded");
    }
}
