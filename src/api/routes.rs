//! HTTP route handlers.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::middleware;
use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderName, HeaderValue},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::Value;
use tower_http::cors::CorsLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::gateway::Gateway;
use crate::llm::{CompletionClient, GeminiClient, RetryingClient};
use crate::task::{
    AskRequest, ExplainRequest, ExtractKeyPointsRequest, FlashcardsRequest, NotesToQuizRequest,
    QuizRequest, StudyPlanRequest, SummarizeRequest, TaskRequest,
};

use super::error::ApiError;
use super::middleware::{rate_limit, require_api_key, RateLimiter};
use super::types::HealthResponse;

/// Task endpoints with a one-line description, as listed by `/health`.
const ENDPOINTS: [(&str, &str); 8] = [
    ("/ask", "Ask AI questions"),
    ("/generate-quiz", "Generate quizzes"),
    ("/summarize", "Summarize text"),
    ("/generate-flashcards", "Create flashcards"),
    ("/explain", "Explain concepts"),
    ("/study-plan", "Generate a multi-day plan"),
    ("/notes-to-quiz", "Quiz from pasted notes"),
    ("/extract-key-points", "Key takeaways, glossary, practice"),
];

const SECURITY_HEADERS: [(&str, &str); 6] = [
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "SAMEORIGIN"),
    ("referrer-policy", "no-referrer"),
    ("cross-origin-opener-policy", "same-origin"),
    ("strict-transport-security", "max-age=15552000; includeSubDomains"),
    ("x-dns-prefetch-control", "off"),
];

/// Shared application state.
pub struct AppState {
    pub config: Config,
    /// Runs study tasks against the upstream model
    pub gateway: Gateway,
    /// Inbound request limiter
    pub limiter: RateLimiter,
}

impl AppState {
    /// Build state around an upstream client; the client is wrapped with
    /// the configured retry policy.
    pub fn new(config: Config, upstream: Arc<dyn CompletionClient>) -> Arc<Self> {
        let client = Arc::new(RetryingClient::new(upstream, config.retry.clone()));
        Arc::new(Self {
            gateway: Gateway::new(client),
            limiter: RateLimiter::new(config.rate_limit.clone()),
            config,
        })
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let task_routes = Router::new()
        .route("/ask", post(ask))
        .route("/generate-quiz", post(generate_quiz))
        .route("/summarize", post(summarize))
        .route("/generate-flashcards", post(generate_flashcards))
        .route("/explain", post(explain))
        .route("/study-plan", post(study_plan))
        .route("/notes-to-quiz", post(notes_to_quiz))
        .route("/extract-key-points", post(extract_key_points))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            require_api_key,
        ));

    let mut app = Router::new()
        .route("/health", get(health))
        .merge(task_routes)
        .layer(middleware::from_fn_with_state(
            Arc::clone(&state),
            rate_limit,
        ))
        .layer(DefaultBodyLimit::max(state.config.body_limit))
        .with_state(Arc::clone(&state));

    for (name, value) in SECURITY_HEADERS {
        app = app.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ));
    }

    app.layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

/// Start the HTTP server.
pub async fn serve(config: Config) -> anyhow::Result<()> {
    if !config.has_api_key() {
        tracing::warn!("GEMINI_API_KEY is not set; task endpoints will answer 503");
    }

    let upstream = Arc::new(GeminiClient::with_options(
        config.api_key.clone().unwrap_or_default(),
        config.model.clone(),
        config.api_base.clone(),
        config.upstream_timeout,
    ));
    let state = AppState::new(config.clone(), upstream);
    let app = router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check: http://{}/health", addr);
    tracing::info!("Using model: {}", config.model);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

/// Wait for SIGINT or SIGTERM.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, finishing in-flight requests...");
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "AI Study Buddy Backend is running!".to_string(),
        model: state.gateway.model().to_string(),
        has_api_key: state.config.has_api_key(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        endpoints: ENDPOINTS
            .iter()
            .map(|(path, about)| format!("POST {} - {}", path, about))
            .collect(),
    })
}

async fn run(state: &AppState, task: TaskRequest) -> Result<Json<Value>, ApiError> {
    let value = state.gateway.run(task).await?;
    Ok(Json(value))
}

async fn ask(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    run(&state, TaskRequest::Ask(req)).await
}

async fn summarize(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    run(&state, TaskRequest::Summarize(req)).await
}

async fn explain(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExplainRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    run(&state, TaskRequest::Explain(req)).await
}

async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    body: Result<Json<QuizRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    run(&state, TaskRequest::Quiz(req)).await
}

async fn notes_to_quiz(
    State(state): State<Arc<AppState>>,
    body: Result<Json<NotesToQuizRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    run(&state, TaskRequest::NotesToQuiz(req)).await
}

async fn generate_flashcards(
    State(state): State<Arc<AppState>>,
    body: Result<Json<FlashcardsRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    run(&state, TaskRequest::Flashcards(req)).await
}

async fn extract_key_points(
    State(state): State<Arc<AppState>>,
    body: Result<Json<ExtractKeyPointsRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    run(&state, TaskRequest::ExtractKeyPoints(req)).await
}

async fn study_plan(
    State(state): State<Arc<AppState>>,
    body: Result<Json<StudyPlanRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = body?;
    run(&state, TaskRequest::StudyPlan(req)).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_listing_matches_routes() {
        let paths: Vec<&str> = ENDPOINTS.iter().map(|(p, _)| *p).collect();
        assert_eq!(paths.len(), 8);
        assert!(paths.contains(&"/notes-to-quiz"));
        assert!(paths.contains(&"/extract-key-points"));
    }

    #[test]
    fn test_security_header_values_are_valid() {
        for (name, value) in SECURITY_HEADERS {
            assert!(HeaderName::from_bytes(name.as_bytes()).is_ok(), "{name}");
            assert!(HeaderValue::from_str(value).is_ok(), "{value}");
        }
    }
}
