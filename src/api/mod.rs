//! HTTP API for the study buddy backend.
//!
//! ## Endpoints
//!
//! - `POST /ask` - Answer a question in simple words
//! - `POST /summarize` - Summarize text
//! - `POST /explain` - Explain a concept
//! - `POST /generate-quiz` - Multiple-choice quiz on a topic
//! - `POST /notes-to-quiz` - Multiple-choice quiz from pasted notes
//! - `POST /generate-flashcards` - Flashcards on a topic
//! - `POST /extract-key-points` - Key points, glossary and practice questions
//! - `POST /study-plan` - Multi-day study plan
//! - `GET /health` - Health check (no upstream call)

mod error;
mod middleware;
mod routes;
pub mod types;

pub use error::ApiError;
pub use middleware::{RateDecision, RateLimiter};
pub use routes::{router, serve, AppState};
pub use types::*;
