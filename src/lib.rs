//! # Study Buddy
//!
//! Backend for a chat-style study helper. Student requests (questions,
//! quizzes, flashcards, summaries, study plans) are turned into prompts for
//! the Gemini API and the answers are returned as typed JSON.
//!
//! ## Request Flow
//! 1. Guard: reject with 503 when no `GEMINI_API_KEY` is configured
//! 2. Validate the task's primary field (400 on blank input)
//! 3. Build the prompt and call the upstream model, backing off on rate limits
//! 4. Parse structured output, falling back to raw text
//! 5. Classify upstream failures into 429 / 401 / 500 responses
//!
//! ## Modules
//! - `api`: axum router, handlers and middleware
//! - `gateway`: validation, prompting and response shaping per task
//! - `llm`: Gemini client, retry wrapper and error classification
//! - `task`: request types, prompt templates and structured outputs

pub mod api;
pub mod config;
pub mod gateway;
pub mod llm;
pub mod task;

pub use config::Config;
pub use gateway::{Gateway, GatewayError};
