//! Structured task outputs.
//!
//! Model output is not guaranteed to be well-formed, so parsing is
//! lenient: a completion that does not match the expected shape is handed
//! back as raw text under the field name the shape would have used.

use std::sync::LazyLock;

use regex::Regex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::request::TaskKind;

static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"```json|```").expect("code fence pattern is valid"));

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quiz {
    pub quiz: Vec<QuizQuestion>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub question: String,
    pub options: Vec<String>,
    /// Zero-based index into `options`
    pub correct: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FlashcardDeck {
    pub flashcards: Vec<Flashcard>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flashcard {
    pub front: String,
    pub back: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyPoints {
    pub key_points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub glossary: Option<Vec<GlossaryEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub practice_questions: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlossaryEntry {
    pub term: String,
    pub definition: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudyPlan {
    pub plan: Vec<StudyDay>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub motivation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyDay {
    pub day: u32,
    pub total_minutes: u32,
    pub sessions: Vec<StudySession>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tips: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StudySession {
    pub subject: String,
    pub minutes: u32,
    pub activity: String,
}

/// Remove every code-fence marker and surrounding whitespace.
pub fn strip_code_fence(raw: &str) -> String {
    CODE_FENCE.replace_all(raw, "").trim().to_string()
}

/// Field the payload for a task kind is returned under.
pub fn output_field(kind: TaskKind) -> &'static str {
    match kind {
        TaskKind::Ask => "answer",
        TaskKind::Summarize => "summary",
        TaskKind::Explain => "explanation",
        TaskKind::Quiz | TaskKind::NotesToQuiz => "quiz",
        TaskKind::Flashcards => "flashcards",
        TaskKind::ExtractKeyPoints => "key_points",
        TaskKind::StudyPlan => "plan",
    }
}

/// Shape a completion into the response payload for its task kind.
pub fn shape_output(kind: TaskKind, raw: String) -> Value {
    match kind {
        TaskKind::Ask | TaskKind::Summarize | TaskKind::Explain => {
            json!({ output_field(kind): raw })
        }
        TaskKind::Quiz | TaskKind::NotesToQuiz => parse_or_raw::<Quiz>(kind, raw),
        TaskKind::Flashcards => parse_or_raw::<FlashcardDeck>(kind, raw),
        TaskKind::ExtractKeyPoints => parse_or_raw::<KeyPoints>(kind, raw),
        TaskKind::StudyPlan => parse_or_raw::<StudyPlan>(kind, raw),
    }
}

fn parse_or_raw<T: DeserializeOwned + Serialize>(kind: TaskKind, raw: String) -> Value {
    let cleaned = strip_code_fence(&raw);
    let parsed = serde_json::from_str::<T>(&cleaned)
        .map_err(|e| e.to_string())
        .and_then(|value| serde_json::to_value(value).map_err(|e| e.to_string()));

    match parsed {
        Ok(value) => value,
        Err(e) => {
            tracing::debug!(
                "Structured output for {} did not parse ({}), returning raw text",
                kind,
                e
            );
            json!({ output_field(kind): raw })
        }
    }
}
