//! Typed task requests and their input validation.

use serde::Deserialize;
use thiserror::Error;

/// Rejection raised before any upstream call is made.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct ValidationError(pub &'static str);

/// The fixed set of operations the service performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    Ask,
    Summarize,
    Explain,
    Quiz,
    NotesToQuiz,
    Flashcards,
    ExtractKeyPoints,
    StudyPlan,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::Ask => "ask",
            TaskKind::Summarize => "summarize",
            TaskKind::Explain => "explain",
            TaskKind::Quiz => "quiz",
            TaskKind::NotesToQuiz => "notes-to-quiz",
            TaskKind::Flashcards => "flashcards",
            TaskKind::ExtractKeyPoints => "extract-key-points",
            TaskKind::StudyPlan => "study-plan",
        }
    }
}

impl std::fmt::Display for TaskKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Target length of a summary. Unknown values read as `Medium`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SummaryLength {
    Short,
    #[default]
    Medium,
    Long,
}

impl SummaryLength {
    pub fn parse_lenient(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some("short") => SummaryLength::Short,
            Some("long") => SummaryLength::Long,
            _ => SummaryLength::Medium,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AskRequest {
    #[serde(default)]
    pub question: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SummarizeRequest {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub length: Option<String>,
}

impl SummarizeRequest {
    pub fn length(&self) -> SummaryLength {
        SummaryLength::parse_lenient(self.length.as_deref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExplainRequest {
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
}

/// Quiz generated from a topic.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_item_count")]
    pub question_count: u32,
}

/// Quiz generated from pasted notes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesToQuizRequest {
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default = "default_difficulty")]
    pub difficulty: String,
    #[serde(default = "default_item_count")]
    pub question_count: u32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlashcardsRequest {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default = "default_item_count")]
    pub card_count: u32,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExtractKeyPointsRequest {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyPlanRequest {
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default = "default_minutes_per_day")]
    pub minutes_per_day: u32,
    #[serde(default = "default_days")]
    pub days: u32,
    #[serde(default = "default_goal")]
    pub goal: String,
}

impl StudyPlanRequest {
    /// Subjects with surrounding whitespace removed and blanks dropped.
    pub fn subjects(&self) -> Vec<&str> {
        self.subjects
            .iter()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect()
    }
}

fn default_difficulty() -> String {
    "beginner".to_string()
}

fn default_item_count() -> u32 {
    10
}

fn default_minutes_per_day() -> u32 {
    60
}

fn default_days() -> u32 {
    7
}

fn default_goal() -> String {
    "Improve understanding".to_string()
}

/// A single study task, tagged by kind.
#[derive(Debug, Clone)]
pub enum TaskRequest {
    Ask(AskRequest),
    Summarize(SummarizeRequest),
    Explain(ExplainRequest),
    Quiz(QuizRequest),
    NotesToQuiz(NotesToQuizRequest),
    Flashcards(FlashcardsRequest),
    ExtractKeyPoints(ExtractKeyPointsRequest),
    StudyPlan(StudyPlanRequest),
}

impl TaskRequest {
    pub fn kind(&self) -> TaskKind {
        match self {
            TaskRequest::Ask(_) => TaskKind::Ask,
            TaskRequest::Summarize(_) => TaskKind::Summarize,
            TaskRequest::Explain(_) => TaskKind::Explain,
            TaskRequest::Quiz(_) => TaskKind::Quiz,
            TaskRequest::NotesToQuiz(_) => TaskKind::NotesToQuiz,
            TaskRequest::Flashcards(_) => TaskKind::Flashcards,
            TaskRequest::ExtractKeyPoints(_) => TaskKind::ExtractKeyPoints,
            TaskRequest::StudyPlan(_) => TaskKind::StudyPlan,
        }
    }

    /// Check the primary field is present and not blank.
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            TaskRequest::Ask(r) => require(&r.question, "Question is required"),
            TaskRequest::Summarize(r) => require(&r.text, "Text is required"),
            TaskRequest::Explain(r) => require(&r.concept, "Concept is required"),
            TaskRequest::Quiz(r) => require(&r.topic, "Topic is required"),
            TaskRequest::NotesToQuiz(r) => require(&r.notes, "Notes are required"),
            TaskRequest::Flashcards(r) => require(&r.topic, "Topic is required"),
            TaskRequest::ExtractKeyPoints(r) => require(&r.text, "Text is required"),
            TaskRequest::StudyPlan(r) => {
                if r.subjects().is_empty() {
                    Err(ValidationError("At least one subject is required"))
                } else {
                    Ok(())
                }
            }
        }
    }
}

fn require(field: &Option<String>, message: &'static str) -> Result<(), ValidationError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => Ok(()),
        _ => Err(ValidationError(message)),
    }
}
