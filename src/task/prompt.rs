//! Prompt templates. Fixed text with the request fields interpolated.

use super::request::{SummaryLength, TaskRequest};

const AUDIENCE: &str = "6th grade student";

impl TaskRequest {
    /// Build the upstream prompt. Assumes `validate` has passed.
    pub fn prompt(&self) -> String {
        match self {
            TaskRequest::Ask(r) => format!(
                "You are a study buddy for a {AUDIENCE}. Explain this in very simple words, \
                 using short sentences and a friendly tone. If the question is complex, \
                 break it into steps: {}",
                field(&r.question)
            ),
            TaskRequest::Summarize(r) => {
                let length = match r.length() {
                    SummaryLength::Short => "in 2-3 short sentences",
                    SummaryLength::Medium => "in 1 short paragraph",
                    SummaryLength::Long => "in simple detailed paragraphs",
                };
                format!(
                    "Summarize the following text {length} for a {AUDIENCE}. Make it easy to \
                     understand and include a simple example if useful:\n{}",
                    field(&r.text)
                )
            }
            TaskRequest::Explain(r) => {
                let context = match r.context.as_deref().map(str::trim) {
                    Some(c) if !c.is_empty() => format!(" Context: {c}"),
                    _ => String::new(),
                };
                format!(
                    "You are a friendly teacher. Explain \"{}\" to a {AUDIENCE} in simple \
                     terms.{context} Use examples, analogies, and simple language. Make it \
                     engaging and easy to understand.",
                    field(&r.concept)
                )
            }
            TaskRequest::Quiz(r) => format!(
                "Create a {} level quiz about \"{}\" with {} multiple choice questions.\n\
                 Format your response as JSON with this structure:\n\
                 {{\n  \"quiz\": [\n    {{\n      \"question\": \"Question text\",\n      \
                 \"options\": [\"A\", \"B\", \"C\", \"D\"],\n      \"correct\": 0,\n      \
                 \"explanation\": \"Why this is correct\"\n    }}\n  ]\n}}\n\
                 Keep it simple for {AUDIENCE} level.",
                r.difficulty,
                field(&r.topic),
                r.question_count
            ),
            TaskRequest::NotesToQuiz(r) => format!(
                "From the following notes, create a {} quiz with {} multiple-choice questions \
                 (A-D). Keep it {AUDIENCE} friendly. Return JSON {{\"quiz\": [{{\"question\":\
                 \"...\",\"options\":[\"A\",\"B\",\"C\",\"D\"],\"correct\":0,\"explanation\":\
                 \"...\"}}]}}.\nNotes:\n{}",
                r.difficulty,
                r.question_count,
                field(&r.notes)
            ),
            TaskRequest::Flashcards(r) => format!(
                "Create {} flashcards about \"{}\" for a {AUDIENCE}.\nFormat as JSON:\n\
                 {{\n  \"flashcards\": [\n    {{\n      \"front\": \"Question or term\",\n      \
                 \"back\": \"Answer or definition\",\n      \"hint\": \"Optional helpful hint\"\n\
                 \x20   }}\n  ]\n}}\nMake them educational, fun, and age-appropriate.",
                r.card_count,
                field(&r.topic)
            ),
            TaskRequest::ExtractKeyPoints(r) => format!(
                "Read the text and return JSON with key points (5-10 bullets in simple \
                 language), glossary (term + definition), and 3 practice questions. Keep it \
                 for a {AUDIENCE}.\n{{\n  \"key_points\": [\"...\"],\n  \"glossary\": \
                 [{{\"term\":\"...\",\"definition\":\"...\"}}],\n  \"practice_questions\": \
                 [\"...\"]\n}}\nText:\n{}",
                field(&r.text)
            ),
            TaskRequest::StudyPlan(r) => format!(
                "Create a {}-day simple study plan for a {AUDIENCE}. They have {} minutes per \
                 day. Subjects: {}. Goal: {}.\nReturn JSON like:\n{{\n  \"plan\": [\n    \
                 {{ \"day\": 1, \"totalMinutes\": 60, \"sessions\": [ {{ \"subject\": \"Math\", \
                 \"minutes\": 20, \"activity\": \"Practice fractions\" }} ], \"tips\": \
                 [\"...\"] }}\n  ],\n  \"motivation\": \"one short friendly sentence\"\n}}",
                r.days,
                r.minutes_per_day,
                r.subjects().join(", "),
                r.goal
            ),
        }
    }
}

fn field(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use crate::task::request::*;

    #[test]
    fn test_summary_length_instruction() {
        let task = TaskRequest::Summarize(SummarizeRequest {
            text: Some("Photosynthesis is how plants make food.".to_string()),
            length: Some("short".to_string()),
        });
        let prompt = task.prompt();
        assert!(prompt.contains("in 2-3 short sentences"));
        assert!(prompt.ends_with("Photosynthesis is how plants make food."));
    }

    #[test]
    fn test_explain_context_is_optional() {
        let without = TaskRequest::Explain(ExplainRequest {
            concept: Some("gravity".to_string()),
            context: None,
        });
        assert!(!without.prompt().contains("Context:"));

        let with = TaskRequest::Explain(ExplainRequest {
            concept: Some("gravity".to_string()),
            context: Some("We are studying planets".to_string()),
        });
        assert!(with.prompt().contains("Context: We are studying planets"));
    }

    #[test]
    fn test_quiz_prompt_interpolates_fields() {
        let task = TaskRequest::Quiz(QuizRequest {
            topic: Some("Volcanoes".to_string()),
            difficulty: "advanced".to_string(),
            question_count: 4,
        });
        let prompt = task.prompt();
        assert!(prompt.starts_with("Create a advanced level quiz about \"Volcanoes\" with 4"));
        assert!(prompt.contains("\"quiz\": ["));
    }

    #[test]
    fn test_study_plan_lists_subjects() {
        let task = TaskRequest::StudyPlan(StudyPlanRequest {
            subjects: vec!["Math".to_string(), " ".to_string(), "Science".to_string()],
            minutes_per_day: 45,
            days: 5,
            goal: "Pass the test".to_string(),
        });
        let prompt = task.prompt();
        assert!(prompt.contains("Create a 5-day simple study plan"));
        assert!(prompt.contains("45 minutes per day"));
        assert!(prompt.contains("Subjects: Math, Science. Goal: Pass the test."));
    }
}
