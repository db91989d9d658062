//! Study task definitions.
//!
//! - `request`: typed request bodies and validation
//! - `prompt`: prompt templates per task kind
//! - `output`: structured output shapes and lenient parsing

pub mod output;
mod prompt;
pub mod request;

pub use output::{shape_output, strip_code_fence};
pub use request::{
    AskRequest, ExplainRequest, ExtractKeyPointsRequest, FlashcardsRequest, NotesToQuizRequest,
    QuizRequest, StudyPlanRequest, SummarizeRequest, SummaryLength, TaskKind, TaskRequest,
    ValidationError,
};
