use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::db::models::AnswerInput;
use crate::services::normalize::NormalizedAttempt;

#[derive(Debug, Deserialize)]
pub(crate) struct AnswersPayload {
    pub(crate) answers: Vec<AnswerInput>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptResponse {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) quiz_title: String,
    pub(crate) score: i32,
    pub(crate) correct_answers: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: i32,
    pub(crate) time_taken_minutes: i32,
    pub(crate) date_taken: String,
}

impl AttemptResponse {
    pub(crate) fn from_normalized(attempt: NormalizedAttempt) -> Self {
        Self {
            id: attempt.id,
            quiz_id: attempt.quiz_id,
            quiz_title: attempt.quiz_title,
            score: attempt.score,
            correct_answers: attempt.score,
            total_questions: attempt.total_questions,
            percentage: attempt.percentage,
            time_taken_minutes: attempt.time_taken_minutes,
            date_taken: format_primitive(attempt.date_taken),
        }
    }
}

/// A graded answer enriched with the question's correct index and
/// explanation, shown when a student reviews their own finished attempt.
#[derive(Debug, Serialize)]
pub(crate) struct ReviewedAnswer {
    pub(crate) question_id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) selected_option_index: Option<i32>,
    pub(crate) correct_option_index: i32,
    pub(crate) is_correct: bool,
    pub(crate) explanation: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct AttemptDetailResponse {
    #[serde(flatten)]
    pub(crate) summary: AttemptResponse,
    pub(crate) answers: Vec<ReviewedAnswer>,
}
