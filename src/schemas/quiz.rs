use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::core::time::format_primitive;
use crate::db::models::Quiz;
use crate::schemas::question::QuestionPublic;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizCreate {
    #[validate(length(min = 1, message = "Quiz title is required"))]
    pub(crate) title: String,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub(crate) subject: String,
    #[validate(length(min = 1, message = "Chapter is required"))]
    pub(crate) chapter: String,
    #[serde(alias = "timeLimitMinutes")]
    #[validate(range(min = 1, message = "Time limit must be greater than 0"))]
    pub(crate) time_limit_minutes: i32,
    #[serde(alias = "questionIds")]
    #[validate(length(min = 1, message = "At least one question is required"))]
    pub(crate) question_ids: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuizGenerate {
    #[validate(length(min = 1, message = "Subject is required"))]
    pub(crate) subject: String,
    #[validate(length(min = 1, message = "Chapter is required"))]
    pub(crate) chapter: String,
    #[serde(alias = "numberOfQuestions")]
    #[validate(range(min = 1, message = "Number of questions must be greater than 0"))]
    pub(crate) number_of_questions: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct QuizStatusUpdate {
    #[serde(alias = "isActive")]
    pub(crate) is_active: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct QuizResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) time_limit_minutes: i32,
    pub(crate) question_ids: Vec<String>,
    pub(crate) question_count: usize,
    pub(crate) creator_id: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl QuizResponse {
    pub(crate) fn from_db(quiz: Quiz) -> Self {
        let question_count = quiz.question_ids.0.len();
        Self {
            id: quiz.id,
            title: quiz.title,
            subject: quiz.subject,
            chapter: quiz.chapter,
            time_limit_minutes: quiz.time_limit_minutes,
            question_ids: quiz.question_ids.0,
            question_count,
            creator_id: quiz.creator_id,
            is_active: quiz.is_active,
            created_at: format_primitive(quiz.created_at),
        }
    }
}

/// Quiz as listed for a student: no question ids, plus whether they already
/// used their single attempt.
#[derive(Debug, Serialize)]
pub(crate) struct QuizListItem {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) time_limit_minutes: i32,
    pub(crate) question_count: usize,
    pub(crate) attempted: bool,
    pub(crate) created_at: String,
}

impl QuizListItem {
    pub(crate) fn from_db(quiz: Quiz, attempted: bool) -> Self {
        Self {
            id: quiz.id,
            title: quiz.title,
            subject: quiz.subject,
            chapter: quiz.chapter,
            time_limit_minutes: quiz.time_limit_minutes,
            question_count: quiz.question_ids.0.len(),
            attempted,
            created_at: format_primitive(quiz.created_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct GeneratedQuiz {
    pub(crate) question_ids: Vec<String>,
}

/// Response to starting a quiz session: the ticking deadline plus the
/// questions with their answer keys withheld.
#[derive(Debug, Serialize)]
pub(crate) struct QuizSessionResponse {
    pub(crate) session_id: String,
    pub(crate) quiz_id: String,
    pub(crate) title: String,
    pub(crate) time_limit_minutes: i32,
    pub(crate) started_at: String,
    pub(crate) expires_at: String,
    pub(crate) questions: Vec<QuestionPublic>,
}
