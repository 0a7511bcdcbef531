use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use time::PrimitiveDateTime;

use crate::db::types::{QuizSessionStatus, UserRole};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct User {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) hashed_password: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// A multiple-choice question. Once a quiz references it the row is treated as
/// immutable; edits create a replacement question instead.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Question {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Json<Vec<String>>,
    pub(crate) correct_option_index: i32,
    pub(crate) explanation: Option<String>,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) author_id: String,
    pub(crate) created_at: PrimitiveDateTime,
}

/// The question set is fixed at creation; `question_ids` keeps the order the
/// quiz is presented and graded in.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct Quiz {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) time_limit_minutes: i32,
    pub(crate) question_ids: Json<Vec<String>>,
    pub(crate) creator_id: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: PrimitiveDateTime,
}

/// A student's in-progress run at a quiz. The deadline lives server-side:
/// manual submission marks the session `submitted`, the background worker
/// auto-submits anything still `active` past `expires_at`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizSession {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) expires_at: PrimitiveDateTime,
    pub(crate) submitted_at: Option<PrimitiveDateTime>,
    pub(crate) status: QuizSessionStatus,
    pub(crate) saved_answers: Json<Vec<AnswerInput>>,
    pub(crate) created_at: PrimitiveDateTime,
    pub(crate) updated_at: PrimitiveDateTime,
}

/// One graded answer, aligned positionally with the quiz's question list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AnswerRecord {
    pub(crate) question_id: String,
    pub(crate) selected_option_index: Option<i32>,
    pub(crate) is_correct: bool,
}

/// An ungraded answer as submitted or auto-saved by the student.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct AnswerInput {
    #[serde(default, alias = "selectedOptionIndex")]
    pub(crate) selected_option_index: Option<i32>,
}

/// Version written into `schema_version` for new attempt rows. Version 1
/// rows predate the tag and carry the historical score/percentage ambiguity;
/// anything at or above this version stores the canonical triple and needs
/// no heuristics on read.
pub(crate) const ATTEMPT_SCHEMA_VERSION: i32 = 2;

/// A completed attempt. `percentage` is nullable and `total_questions` may be
/// zero on legacy rows; readers run every row through the score normalizer
/// before using it. Immutable after creation except through the repair job.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub(crate) struct QuizAttempt {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) quiz_title: String,
    pub(crate) score: i32,
    pub(crate) total_questions: i32,
    pub(crate) percentage: Option<i32>,
    pub(crate) time_taken_minutes: i32,
    pub(crate) answers: Json<Vec<AnswerRecord>>,
    pub(crate) date_taken: PrimitiveDateTime,
    pub(crate) schema_version: i32,
}
