//! Turns a quiz session into a permanent attempt record.
//!
//! Both exit paths of the countdown funnel through here: a manual submission
//! and the background sweep that fires once the deadline passes. Closing the
//! session row is conditional on it still being active, so the two paths
//! cannot both produce an attempt, and the unique index on
//! `(quiz_id, student_id)` backstops the one-attempt rule even across
//! concurrent client sessions.

use thiserror::Error;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::{AnswerInput, QuizAttempt, QuizSession, User, ATTEMPT_SCHEMA_VERSION};
use crate::db::types::QuizSessionStatus;
use crate::repositories;
use crate::services::scoring::{self, ScoringError};

#[derive(Debug, Clone, Copy)]
pub(crate) enum FinalizeMode {
    ManualSubmit,
    AutoDeadline,
}

#[derive(Debug, Error)]
pub(crate) enum FinalizeError {
    #[error("session is no longer active")]
    SessionAlreadyClosed,
    #[error("quiz already attempted")]
    AlreadyAttempted,
    #[error("quiz not found")]
    QuizNotFound,
    #[error(transparent)]
    InvalidAnswers(#[from] ScoringError),
    #[error(transparent)]
    Persistence(#[from] sqlx::Error),
}

/// Grades and persists the attempt for `session`. `answers` is the payload of
/// a manual submission; the auto-deadline path passes `None` and the answers
/// last auto-saved on the session are graded instead. A short tail of
/// unanswered questions is padded in either case.
pub(crate) async fn finalize_session(
    state: &AppState,
    session: &QuizSession,
    student: &User,
    answers: Option<Vec<AnswerInput>>,
    mode: FinalizeMode,
) -> Result<QuizAttempt, FinalizeError> {
    let now = primitive_now_utc();

    let quiz = repositories::quizzes::find_by_id(state.db(), &session.quiz_id)
        .await?
        .ok_or(FinalizeError::QuizNotFound)?;

    let questions = repositories::questions::list_by_ids(state.db(), &quiz.question_ids.0).await?;

    let provided = answers.unwrap_or_else(|| session.saved_answers.0.clone());
    let padded = scoring::pad_answers(provided, questions.len());
    let graded = scoring::grade(&padded, &questions)?;

    let close_status = match mode {
        FinalizeMode::ManualSubmit => QuizSessionStatus::Submitted,
        FinalizeMode::AutoDeadline => QuizSessionStatus::Expired,
    };

    let closed = repositories::sessions::close(state.db(), &session.id, close_status, now).await?;
    if !closed {
        return Err(FinalizeError::SessionAlreadyClosed);
    }

    let elapsed_seconds = (now.assume_utc().unix_timestamp()
        - session.started_at.assume_utc().unix_timestamp())
    .max(0);
    let time_taken_minutes = (elapsed_seconds as f64 / 60.0).round() as i32;

    let attempt = repositories::attempts::create(
        state.db(),
        repositories::attempts::CreateAttempt {
            id: &Uuid::new_v4().to_string(),
            quiz_id: &quiz.id,
            student_id: &student.id,
            student_name: &student.full_name,
            student_email: &student.email,
            quiz_title: &quiz.title,
            score: graded.score,
            total_questions: graded.total_questions,
            percentage: graded.percentage,
            time_taken_minutes,
            answers: graded.answers,
            date_taken: now,
            schema_version: ATTEMPT_SCHEMA_VERSION,
        },
    )
    .await?
    .ok_or(FinalizeError::AlreadyAttempted)?;

    metrics::counter!("quiz_attempts_created_total").increment(1);

    Ok(attempt)
}
