use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::{AnswerInput, QuizSession};
use crate::db::types::QuizSessionStatus;

pub(crate) const COLUMNS: &str = "\
    id, quiz_id, student_id, started_at, expires_at, submitted_at, status, \
    saved_answers, created_at, updated_at";

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<QuizSession>, sqlx::Error> {
    sqlx::query_as::<_, QuizSession>(&format!("SELECT {COLUMNS} FROM quiz_sessions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn find_active_for_student(
    pool: &PgPool,
    quiz_id: &str,
    student_id: &str,
) -> Result<Option<QuizSession>, sqlx::Error> {
    sqlx::query_as::<_, QuizSession>(&format!(
        "SELECT {COLUMNS} FROM quiz_sessions
         WHERE quiz_id = $1 AND student_id = $2 AND status = $3"
    ))
    .bind(quiz_id)
    .bind(student_id)
    .bind(QuizSessionStatus::Active)
    .fetch_optional(pool)
    .await
}

pub(crate) struct CreateSession<'a> {
    pub id: &'a str,
    pub quiz_id: &'a str,
    pub student_id: &'a str,
    pub started_at: PrimitiveDateTime,
    pub expires_at: PrimitiveDateTime,
    pub created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateSession<'_>,
) -> Result<QuizSession, sqlx::Error> {
    sqlx::query_as::<_, QuizSession>(&format!(
        "INSERT INTO quiz_sessions (
            id, quiz_id, student_id, started_at, expires_at, status,
            saved_answers, created_at, updated_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.student_id)
    .bind(params.started_at)
    .bind(params.expires_at)
    .bind(QuizSessionStatus::Active)
    .bind(sqlx::types::Json(Vec::<AnswerInput>::new()))
    .bind(params.created_at)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn save_answers(
    pool: &PgPool,
    id: &str,
    answers: &[AnswerInput],
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_sessions SET saved_answers = $1, updated_at = $2
         WHERE id = $3 AND status = $4",
    )
    .bind(sqlx::types::Json(answers.to_vec()))
    .bind(now)
    .bind(id)
    .bind(QuizSessionStatus::Active)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Closes an active session on the given exit path (manual submit or expiry
/// sweep). Returns false when the session was already closed, which makes
/// both paths race-safe against each other.
pub(crate) async fn close(
    pool: &PgPool,
    id: &str,
    status: QuizSessionStatus,
    now: PrimitiveDateTime,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE quiz_sessions SET status = $1, submitted_at = $2, updated_at = $3
         WHERE id = $4 AND status = $5",
    )
    .bind(status)
    .bind(now)
    .bind(now)
    .bind(id)
    .bind(QuizSessionStatus::Active)
    .execute(pool)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn list_expired_active(
    pool: &PgPool,
    now: PrimitiveDateTime,
) -> Result<Vec<QuizSession>, sqlx::Error> {
    sqlx::query_as::<_, QuizSession>(&format!(
        "SELECT {COLUMNS} FROM quiz_sessions
         WHERE status = $1 AND expires_at < $2
         ORDER BY expires_at"
    ))
    .bind(QuizSessionStatus::Active)
    .bind(now)
    .fetch_all(pool)
    .await
}
