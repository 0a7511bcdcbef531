use sqlx::PgPool;

use crate::db::models::Quiz;

pub(crate) const COLUMNS: &str = "\
    id, title, subject, chapter, time_limit_minutes, question_ids, \
    creator_id, is_active, created_at";

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!("SELECT {COLUMNS} FROM quizzes WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list_active(pool: &PgPool) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {COLUMNS} FROM quizzes WHERE is_active ORDER BY created_at DESC"
    ))
    .fetch_all(pool)
    .await
}

pub(crate) async fn list_by_creator(
    pool: &PgPool,
    creator_id: &str,
) -> Result<Vec<Quiz>, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "SELECT {COLUMNS} FROM quizzes WHERE creator_id = $1 ORDER BY created_at DESC"
    ))
    .bind(creator_id)
    .fetch_all(pool)
    .await
}

/// True when any quiz still references the question; such questions are
/// treated as immutable.
pub(crate) async fn any_referencing_question(
    pool: &PgPool,
    question_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM quizzes WHERE question_ids ? $1)",
    )
    .bind(question_id)
    .fetch_one(pool)
    .await
}

pub(crate) struct CreateQuiz<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub subject: &'a str,
    pub chapter: &'a str,
    pub time_limit_minutes: i32,
    pub question_ids: Vec<String>,
    pub creator_id: &'a str,
    pub is_active: bool,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(pool: &PgPool, params: CreateQuiz<'_>) -> Result<Quiz, sqlx::Error> {
    sqlx::query_as::<_, Quiz>(&format!(
        "INSERT INTO quizzes (
            id, title, subject, chapter, time_limit_minutes, question_ids,
            creator_id, is_active, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.title)
    .bind(params.subject)
    .bind(params.chapter)
    .bind(params.time_limit_minutes)
    .bind(sqlx::types::Json(params.question_ids))
    .bind(params.creator_id)
    .bind(params.is_active)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn set_active(
    pool: &PgPool,
    id: &str,
    is_active: bool,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("UPDATE quizzes SET is_active = $1 WHERE id = $2")
        .bind(is_active)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
