use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::{AnswerRecord, QuizAttempt};

pub(crate) const COLUMNS: &str = "\
    id, quiz_id, student_id, student_name, student_email, quiz_title, \
    score, total_questions, percentage, time_taken_minutes, answers, date_taken, \
    schema_version";

#[derive(Debug, Default)]
pub(crate) struct AttemptFilter<'a> {
    pub(crate) student_id: Option<&'a str>,
    pub(crate) quiz_id: Option<&'a str>,
}

pub(crate) struct CreateAttempt<'a> {
    pub id: &'a str,
    pub quiz_id: &'a str,
    pub student_id: &'a str,
    pub student_name: &'a str,
    pub student_email: &'a str,
    pub quiz_title: &'a str,
    pub score: i32,
    pub total_questions: i32,
    pub percentage: i32,
    pub time_taken_minutes: i32,
    pub answers: Vec<AnswerRecord>,
    pub date_taken: PrimitiveDateTime,
    pub schema_version: i32,
}

/// Conditional insert keyed on the `(quiz_id, student_id)` unique index.
/// Returns `None` when the student already has an attempt for the quiz, so
/// two racing submissions cannot both be written.
pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAttempt<'_>,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "INSERT INTO quiz_attempts (
            id, quiz_id, student_id, student_name, student_email, quiz_title,
            score, total_questions, percentage, time_taken_minutes, answers, date_taken,
            schema_version
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11,$12,$13)
        ON CONFLICT (quiz_id, student_id) DO NOTHING
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.quiz_id)
    .bind(params.student_id)
    .bind(params.student_name)
    .bind(params.student_email)
    .bind(params.quiz_title)
    .bind(params.score)
    .bind(params.total_questions)
    .bind(params.percentage)
    .bind(params.time_taken_minutes)
    .bind(sqlx::types::Json(params.answers))
    .bind(params.date_taken)
    .bind(params.schema_version)
    .fetch_optional(pool)
    .await
}

/// Advisory existence check. The unique index is what actually enforces
/// one-attempt-per-student; this only exists for friendly pre-flight errors
/// and the dashboard's "attempted" badge.
pub(crate) async fn has_attempted(
    pool: &PgPool,
    student_id: &str,
    quiz_id: &str,
) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM quiz_attempts WHERE student_id = $1 AND quiz_id = $2)",
    )
    .bind(student_id)
    .bind(quiz_id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_by_id(
    pool: &PgPool,
    id: &str,
) -> Result<Option<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!("SELECT {COLUMNS} FROM quiz_attempts WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: AttemptFilter<'_>,
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM quiz_attempts WHERE 1 = 1"));

    if let Some(student_id) = filter.student_id {
        builder.push(" AND student_id = ");
        builder.push_bind(student_id);
    }
    if let Some(quiz_id) = filter.quiz_id {
        builder.push(" AND quiz_id = ");
        builder.push_bind(quiz_id);
    }

    builder.push(" ORDER BY date_taken DESC");
    builder.build_query_as::<QuizAttempt>().fetch_all(pool).await
}

pub(crate) async fn list_by_quiz_ids(
    pool: &PgPool,
    quiz_ids: &[String],
) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    if quiz_ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts WHERE quiz_id = ANY($1) ORDER BY date_taken DESC"
    ))
    .bind(quiz_ids)
    .fetch_all(pool)
    .await
}

/// Full scan for the repair job.
pub(crate) async fn list_all(pool: &PgPool) -> Result<Vec<QuizAttempt>, sqlx::Error> {
    sqlx::query_as::<_, QuizAttempt>(&format!(
        "SELECT {COLUMNS} FROM quiz_attempts ORDER BY date_taken"
    ))
    .fetch_all(pool)
    .await
}

/// Partial rewrite used exclusively by the repair job; attempts are immutable
/// through every other path.
pub(crate) async fn apply_repair(
    executor: impl sqlx::PgExecutor<'_>,
    id: &str,
    score: Option<i32>,
    percentage: Option<i32>,
    total_questions: Option<i32>,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE quiz_attempts SET
            score = COALESCE($1, score),
            percentage = COALESCE($2, percentage),
            total_questions = COALESCE($3, total_questions)
         WHERE id = $4",
    )
    .bind(score)
    .bind(percentage)
    .bind(total_questions)
    .bind(id)
    .execute(executor)
    .await?;
    Ok(())
}
