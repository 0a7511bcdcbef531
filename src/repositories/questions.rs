use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::Question;

pub(crate) const COLUMNS: &str = "\
    id, question_text, options, correct_option_index, explanation, \
    subject, chapter, author_id, created_at";

#[derive(Debug, Default)]
pub(crate) struct QuestionFilter<'a> {
    pub(crate) subject: Option<&'a str>,
    pub(crate) chapter: Option<&'a str>,
    pub(crate) author_id: Option<&'a str>,
}

pub(crate) async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Question>, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub(crate) async fn list(
    pool: &PgPool,
    filter: QuestionFilter<'_>,
) -> Result<Vec<Question>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM questions WHERE 1 = 1"));

    if let Some(subject) = filter.subject {
        builder.push(" AND subject = ");
        builder.push_bind(subject);
    }
    if let Some(chapter) = filter.chapter {
        builder.push(" AND chapter = ");
        builder.push_bind(chapter);
    }
    if let Some(author_id) = filter.author_id {
        builder.push(" AND author_id = ");
        builder.push_bind(author_id);
    }

    builder.push(" ORDER BY created_at DESC");
    builder.build_query_as::<Question>().fetch_all(pool).await
}

/// Fetches questions by id, returned in the order the ids were requested so
/// positional answer alignment survives; unknown ids are skipped.
pub(crate) async fn list_by_ids(
    pool: &PgPool,
    ids: &[String],
) -> Result<Vec<Question>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let mut fetched =
        sqlx::query_as::<_, Question>(&format!("SELECT {COLUMNS} FROM questions WHERE id = ANY($1)"))
            .bind(ids)
            .fetch_all(pool)
            .await?;

    let mut ordered = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(pos) = fetched.iter().position(|q| &q.id == id) {
            ordered.push(fetched.swap_remove(pos));
        }
    }

    Ok(ordered)
}

pub(crate) struct CreateQuestion<'a> {
    pub id: &'a str,
    pub question_text: &'a str,
    pub options: Vec<String>,
    pub correct_option_index: i32,
    pub explanation: Option<&'a str>,
    pub subject: &'a str,
    pub chapter: &'a str,
    pub author_id: &'a str,
    pub created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "INSERT INTO questions (
            id, question_text, options, correct_option_index, explanation,
            subject, chapter, author_id, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.question_text)
    .bind(sqlx::types::Json(params.options))
    .bind(params.correct_option_index)
    .bind(params.explanation)
    .bind(params.subject)
    .bind(params.chapter)
    .bind(params.author_id)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) struct UpdateQuestion<'a> {
    pub question_text: &'a str,
    pub options: Vec<String>,
    pub correct_option_index: i32,
    pub explanation: Option<&'a str>,
    pub subject: &'a str,
    pub chapter: &'a str,
}

pub(crate) async fn update(
    pool: &PgPool,
    id: &str,
    params: UpdateQuestion<'_>,
) -> Result<Question, sqlx::Error> {
    sqlx::query_as::<_, Question>(&format!(
        "UPDATE questions SET
            question_text = $1,
            options = $2,
            correct_option_index = $3,
            explanation = $4,
            subject = $5,
            chapter = $6
         WHERE id = $7
         RETURNING {COLUMNS}",
    ))
    .bind(params.question_text)
    .bind(sqlx::types::Json(params.options))
    .bind(params.correct_option_index)
    .bind(params.explanation)
    .bind(params.subject)
    .bind(params.chapter)
    .bind(id)
    .fetch_one(pool)
    .await
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM questions WHERE id = $1").bind(id).execute(pool).await?;
    Ok(result.rows_affected() > 0)
}
