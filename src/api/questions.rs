use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_lecturer, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::schemas::question::{QuestionCreate, QuestionResponse, QuestionUpdate};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_question).get(list_questions))
        .route("/mine", get(my_questions))
        .route("/:question_id", put(update_question).delete(delete_question))
}

#[derive(Debug, Deserialize)]
struct QuestionListQuery {
    subject: Option<String>,
    chapter: Option<String>,
    #[serde(alias = "authorId")]
    author_id: Option<String>,
}

async fn create_question(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionCreate>,
) -> Result<(StatusCode, Json<QuestionResponse>), ApiError> {
    require_lecturer(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let question = repositories::questions::create(
        state.db(),
        repositories::questions::CreateQuestion {
            id: &Uuid::new_v4().to_string(),
            question_text: &payload.question_text,
            options: payload.options.clone(),
            correct_option_index: payload.correct_option_index,
            explanation: payload.explanation.as_deref(),
            subject: &payload.subject,
            chapter: &payload.chapter,
            author_id: &user.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create question"))?;

    Ok((StatusCode::CREATED, Json(QuestionResponse::from_db(question))))
}

async fn list_questions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<QuestionListQuery>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    require_lecturer(&user)?;

    let questions = repositories::questions::list(
        state.db(),
        repositories::questions::QuestionFilter {
            subject: query.subject.as_deref(),
            chapter: query.chapter.as_deref(),
            author_id: query.author_id.as_deref(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

/// The lecturer's own question bank.
async fn my_questions(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuestionResponse>>, ApiError> {
    require_lecturer(&user)?;

    let questions = repositories::questions::list(
        state.db(),
        repositories::questions::QuestionFilter {
            author_id: Some(&user.id),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    Ok(Json(questions.into_iter().map(QuestionResponse::from_db).collect()))
}

/// Edits a question. A question already referenced by a quiz is immutable so
/// historical attempts stay valid; in that case a replacement question is
/// created and returned while the original row is left alone.
async fn update_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuestionUpdate>,
) -> Result<Json<QuestionResponse>, ApiError> {
    require_lecturer(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if question.author_id != user.id {
        return Err(ApiError::Forbidden("Only the author can edit a question"));
    }

    let referenced = repositories::quizzes::any_referencing_question(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check question references"))?;

    let saved = if referenced {
        repositories::questions::create(
            state.db(),
            repositories::questions::CreateQuestion {
                id: &Uuid::new_v4().to_string(),
                question_text: &payload.question_text,
                options: payload.options.clone(),
                correct_option_index: payload.correct_option_index,
                explanation: payload.explanation.as_deref(),
                subject: &payload.subject,
                chapter: &payload.chapter,
                author_id: &user.id,
                created_at: primitive_now_utc(),
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to create replacement question"))?
    } else {
        repositories::questions::update(
            state.db(),
            &question_id,
            repositories::questions::UpdateQuestion {
                question_text: &payload.question_text,
                options: payload.options.clone(),
                correct_option_index: payload.correct_option_index,
                explanation: payload.explanation.as_deref(),
                subject: &payload.subject,
                chapter: &payload.chapter,
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update question"))?
    };

    Ok(Json(QuestionResponse::from_db(saved)))
}

async fn delete_question(
    Path(question_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_lecturer(&user)?;

    let question = repositories::questions::find_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch question"))?
        .ok_or_else(|| ApiError::NotFound("Question not found".to_string()))?;

    if question.author_id != user.id {
        return Err(ApiError::Forbidden("Only the author can delete a question"));
    }

    repositories::questions::delete_by_id(state.db(), &question_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete question"))?;

    Ok(Json(serde_json::json!({ "message": "Question deleted" })))
}
