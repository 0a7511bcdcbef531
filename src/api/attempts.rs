use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::db::models::{QuizAttempt, User};
use crate::db::types::UserRole;
use crate::repositories;
use crate::schemas::attempt::{AttemptDetailResponse, AttemptResponse, ReviewedAnswer};
use crate::services::normalize;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_attempts))
        .route("/:attempt_id", get(get_attempt))
}

#[derive(Debug, Deserialize)]
struct AttemptListQuery {
    #[serde(alias = "studentId")]
    student_id: Option<String>,
    #[serde(alias = "quizId")]
    quiz_id: Option<String>,
}

/// Attempts visible to the caller. Students always get their own history;
/// lecturers get the attempts on quizzes they created, optionally narrowed to
/// one quiz.
async fn list_attempts(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<AttemptListQuery>,
) -> Result<Json<Vec<AttemptResponse>>, ApiError> {
    let rows = match user.role {
        UserRole::Student => repositories::attempts::list(
            state.db(),
            repositories::attempts::AttemptFilter {
                student_id: Some(&user.id),
                quiz_id: query.quiz_id.as_deref(),
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?,
        UserRole::Lecturer => {
            if let Some(quiz_id) = query.quiz_id.as_deref() {
                verify_quiz_owner(&state, quiz_id, &user).await?;
                repositories::attempts::list(
                    state.db(),
                    repositories::attempts::AttemptFilter {
                        student_id: query.student_id.as_deref(),
                        quiz_id: Some(quiz_id),
                    },
                )
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?
            } else {
                let quizzes = repositories::quizzes::list_by_creator(state.db(), &user.id)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to fetch quizzes"))?;
                let quiz_ids: Vec<String> = quizzes.into_iter().map(|quiz| quiz.id).collect();
                repositories::attempts::list_by_quiz_ids(state.db(), &quiz_ids)
                    .await
                    .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?
            }
        }
        UserRole::Admin => repositories::attempts::list(
            state.db(),
            repositories::attempts::AttemptFilter {
                student_id: query.student_id.as_deref(),
                quiz_id: query.quiz_id.as_deref(),
            },
        )
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?,
    };

    let responses = rows
        .iter()
        .map(|row| AttemptResponse::from_normalized(normalize::normalize_attempt(row)))
        .collect();

    Ok(Json(responses))
}

/// One attempt with its answers spelled out against the questions, including
/// the correct options and explanations. Visible to the student who took it
/// and the lecturer who owns the quiz.
async fn get_attempt(
    Path(attempt_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AttemptDetailResponse>, ApiError> {
    let attempt = repositories::attempts::find_by_id(state.db(), &attempt_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempt"))?
        .ok_or_else(|| ApiError::NotFound("Attempt not found".to_string()))?;

    authorize_attempt_access(&state, &attempt, &user).await?;

    let question_ids: Vec<String> =
        attempt.answers.0.iter().map(|answer| answer.question_id.clone()).collect();
    let questions = repositories::questions::list_by_ids(state.db(), &question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    let answers = attempt
        .answers
        .0
        .iter()
        .map(|record| {
            let question = questions.iter().find(|q| q.id == record.question_id);
            ReviewedAnswer {
                question_id: record.question_id.clone(),
                question_text: question.map(|q| q.question_text.clone()).unwrap_or_default(),
                options: question.map(|q| q.options.0.clone()).unwrap_or_default(),
                selected_option_index: record.selected_option_index,
                correct_option_index: question.map(|q| q.correct_option_index).unwrap_or(-1),
                is_correct: record.is_correct,
                explanation: question.and_then(|q| q.explanation.clone()),
            }
        })
        .collect();

    Ok(Json(AttemptDetailResponse {
        summary: AttemptResponse::from_normalized(normalize::normalize_attempt(&attempt)),
        answers,
    }))
}

async fn authorize_attempt_access(
    state: &AppState,
    attempt: &QuizAttempt,
    user: &User,
) -> Result<(), ApiError> {
    match user.role {
        UserRole::Admin => Ok(()),
        UserRole::Student => {
            if attempt.student_id == user.id {
                Ok(())
            } else {
                Err(ApiError::Forbidden("Not your attempt"))
            }
        }
        UserRole::Lecturer => verify_quiz_owner(state, &attempt.quiz_id, user).await,
    }
}

async fn verify_quiz_owner(
    state: &AppState,
    quiz_id: &str,
    user: &User,
) -> Result<(), ApiError> {
    let quiz = repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    if quiz.creator_id == user.id {
        Ok(())
    } else {
        Err(ApiError::Forbidden("Only the quiz creator can view these results"))
    }
}
