use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, patch, post, put},
    Json, Router,
};
use time::Duration;
use uuid::Uuid;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{require_lecturer, require_student, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Quiz, QuizSession, User};
use crate::db::types::QuizSessionStatus;
use crate::repositories;
use crate::schemas::attempt::{AnswersPayload, AttemptResponse};
use crate::schemas::question::QuestionPublic;
use crate::schemas::quiz::{
    GeneratedQuiz, QuizCreate, QuizGenerate, QuizListItem, QuizResponse, QuizSessionResponse,
    QuizStatusUpdate,
};
use crate::services::attempt_finalize::{self, FinalizeError, FinalizeMode};
use crate::services::normalize;
use crate::services::quiz_builder;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_quiz).get(list_quizzes))
        .route("/generate", post(generate_quiz))
        .route("/mine", get(my_quizzes))
        .route("/:quiz_id", get(get_quiz))
        .route("/:quiz_id/status", patch(set_quiz_status))
        .route("/:quiz_id/attempted", get(quiz_attempted))
        .route("/:quiz_id/start", post(start_quiz))
        .route("/sessions/:session_id/answers", put(save_answers))
        .route("/sessions/:session_id/submit", post(submit_quiz))
}

async fn create_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizCreate>,
) -> Result<(StatusCode, Json<QuizResponse>), ApiError> {
    require_lecturer(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let questions = repositories::questions::list_by_ids(state.db(), &payload.question_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz questions"))?;

    if questions.len() != payload.question_ids.len() {
        return Err(ApiError::BadRequest("One or more questions do not exist".to_string()));
    }

    let quiz = repositories::quizzes::create(
        state.db(),
        repositories::quizzes::CreateQuiz {
            id: &Uuid::new_v4().to_string(),
            title: &payload.title,
            subject: &payload.subject,
            chapter: &payload.chapter,
            time_limit_minutes: payload.time_limit_minutes,
            question_ids: payload.question_ids.clone(),
            creator_id: &user.id,
            is_active: true,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create quiz"))?;

    Ok((StatusCode::CREATED, Json(QuizResponse::from_db(quiz))))
}

/// Draws a random question set matching the requested subject and chapter.
/// The returned ids can be passed straight to quiz creation.
async fn generate_quiz(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizGenerate>,
) -> Result<Json<GeneratedQuiz>, ApiError> {
    require_lecturer(&user)?;
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let available = repositories::questions::list(
        state.db(),
        repositories::questions::QuestionFilter {
            subject: Some(&payload.subject),
            chapter: Some(&payload.chapter),
            ..Default::default()
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch questions"))?;

    let question_ids = quiz_builder::generate(
        &payload.subject,
        &payload.chapter,
        payload.number_of_questions as usize,
        &available,
    )
    .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(Json(GeneratedQuiz { question_ids }))
}

/// Active quizzes as a student sees them, flagged with whether their single
/// attempt is already used.
async fn list_quizzes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizListItem>>, ApiError> {
    require_student(&user)?;

    let quizzes = repositories::quizzes::list_active(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quizzes"))?;

    let attempts = repositories::attempts::list(
        state.db(),
        repositories::attempts::AttemptFilter { student_id: Some(&user.id), ..Default::default() },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?;

    let items = quizzes
        .into_iter()
        .map(|quiz| {
            let attempted = attempts.iter().any(|a| a.quiz_id == quiz.id);
            QuizListItem::from_db(quiz, attempted)
        })
        .collect();

    Ok(Json(items))
}

async fn my_quizzes(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<QuizResponse>>, ApiError> {
    require_lecturer(&user)?;

    let quizzes = repositories::quizzes::list_by_creator(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quizzes"))?;

    Ok(Json(quizzes.into_iter().map(QuizResponse::from_db).collect()))
}

async fn get_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizResponse>, ApiError> {
    require_lecturer(&user)?;
    let quiz = fetch_owned_quiz(&state, &quiz_id, &user).await?;
    Ok(Json(QuizResponse::from_db(quiz)))
}

/// Hides or re-lists a quiz without touching its history.
async fn set_quiz_status(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<QuizStatusUpdate>,
) -> Result<Json<QuizResponse>, ApiError> {
    require_lecturer(&user)?;
    let mut quiz = fetch_owned_quiz(&state, &quiz_id, &user).await?;

    repositories::quizzes::set_active(state.db(), &quiz_id, payload.is_active)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to update quiz status"))?;

    quiz.is_active = payload.is_active;
    Ok(Json(QuizResponse::from_db(quiz)))
}

async fn quiz_attempted(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_student(&user)?;

    let attempted = repositories::attempts::has_attempted(state.db(), &user.id, &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check quiz attempt"))?;

    Ok(Json(serde_json::json!({ "has_attempted": attempted })))
}

/// Opens a quiz session with a server-side deadline. Re-entering a quiz with
/// an open session resumes it rather than resetting the clock.
async fn start_quiz(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizSessionResponse>, ApiError> {
    require_student(&user)?;

    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .filter(|quiz| quiz.is_active)
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    let attempted = repositories::attempts::has_attempted(state.db(), &user.id, &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to check quiz attempt"))?;
    if attempted {
        return Err(ApiError::Conflict("You have already attempted this quiz".to_string()));
    }

    if let Some(existing) =
        repositories::sessions::find_active_for_student(state.db(), &quiz_id, &user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to fetch quiz session"))?
    {
        return session_response(&state, existing, &quiz).await;
    }

    let now = primitive_now_utc();
    let created = repositories::sessions::create(
        state.db(),
        repositories::sessions::CreateSession {
            id: &Uuid::new_v4().to_string(),
            quiz_id: &quiz_id,
            student_id: &user.id,
            started_at: now,
            expires_at: now + Duration::minutes(quiz.time_limit_minutes as i64),
            created_at: now,
        },
    )
    .await;

    let session = match created {
        Ok(session) => session,
        // Two tabs racing the start: the partial unique index on active
        // sessions rejects the second insert, so resume the first.
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            repositories::sessions::find_active_for_student(state.db(), &quiz_id, &user.id)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to fetch quiz session"))?
                .ok_or_else(|| {
                    ApiError::Internal("Quiz session vanished during start".to_string())
                })?
        }
        Err(err) => return Err(ApiError::internal(err, "Failed to start quiz session")),
    };

    session_response(&state, session, &quiz).await
}

async fn save_answers(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswersPayload>,
) -> Result<Json<serde_json::Value>, ApiError> {
    require_student(&user)?;
    let session = fetch_own_session(&state, &session_id, &user).await?;

    if session.status != QuizSessionStatus::Active {
        return Err(ApiError::Conflict("Quiz session is no longer active".to_string()));
    }

    if past_deadline(&state, &session) {
        return Err(ApiError::Conflict("Quiz session has expired".to_string()));
    }

    validate_answer_indices(&payload)?;

    repositories::sessions::save_answers(
        state.db(),
        &session.id,
        &payload.answers,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to save answers"))?;

    Ok(Json(serde_json::json!({ "message": "Answers saved" })))
}

async fn submit_quiz(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswersPayload>,
) -> Result<Json<AttemptResponse>, ApiError> {
    require_student(&user)?;
    let session = fetch_own_session(&state, &session_id, &user).await?;

    if session.status != QuizSessionStatus::Active {
        return Err(ApiError::Conflict("Quiz already submitted".to_string()));
    }

    validate_answer_indices(&payload)?;

    // Past the grace window the submission payload no longer counts; the
    // session is closed as expired and whatever was auto-saved is graded,
    // exactly as the background sweep would have done.
    let (answers, mode) = if past_deadline(&state, &session) {
        tracing::warn!(session_id = %session.id, "Late submission; grading auto-saved answers");
        (None, FinalizeMode::AutoDeadline)
    } else {
        (Some(payload.answers), FinalizeMode::ManualSubmit)
    };

    let attempt = attempt_finalize::finalize_session(&state, &session, &user, answers, mode)
        .await
        .map_err(map_finalize_error)?;

    Ok(Json(AttemptResponse::from_normalized(normalize::normalize_attempt(&attempt))))
}

fn map_finalize_error(err: FinalizeError) -> ApiError {
    match err {
        FinalizeError::SessionAlreadyClosed => {
            ApiError::Conflict("Quiz already submitted".to_string())
        }
        FinalizeError::AlreadyAttempted => {
            ApiError::Conflict("You have already attempted this quiz".to_string())
        }
        FinalizeError::QuizNotFound => ApiError::NotFound("Quiz not found".to_string()),
        FinalizeError::InvalidAnswers(err) => ApiError::BadRequest(err.to_string()),
        FinalizeError::Persistence(err) => ApiError::internal(err, "Failed to submit quiz"),
    }
}

fn past_deadline(state: &AppState, session: &QuizSession) -> bool {
    let grace = Duration::seconds(state.settings().quiz().submit_grace_seconds as i64);
    primitive_now_utc() > session.expires_at + grace
}

fn validate_answer_indices(payload: &AnswersPayload) -> Result<(), ApiError> {
    let valid = payload
        .answers
        .iter()
        .all(|answer| answer.selected_option_index.map_or(true, |idx| (0..=3).contains(&idx)));

    if valid {
        Ok(())
    } else {
        Err(ApiError::BadRequest("Selected option must be between 0 and 3".to_string()))
    }
}

async fn session_response(
    state: &AppState,
    session: QuizSession,
    quiz: &Quiz,
) -> Result<Json<QuizSessionResponse>, ApiError> {
    let questions = repositories::questions::list_by_ids(state.db(), &quiz.question_ids.0)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz questions"))?;

    Ok(Json(QuizSessionResponse {
        session_id: session.id,
        quiz_id: quiz.id.clone(),
        title: quiz.title.clone(),
        time_limit_minutes: quiz.time_limit_minutes,
        started_at: format_primitive(session.started_at),
        expires_at: format_primitive(session.expires_at),
        questions: questions.into_iter().map(QuestionPublic::from_db).collect(),
    }))
}

async fn fetch_owned_quiz(
    state: &AppState,
    quiz_id: &str,
    user: &User,
) -> Result<Quiz, ApiError> {
    let quiz = repositories::quizzes::find_by_id(state.db(), quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    if quiz.creator_id != user.id && user.role != crate::db::types::UserRole::Admin {
        return Err(ApiError::Forbidden("Only the quiz creator can manage this quiz"));
    }

    Ok(quiz)
}

async fn fetch_own_session(
    state: &AppState,
    session_id: &str,
    user: &User,
) -> Result<QuizSession, ApiError> {
    let session = repositories::sessions::find_by_id(state.db(), session_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz session"))?
        .ok_or_else(|| ApiError::NotFound("Quiz session not found".to_string()))?;

    if session.student_id != user.id {
        return Err(ApiError::Forbidden("Not your quiz session"));
    }

    Ok(session)
}
