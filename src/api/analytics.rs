use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};

use crate::api::errors::ApiError;
use crate::api::guards::{require_lecturer, require_student, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::{Quiz, User};
use crate::repositories;
use crate::schemas::analytics::{
    ChartsResponse, LecturerDashboardResponse, QuizResultRow, QuizResultsResponse,
    StudentDashboardResponse,
};
use crate::schemas::attempt::AttemptResponse;
use crate::services::analytics;
use crate::services::normalize::{self, NormalizedAttempt};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/lecturer", get(lecturer_dashboard))
        .route("/charts", get(charts))
        .route("/quizzes/:quiz_id", get(quiz_results))
        .route("/me", get(student_dashboard))
}

/// Stat cards, per-quiz breakdown and student roster for the lecturer's
/// quizzes. Recomputed from fresh reads on every load.
async fn lecturer_dashboard(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<LecturerDashboardResponse>, ApiError> {
    require_lecturer(&user)?;
    let (quizzes, attempts) = lecturer_scope(&state, &user).await?;

    Ok(Json(LecturerDashboardResponse {
        overview: analytics::overview(&quizzes, &attempts),
        quiz_breakdown: analytics::quiz_breakdown(&quizzes, &attempts),
        students: analytics::student_summaries(&attempts),
    }))
}

/// Chart-ready series: score distribution, per-quiz averages and the last
/// seven days of activity.
async fn charts(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ChartsResponse>, ApiError> {
    require_lecturer(&user)?;
    let (quizzes, attempts) = lecturer_scope(&state, &user).await?;

    Ok(Json(ChartsResponse {
        score_distribution: analytics::score_distribution(&attempts),
        quiz_performance: analytics::quiz_performance(&quizzes, &attempts),
        time_series: analytics::time_series(&attempts, primitive_now_utc().date()),
        class_pass_rate: analytics::class_pass_rate(&attempts),
    }))
}

/// The results view of a single quiz: stats header plus one row per attempt
/// with the 70% pass badge and verbal grade.
async fn quiz_results(
    Path(quiz_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<QuizResultsResponse>, ApiError> {
    require_lecturer(&user)?;

    let quiz = repositories::quizzes::find_by_id(state.db(), &quiz_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quiz"))?
        .ok_or_else(|| ApiError::NotFound("Quiz not found".to_string()))?;

    if quiz.creator_id != user.id {
        return Err(ApiError::Forbidden("Only the quiz creator can view these results"));
    }

    let attempts = normalized_attempts(
        &state,
        repositories::attempts::AttemptFilter { quiz_id: Some(&quiz_id), ..Default::default() },
    )
    .await?;

    let results = attempts
        .iter()
        .map(|attempt| QuizResultRow {
            attempt_id: attempt.id.clone(),
            student_name: attempt.student_name.clone(),
            student_email: attempt.student_email.clone(),
            score: attempt.score,
            total_questions: attempt.total_questions,
            percentage: attempt.percentage,
            time_taken_minutes: attempt.time_taken_minutes,
            date_taken: format_primitive(attempt.date_taken),
            passed: attempt.percentage >= 70,
            grade: analytics::grade_label(attempt.percentage),
        })
        .collect();

    Ok(Json(QuizResultsResponse {
        quiz_id: quiz.id,
        title: quiz.title,
        stats: analytics::quiz_results_stats(&attempts),
        results,
    }))
}

/// A student's own dashboard: header stats over their past results plus the
/// results themselves, most recent first.
async fn student_dashboard(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<StudentDashboardResponse>, ApiError> {
    require_student(&user)?;

    let attempts = normalized_attempts(
        &state,
        repositories::attempts::AttemptFilter { student_id: Some(&user.id), ..Default::default() },
    )
    .await?;

    Ok(Json(StudentDashboardResponse {
        overview: analytics::student_overview(&attempts),
        results: attempts.into_iter().map(AttemptResponse::from_normalized).collect(),
    }))
}

async fn lecturer_scope(
    state: &AppState,
    user: &User,
) -> Result<(Vec<Quiz>, Vec<NormalizedAttempt>), ApiError> {
    let quizzes = repositories::quizzes::list_by_creator(state.db(), &user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch quizzes"))?;

    let quiz_ids: Vec<String> = quizzes.iter().map(|quiz| quiz.id.clone()).collect();
    let rows = repositories::attempts::list_by_quiz_ids(state.db(), &quiz_ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?;

    let attempts = rows.iter().map(normalize::normalize_attempt).collect();
    Ok((quizzes, attempts))
}

async fn normalized_attempts(
    state: &AppState,
    filter: repositories::attempts::AttemptFilter<'_>,
) -> Result<Vec<NormalizedAttempt>, ApiError> {
    let rows = repositories::attempts::list(state.db(), filter)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch attempts"))?;

    Ok(rows.iter().map(normalize::normalize_attempt).collect())
}
