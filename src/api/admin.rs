use axum::{extract::State, routing::post, Json, Router};
use serde::Serialize;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentAdmin;
use crate::core::state::AppState;
use crate::tasks::repair;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/repair-scores", post(repair_scores))
}

#[derive(Debug, Serialize)]
struct RepairResponse {
    message: String,
    scanned: usize,
    modified: usize,
}

/// On-demand run of the score repair job. Maintenance is an explicit,
/// admin-gated command; there is no debug hook anywhere else.
async fn repair_scores(
    CurrentAdmin(_admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<Json<RepairResponse>, ApiError> {
    let report = repair::repair_score_data(&state)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to repair score data"))?;

    let message = if report.modified > 0 {
        format!("Fixed {} quiz attempt records", report.modified)
    } else {
        "No data issues found - all records are correct".to_string()
    };

    Ok(Json(RepairResponse { message, scanned: report.scanned, modified: report.modified }))
}
