use anyhow::{Context, Result};
use time::Duration;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::services::attempt_finalize::{self, FinalizeError, FinalizeMode};

/// Auto-submits quiz sessions whose deadline (plus the configured grace
/// window) has passed. The answers last auto-saved on the session are graded;
/// a session the student managed to submit in the meantime is skipped.
pub(crate) async fn close_expired_sessions(state: &AppState) -> Result<()> {
    let grace = Duration::seconds(state.settings().quiz().submit_grace_seconds as i64);
    let cutoff = primitive_now_utc() - grace;

    let sessions = repositories::sessions::list_expired_active(state.db(), cutoff)
        .await
        .context("Failed to fetch expired sessions")?;

    let mut closed = 0;

    for session in sessions {
        let student = repositories::users::find_by_id(state.db(), &session.student_id)
            .await
            .context("Failed to fetch session student")?;

        let Some(student) = student else {
            tracing::error!(
                session_id = %session.id,
                student_id = %session.student_id,
                "Expired session references unknown student"
            );
            continue;
        };

        match attempt_finalize::finalize_session(
            state,
            &session,
            &student,
            None,
            FinalizeMode::AutoDeadline,
        )
        .await
        {
            Ok(attempt) => {
                tracing::info!(
                    session_id = %session.id,
                    attempt_id = %attempt.id,
                    percentage = attempt.percentage.unwrap_or(0),
                    "Auto-submitted expired quiz session"
                );
                closed += 1;
            }
            Err(FinalizeError::SessionAlreadyClosed | FinalizeError::AlreadyAttempted) => {
                // Manual submission won the race.
            }
            Err(err) => {
                tracing::error!(
                    session_id = %session.id,
                    error = %err,
                    "Failed to auto-submit expired session"
                );
            }
        }
    }

    if closed > 0 {
        tracing::info!(closed_sessions = closed, "Closed expired quiz sessions");
    }
    metrics::counter!("expired_sessions_closed_total").increment(closed as u64);

    Ok(())
}
