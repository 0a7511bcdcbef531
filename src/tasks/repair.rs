//! Batch repair of corrupted attempt score data.
//!
//! Historical writers produced three known corruption patterns: percentages
//! over 100, percentages stored as 0 while the score held the real
//! percentage, and missing question counts. The job scans every attempt,
//! plans the minimal correction per record and writes the corrections back in
//! chunked transactions. A record whose corrected values equal its stored
//! values is never rewritten, so a second run over repaired data plans
//! nothing.

use std::collections::HashMap;

use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::db::models::QuizAttempt;
use crate::repositories;
use crate::services::normalize::{percentage_of, score_from_percentage};

/// Upper bound on updates per transaction. Batches commit sequentially and
/// independently; a failure leaves earlier batches committed.
pub(crate) const MAX_BATCH_SIZE: usize = 500;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RepairUpdate {
    pub(crate) attempt_id: String,
    pub(crate) score: Option<i32>,
    pub(crate) percentage: Option<i32>,
    pub(crate) total_questions: Option<i32>,
}

#[derive(Debug, Default)]
pub(crate) struct RepairReport {
    pub(crate) scanned: usize,
    pub(crate) modified: usize,
    /// Records that triggered the corruption check but carry a legitimate
    /// zero score; left untouched.
    pub(crate) ambiguous: usize,
}

/// Decides the correction for one attempt, or `None` when nothing needs to
/// change. `quiz_question_count` is the question count of the attempt's quiz,
/// resolved by the caller only when the stored count is missing.
///
/// A zero percentage with a zero score is ambiguous (it may be an honest
/// failing grade) and is deliberately not "fixed".
pub(crate) fn plan_repair(
    attempt: &QuizAttempt,
    quiz_question_count: Option<i32>,
) -> Option<RepairUpdate> {
    let mut new_score = None;
    let mut new_percentage = None;
    let mut new_total = None;

    let score = attempt.score;
    let total = attempt.total_questions;

    if let Some(stored) = attempt.percentage {
        if (stored > 100 || stored == 0) && score > 0 && total > 0 {
            if score <= total {
                let fixed = percentage_of(score, total);
                if fixed != stored {
                    new_percentage = Some(fixed);
                }
            } else if score <= 100 {
                // The score field held the percentage; swap the encoding.
                let fixed_score = score_from_percentage(score, total);
                if score != stored {
                    new_percentage = Some(score);
                }
                if fixed_score != score {
                    new_score = Some(fixed_score);
                }
            }
        }
    }

    if total <= 0 {
        if let Some(count) = quiz_question_count.filter(|count| *count > 0) {
            new_total = Some(count);
            if score > 0 && new_percentage.is_none() {
                let fixed = percentage_of(score, count);
                if attempt.percentage != Some(fixed) {
                    new_percentage = Some(fixed);
                }
            }
        }
    }

    if new_score.is_none() && new_percentage.is_none() && new_total.is_none() {
        return None;
    }

    Some(RepairUpdate {
        attempt_id: attempt.id.clone(),
        score: new_score,
        percentage: new_percentage,
        total_questions: new_total,
    })
}

fn is_ambiguous_zero(attempt: &QuizAttempt) -> bool {
    attempt.percentage == Some(0) && attempt.score == 0
}

/// Scans all attempts and writes back the planned corrections. Idempotent:
/// a second run over already-repaired data modifies nothing.
pub(crate) async fn repair_score_data(state: &AppState) -> Result<RepairReport> {
    let attempts = repositories::attempts::list_all(state.db())
        .await
        .context("Failed to fetch attempts for repair")?;

    let mut updates = Vec::new();
    let mut ambiguous = 0;
    let mut quiz_counts: HashMap<String, Option<i32>> = HashMap::new();

    for attempt in &attempts {
        if is_ambiguous_zero(attempt) {
            ambiguous += 1;
            tracing::warn!(
                attempt_id = %attempt.id,
                "Zero percentage with zero score; possibly legitimate, leaving as-is"
            );
        }

        let quiz_count = if attempt.total_questions <= 0 {
            match quiz_counts.get(&attempt.quiz_id) {
                Some(cached) => *cached,
                None => {
                    let fetched =
                        repositories::quizzes::find_by_id(state.db(), &attempt.quiz_id)
                            .await
                            .context("Failed to fetch quiz for repair")?
                            .map(|quiz| quiz.question_ids.0.len() as i32);
                    quiz_counts.insert(attempt.quiz_id.clone(), fetched);
                    fetched
                }
            }
        } else {
            None
        };

        if let Some(update) = plan_repair(attempt, quiz_count) {
            tracing::info!(
                attempt_id = %update.attempt_id,
                score = ?update.score,
                percentage = ?update.percentage,
                total_questions = ?update.total_questions,
                "Repairing attempt record"
            );
            updates.push(update);
        }
    }

    for chunk in updates.chunks(MAX_BATCH_SIZE) {
        let mut tx =
            state.db().begin().await.context("Failed to start repair transaction")?;

        for update in chunk {
            repositories::attempts::apply_repair(
                &mut *tx,
                &update.attempt_id,
                update.score,
                update.percentage,
                update.total_questions,
            )
            .await
            .context("Failed to apply repair update")?;
        }

        tx.commit().await.context("Failed to commit repair batch")?;
    }

    let report = RepairReport { scanned: attempts.len(), modified: updates.len(), ambiguous };
    tracing::info!(
        scanned = report.scanned,
        modified = report.modified,
        ambiguous = report.ambiguous,
        "Score repair pass finished"
    );
    metrics::counter!("attempts_repaired_total").increment(report.modified as u64);

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::macros::datetime;

    fn attempt(score: i32, percentage: Option<i32>, total: i32) -> QuizAttempt {
        QuizAttempt {
            id: "attempt-1".to_string(),
            quiz_id: "quiz-1".to_string(),
            student_id: "student-1".to_string(),
            student_name: "Student One".to_string(),
            student_email: "one@example.edu".to_string(),
            quiz_title: "Subnetting".to_string(),
            score,
            total_questions: total,
            percentage,
            time_taken_minutes: 10,
            answers: Json(Vec::new()),
            date_taken: datetime!(2025-05-01 10:00:00),
            schema_version: 1,
        }
    }

    fn apply(attempt: &QuizAttempt, update: &RepairUpdate) -> QuizAttempt {
        let mut repaired = attempt.clone();
        if let Some(score) = update.score {
            repaired.score = score;
        }
        if let Some(percentage) = update.percentage {
            repaired.percentage = Some(percentage);
        }
        if let Some(total) = update.total_questions {
            repaired.total_questions = total;
        }
        repaired
    }

    #[test]
    fn well_formed_record_needs_no_repair() {
        assert_eq!(plan_repair(&attempt(7, Some(70), 10), None), None);
    }

    #[test]
    fn over_hundred_percentage_is_recomputed_from_score() {
        let row = attempt(7, Some(700), 10);
        let update = plan_repair(&row, None).expect("update");
        assert_eq!(update.percentage, Some(70));
        assert_eq!(update.score, None);
        assert_eq!(update.total_questions, None);
    }

    #[test]
    fn score_stored_as_percentage_is_swapped() {
        let row = attempt(70, Some(0), 10);
        let update = plan_repair(&row, None).expect("update");
        assert_eq!(update.percentage, Some(70));
        assert_eq!(update.score, Some(7));
    }

    #[test]
    fn zero_score_zero_percentage_is_left_alone() {
        let row = attempt(0, Some(0), 10);
        assert!(is_ambiguous_zero(&row));
        assert_eq!(plan_repair(&row, None), None);
    }

    #[test]
    fn missing_total_is_resolved_from_quiz() {
        let row = attempt(7, None, 0);
        let update = plan_repair(&row, Some(10)).expect("update");
        assert_eq!(update.total_questions, Some(10));
        assert_eq!(update.percentage, Some(70));
        assert_eq!(update.score, None);
    }

    #[test]
    fn missing_total_without_quiz_stays_put() {
        assert_eq!(plan_repair(&attempt(7, None, 0), None), None);
    }

    #[test]
    fn repair_is_idempotent() {
        let corrupted = [
            attempt(7, Some(700), 10),
            attempt(70, Some(0), 10),
            attempt(7, None, 0),
            attempt(3, Some(130), 5),
        ];

        for row in corrupted {
            let Some(update) = plan_repair(&row, Some(10)) else {
                panic!("expected a repair for {row:?}");
            };
            let repaired = apply(&row, &update);
            assert_eq!(plan_repair(&repaired, Some(10)), None, "second pass repaired {row:?}");
        }
    }

    #[test]
    fn null_percentage_alone_is_not_rewritten() {
        // The read-side normalizer covers missing percentages; the batch job
        // only touches the known corruption patterns.
        assert_eq!(plan_repair(&attempt(7, None, 10), None), None);
    }
}
