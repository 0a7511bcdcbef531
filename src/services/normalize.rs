//! Score normalization for historical attempt records.
//!
//! Two generations of records share the `score` field: the current one stores
//! the number of correct answers, an older one stored the percentage there.
//! No version tag was ever persisted, so each record is reclassified
//! heuristically on read.

use time::PrimitiveDateTime;

use crate::db::models::QuizAttempt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct RawScore {
    pub(crate) score: Option<i32>,
    pub(crate) percentage: Option<i32>,
    pub(crate) total_questions: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ScoreTriple {
    pub(crate) score: i32,
    pub(crate) percentage: i32,
    pub(crate) total_questions: i32,
}

/// An attempt with its score triple already normalized. Everything downstream
/// (dashboards, results views, charts) consumes this, never the raw row.
#[derive(Debug, Clone)]
pub(crate) struct NormalizedAttempt {
    pub(crate) id: String,
    pub(crate) quiz_id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) quiz_title: String,
    pub(crate) score: i32,
    pub(crate) percentage: i32,
    pub(crate) total_questions: i32,
    pub(crate) time_taken_minutes: i32,
    pub(crate) date_taken: PrimitiveDateTime,
}

/// Derives the canonical `{score, percentage, total_questions}` triple.
///
/// Ordered precedence, first matching rule wins:
/// 1. `total_questions > 0` and the percentage is absent, or the stored score
///    exceeds the question count: the score field actually held a percentage.
///    Keep it as the percentage and recompute the correct-answer count.
/// 2. Percentage absent otherwise: derive it from score and total, or default
///    to 0 when the question count is unknown.
/// 3. Use the stored values as-is.
///
/// Never divides by zero; with `total_questions == 0` derived fields fall
/// back to 0.
pub(crate) fn normalize(raw: RawScore) -> ScoreTriple {
    let total = raw.total_questions.unwrap_or(0);
    let mut score = raw.score.unwrap_or(0);
    let mut percentage = raw.percentage;

    if total > 0 && (percentage.is_none() || score > total) {
        percentage = Some(score);
        score = score_from_percentage(score, total);
    } else if percentage.is_none() {
        percentage = Some(if total > 0 { percentage_of(score, total) } else { 0 });
    }

    ScoreTriple { score, percentage: percentage.unwrap_or(0), total_questions: total }
}

/// `round(100 * score / total)`
pub(crate) fn percentage_of(score: i32, total: i32) -> i32 {
    ((score as f64 / total as f64) * 100.0).round() as i32
}

/// `round(percentage / 100 * total)`
pub(crate) fn score_from_percentage(percentage: i32, total: i32) -> i32 {
    ((percentage as f64 / 100.0) * total as f64).round() as i32
}

/// Runs one stored row through [`normalize`]. Rows written with a schema
/// version tag store the canonical triple already and skip the heuristics;
/// for legacy rows a rewritten triple is logged as a recoverable
/// data-corruption warning and the caller keeps going either way.
pub(crate) fn normalize_attempt(row: &QuizAttempt) -> NormalizedAttempt {
    let triple = if row.schema_version >= crate::db::models::ATTEMPT_SCHEMA_VERSION {
        ScoreTriple {
            score: row.score,
            percentage: row.percentage.unwrap_or(0),
            total_questions: row.total_questions,
        }
    } else {
        normalize(RawScore {
            score: Some(row.score),
            percentage: row.percentage,
            total_questions: Some(row.total_questions),
        })
    };

    if triple.score != row.score || Some(triple.percentage) != row.percentage {
        tracing::warn!(
            attempt_id = %row.id,
            stored_score = row.score,
            stored_percentage = ?row.percentage,
            score = triple.score,
            percentage = triple.percentage,
            "Legacy score encoding detected; normalized on read"
        );
    }

    NormalizedAttempt {
        id: row.id.clone(),
        quiz_id: row.quiz_id.clone(),
        student_id: row.student_id.clone(),
        student_name: row.student_name.clone(),
        student_email: row.student_email.clone(),
        quiz_title: row.quiz_title.clone(),
        score: triple.score,
        percentage: triple.percentage,
        total_questions: triple.total_questions,
        time_taken_minutes: row.time_taken_minutes,
        date_taken: row.date_taken,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(score: i32, percentage: Option<i32>, total: i32) -> RawScore {
        RawScore { score: Some(score), percentage, total_questions: Some(total) }
    }

    #[test]
    fn well_formed_record_is_unchanged() {
        let out = normalize(raw(7, Some(70), 10));
        assert_eq!(out, ScoreTriple { score: 7, percentage: 70, total_questions: 10 });
    }

    #[test]
    fn score_stored_as_percentage_is_reclassified() {
        // score=70 cannot be a correct-answer count out of 10 questions
        let out = normalize(raw(70, Some(0), 10));
        assert_eq!(out, ScoreTriple { score: 7, percentage: 70, total_questions: 10 });
    }

    #[test]
    fn missing_percentage_treats_score_as_percentage() {
        let out = normalize(raw(80, None, 5));
        assert_eq!(out, ScoreTriple { score: 4, percentage: 80, total_questions: 5 });
    }

    #[test]
    fn zero_total_questions_never_divides() {
        let out = normalize(raw(3, None, 0));
        assert_eq!(out, ScoreTriple { score: 3, percentage: 0, total_questions: 0 });

        let out = normalize(RawScore { score: None, percentage: None, total_questions: None });
        assert_eq!(out, ScoreTriple { score: 0, percentage: 0, total_questions: 0 });
    }

    #[test]
    fn zero_score_zero_percentage_is_a_legitimate_zero() {
        let out = normalize(raw(0, Some(0), 10));
        assert_eq!(out, ScoreTriple { score: 0, percentage: 0, total_questions: 10 });
    }

    #[test]
    fn normalize_is_idempotent_over_legacy_shapes() {
        let shapes = [
            raw(7, Some(70), 10),
            raw(70, Some(0), 10),
            raw(80, None, 5),
            raw(0, Some(0), 10),
            raw(3, None, 0),
            raw(100, Some(0), 20),
            RawScore { score: None, percentage: None, total_questions: Some(8) },
        ];

        for shape in shapes {
            let once = normalize(shape);
            let twice = normalize(RawScore {
                score: Some(once.score),
                percentage: Some(once.percentage),
                total_questions: Some(once.total_questions),
            });
            assert_eq!(once, twice, "not idempotent for {shape:?}");
        }
    }

    #[test]
    fn rounding_matches_presentation_rules() {
        assert_eq!(percentage_of(2, 3), 67);
        assert_eq!(percentage_of(1, 3), 33);
        assert_eq!(percentage_of(1, 2), 50);
        assert_eq!(score_from_percentage(67, 3), 2);
    }

    #[test]
    fn schema_tagged_rows_bypass_the_heuristic() {
        use crate::db::models::{QuizAttempt, ATTEMPT_SCHEMA_VERSION};
        use sqlx::types::Json;
        use time::macros::datetime;

        let row = |schema_version: i32| QuizAttempt {
            id: "attempt-1".to_string(),
            quiz_id: "quiz-1".to_string(),
            student_id: "student-1".to_string(),
            student_name: "Student One".to_string(),
            student_email: "one@example.edu".to_string(),
            quiz_title: "Subnetting".to_string(),
            score: 70,
            total_questions: 10,
            percentage: Some(70),
            time_taken_minutes: 12,
            answers: Json(Vec::new()),
            date_taken: datetime!(2025-05-01 10:00:00),
            schema_version,
        };

        // The heuristic reads score=70 of 10 questions as a stored
        // percentage; a tagged row is taken at face value instead.
        assert_eq!(normalize_attempt(&row(ATTEMPT_SCHEMA_VERSION)).score, 70);
        assert_eq!(normalize_attempt(&row(1)).score, 7);
        assert_eq!(normalize_attempt(&row(1)).percentage, 70);
    }
}
