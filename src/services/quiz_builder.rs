//! Random quiz assembly from the question bank.

use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

use crate::db::models::Question;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum QuizBuildError {
    #[error("No questions found for {subject} > {chapter}. Please add questions first.")]
    NoQuestions { subject: String, chapter: String },
    #[error("Not enough questions available. Found {available}, need {requested}. Please add more questions or reduce the number of questions.")]
    NotEnough { available: usize, requested: usize },
}

/// Picks `count` random question ids out of the questions matching the
/// requested subject and chapter. The returned order becomes the quiz's fixed
/// question order.
pub(crate) fn generate(
    subject: &str,
    chapter: &str,
    count: usize,
    available: &[Question],
) -> Result<Vec<String>, QuizBuildError> {
    select(subject, chapter, count, available, &mut rand::thread_rng())
}

pub(crate) fn select(
    subject: &str,
    chapter: &str,
    count: usize,
    available: &[Question],
    rng: &mut impl Rng,
) -> Result<Vec<String>, QuizBuildError> {
    if available.is_empty() {
        return Err(QuizBuildError::NoQuestions {
            subject: subject.to_string(),
            chapter: chapter.to_string(),
        });
    }

    if available.len() < count {
        return Err(QuizBuildError::NotEnough { available: available.len(), requested: count });
    }

    let mut ids: Vec<String> = available.iter().map(|q| q.id.clone()).collect();
    ids.shuffle(rng);
    ids.truncate(count);
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use sqlx::types::Json;
    use time::macros::datetime;

    fn question(id: &str) -> Question {
        Question {
            id: id.to_string(),
            question_text: format!("Question {id}"),
            options: Json(vec![
                "A".to_string(),
                "B".to_string(),
                "C".to_string(),
                "D".to_string(),
            ]),
            correct_option_index: 0,
            explanation: None,
            subject: "Networking".to_string(),
            chapter: "Chapter 1".to_string(),
            author_id: "lecturer-1".to_string(),
            created_at: datetime!(2025-01-01 09:00:00),
        }
    }

    #[test]
    fn selects_requested_number_of_distinct_ids() {
        let pool: Vec<Question> = (0..10).map(|i| question(&format!("q{i}"))).collect();
        let mut rng = StdRng::seed_from_u64(7);

        let ids = select("Networking", "Chapter 1", 4, &pool, &mut rng).expect("selection");

        assert_eq!(ids.len(), 4);
        let mut unique = ids.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 4);
        for id in &ids {
            assert!(pool.iter().any(|q| &q.id == id));
        }
    }

    #[test]
    fn empty_pool_reports_missing_questions() {
        let mut rng = StdRng::seed_from_u64(7);
        let err = select("Networking", "Chapter 9", 3, &[], &mut rng).unwrap_err();
        assert_eq!(
            err,
            QuizBuildError::NoQuestions {
                subject: "Networking".to_string(),
                chapter: "Chapter 9".to_string()
            }
        );
    }

    #[test]
    fn undersized_pool_reports_shortfall() {
        let pool = vec![question("q1"), question("q2")];
        let mut rng = StdRng::seed_from_u64(7);
        let err = select("Networking", "Chapter 1", 5, &pool, &mut rng).unwrap_err();
        assert_eq!(err, QuizBuildError::NotEnough { available: 2, requested: 5 });
    }
}
