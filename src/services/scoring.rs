//! Grading of a completed answer set against a quiz's question list.
//!
//! Deterministic and side-effect free so historical results can always be
//! reproduced from the stored answers.

use thiserror::Error;

use crate::db::models::{AnswerInput, AnswerRecord, Question};

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum ScoringError {
    #[error("quiz has no questions")]
    NoQuestions,
    #[error("expected {expected} answers, got {actual}")]
    AnswerCountMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone)]
pub(crate) struct QuizScore {
    pub(crate) score: i32,
    pub(crate) percentage: i32,
    pub(crate) correct_answers: i32,
    pub(crate) total_questions: i32,
    pub(crate) answers: Vec<AnswerRecord>,
}

/// Grades `answers` positionally against `questions`. An unanswered question
/// (`selected_option_index == None`) is never correct.
pub(crate) fn grade(
    answers: &[AnswerInput],
    questions: &[Question],
) -> Result<QuizScore, ScoringError> {
    if questions.is_empty() {
        return Err(ScoringError::NoQuestions);
    }

    if answers.len() != questions.len() {
        return Err(ScoringError::AnswerCountMismatch {
            expected: questions.len(),
            actual: answers.len(),
        });
    }

    let mut correct = 0;
    let mut graded = Vec::with_capacity(questions.len());

    for (answer, question) in answers.iter().zip(questions) {
        let is_correct = answer.selected_option_index == Some(question.correct_option_index);
        if is_correct {
            correct += 1;
        }

        graded.push(AnswerRecord {
            question_id: question.id.clone(),
            selected_option_index: answer.selected_option_index,
            is_correct,
        });
    }

    let total = questions.len() as i32;
    let percentage = ((correct as f64 / total as f64) * 100.0).round() as i32;

    Ok(QuizScore {
        score: correct,
        percentage,
        correct_answers: correct,
        total_questions: total,
        answers: graded,
    })
}

/// Pads a partially auto-saved answer list out to the quiz's question count so
/// an expired session can be graded; the missing tail counts as unanswered.
pub(crate) fn pad_answers(mut answers: Vec<AnswerInput>, len: usize) -> Vec<AnswerInput> {
    answers.truncate(len);
    while answers.len() < len {
        answers.push(AnswerInput { selected_option_index: None });
    }
    answers
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::types::Json;
    use time::macros::datetime;

    fn question(id: &str, correct: i32) -> Question {
        Question {
            id: id.to_string(),
            question_text: format!("Question {id}"),
            options: Json(vec![
                "Option A".to_string(),
                "Option B".to_string(),
                "Option C".to_string(),
                "Option D".to_string(),
            ]),
            correct_option_index: correct,
            explanation: None,
            subject: "Networking".to_string(),
            chapter: "Chapter 1".to_string(),
            author_id: "lecturer-1".to_string(),
            created_at: datetime!(2025-01-01 09:00:00),
        }
    }

    fn answer(selected: Option<i32>) -> AnswerInput {
        AnswerInput { selected_option_index: selected }
    }

    #[test]
    fn grades_against_correct_indices() {
        let questions = [question("q1", 0), question("q2", 1), question("q3", 2)];
        let answers = [answer(Some(0)), answer(Some(1)), answer(Some(3))];

        let result = grade(&answers, &questions).expect("graded");

        assert_eq!(result.score, 2);
        assert_eq!(result.correct_answers, 2);
        assert_eq!(result.total_questions, 3);
        assert_eq!(result.percentage, 67);
        assert!(result.answers[0].is_correct);
        assert!(result.answers[1].is_correct);
        assert!(!result.answers[2].is_correct);
        assert_eq!(result.answers[2].question_id, "q3");
    }

    #[test]
    fn unanswered_is_never_correct() {
        let questions = [question("q1", 0)];
        let answers = [answer(None)];

        let result = grade(&answers, &questions).expect("graded");

        assert_eq!(result.score, 0);
        assert_eq!(result.percentage, 0);
        assert!(!result.answers[0].is_correct);
    }

    #[test]
    fn empty_question_list_is_rejected() {
        let result = grade(&[], &[]);
        assert_eq!(result.unwrap_err(), ScoringError::NoQuestions);
    }

    #[test]
    fn answer_count_mismatch_is_rejected() {
        let questions = [question("q1", 0), question("q2", 1)];
        let answers = [answer(Some(0))];

        let result = grade(&answers, &questions);
        assert_eq!(result.unwrap_err(), ScoringError::AnswerCountMismatch { expected: 2, actual: 1 });
    }

    #[test]
    fn all_correct_scores_one_hundred() {
        let questions = [question("q1", 3), question("q2", 2)];
        let answers = [answer(Some(3)), answer(Some(2))];

        let result = grade(&answers, &questions).expect("graded");
        assert_eq!(result.score, 2);
        assert_eq!(result.percentage, 100);
    }

    #[test]
    fn pad_answers_fills_missing_tail() {
        let padded = pad_answers(vec![answer(Some(1))], 3);
        assert_eq!(padded.len(), 3);
        assert_eq!(padded[0].selected_option_index, Some(1));
        assert_eq!(padded[1].selected_option_index, None);
        assert_eq!(padded[2].selected_option_index, None);

        let truncated = pad_answers(vec![answer(Some(0)), answer(Some(1))], 1);
        assert_eq!(truncated.len(), 1);
    }
}
