use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use crate::core::time::format_primitive;
use crate::db::models::Question;

pub(crate) const OPTION_COUNT: usize = 4;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionCreate {
    #[serde(alias = "questionText")]
    #[validate(length(min = 1, message = "Question text is required"))]
    pub(crate) question_text: String,
    #[validate(custom(function = validate_options))]
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctOptionIndex")]
    #[validate(range(min = 0, max = 3, message = "A valid correct option must be selected"))]
    pub(crate) correct_option_index: i32,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub(crate) subject: String,
    #[validate(length(min = 1, message = "Chapter is required"))]
    pub(crate) chapter: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct QuestionUpdate {
    #[serde(alias = "questionText")]
    #[validate(length(min = 1, message = "Question text is required"))]
    pub(crate) question_text: String,
    #[validate(custom(function = validate_options))]
    pub(crate) options: Vec<String>,
    #[serde(alias = "correctOptionIndex")]
    #[validate(range(min = 0, max = 3, message = "A valid correct option must be selected"))]
    pub(crate) correct_option_index: i32,
    #[serde(default)]
    pub(crate) explanation: Option<String>,
    #[validate(length(min = 1, message = "Subject is required"))]
    pub(crate) subject: String,
    #[validate(length(min = 1, message = "Chapter is required"))]
    pub(crate) chapter: String,
}

fn validate_options(options: &Vec<String>) -> Result<(), ValidationError> {
    if options.len() != OPTION_COUNT {
        let mut error = ValidationError::new("options");
        error.message = Some("Exactly 4 options are required".into());
        return Err(error);
    }
    if options.iter().any(|option| option.trim().is_empty()) {
        let mut error = ValidationError::new("options");
        error.message = Some("Options cannot be empty".into());
        return Err(error);
    }
    Ok(())
}

/// Full question as seen by its authoring lecturer.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionResponse {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
    pub(crate) correct_option_index: i32,
    pub(crate) explanation: Option<String>,
    pub(crate) subject: String,
    pub(crate) chapter: String,
    pub(crate) author_id: String,
    pub(crate) created_at: String,
}

impl QuestionResponse {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            options: question.options.0,
            correct_option_index: question.correct_option_index,
            explanation: question.explanation,
            subject: question.subject,
            chapter: question.chapter,
            author_id: question.author_id,
            created_at: format_primitive(question.created_at),
        }
    }
}

/// Question as shown to a student taking a quiz; the answer key and the
/// explanation stay server-side until after submission.
#[derive(Debug, Serialize)]
pub(crate) struct QuestionPublic {
    pub(crate) id: String,
    pub(crate) question_text: String,
    pub(crate) options: Vec<String>,
}

impl QuestionPublic {
    pub(crate) fn from_db(question: Question) -> Self {
        Self {
            id: question.id,
            question_text: question.question_text,
            options: question.options.0,
        }
    }
}
