// src/study/authoring.rs

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{
    exam::ExamDefinition,
    question::{OPTION_COUNT, Question, QuestionDraft},
};

use super::error::{Result, StudyError};

/// Subject used when the author leaves the field blank.
pub const DEFAULT_SUBJECT: &str = "General";

/// Validates the authoring form and builds an exam definition.
///
/// Stops at the first invalid question and reports its index; nothing is
/// built when any check fails.
pub fn create_exam(
    title: &str,
    subject: &str,
    questions: &[QuestionDraft],
    now: DateTime<Utc>,
) -> Result<ExamDefinition> {
    let title = title.trim();
    if title.is_empty() {
        return Err(StudyError::EmptyTitle);
    }
    if questions.is_empty() {
        return Err(StudyError::NoQuestions);
    }

    let questions = questions
        .iter()
        .enumerate()
        .map(|(index, draft)| {
            validate_question(draft).ok_or(StudyError::IncompleteQuestion { index })
        })
        .collect::<Result<Vec<_>>>()?;

    let subject = match subject.trim() {
        "" => DEFAULT_SUBJECT,
        s => s,
    };

    Ok(ExamDefinition {
        id: Uuid::new_v4(),
        title: title.to_string(),
        subject: subject.to_string(),
        questions,
        created: now,
    })
}

fn validate_question(draft: &QuestionDraft) -> Option<Question> {
    let text = draft.text.trim();
    if text.is_empty() || draft.options.len() != OPTION_COUNT {
        return None;
    }
    if draft.options.iter().any(|o| o.trim().is_empty()) {
        return None;
    }

    let correct_index = draft.correct_index.filter(|&i| i < OPTION_COUNT)?;
    let options: [String; OPTION_COUNT] = std::array::from_fn(|i| draft.options[i].trim().to_string());

    Some(Question {
        text: text.to_string(),
        options,
        correct_index,
    })
}
