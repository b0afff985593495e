// src/study/error.rs

use thiserror::Error;

use crate::study::session::SessionState;

/// Errors raised by the study engine.
///
/// None of these are fatal: every variant describes a user action that can be
/// corrected and retried.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum StudyError {
    #[error("exam title must not be empty")]
    EmptyTitle,

    #[error("exam must contain at least one question")]
    NoQuestions,

    /// Names the first question that failed validation (0-based).
    #[error("question {} is incomplete", .index + 1)]
    IncompleteQuestion { index: usize },

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("already processing")]
    Busy,

    #[error("exam session is {state:?}, expected InProgress")]
    SessionNotActive { state: SessionState },

    #[error("{unanswered} question(s) unanswered, confirm to submit anyway")]
    UnansweredQuestions { unanswered: usize },

    #[error("question index {0} out of range")]
    QuestionOutOfRange(usize),

    #[error("option index {0} out of range")]
    OptionOutOfRange(usize),

    #[error("storage error: {0}")]
    Storage(String),
}

impl StudyError {
    pub fn not_found(kind: &'static str, id: impl ToString) -> Self {
        StudyError::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    /// True for bad authoring input.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            StudyError::EmptyTitle
                | StudyError::NoQuestions
                | StudyError::IncompleteQuestion { .. }
                | StudyError::EmptyField(_)
        )
    }
}

impl From<crate::storage::StorageError> for StudyError {
    fn from(err: crate::storage::StorageError) -> Self {
        StudyError::Storage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StudyError>;
