// src/models/exam.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::question::Question;

/// A mock exam authored by the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamDefinition {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub questions: Vec<Question>,
    pub created: DateTime<Utc>,
}

impl ExamDefinition {
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }
}
