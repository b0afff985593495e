// src/models/exam_record.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::exam::ExamDefinition;

/// Outcome of grading one submitted exam session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamResult {
    pub exam_id: Uuid,

    /// Percentage in 0..=100, rounded half-up.
    pub score: u32,

    pub correct_count: usize,
    pub total_questions: usize,

    /// One entry per question, in question order.
    pub per_question: Vec<bool>,

    pub time_taken_secs: i64,
    pub completed_at: DateTime<Utc>,
}

/// A completed exam as kept in the profile's history.
///
/// `score` is the canonical name for the historical percentage; older
/// payloads that used `lastScore` are still accepted on read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamRecord {
    pub exam_id: Uuid,
    pub title: String,
    pub subject: String,
    #[serde(alias = "lastScore")]
    pub score: u32,
    pub correct_count: usize,
    pub total_questions: usize,
    pub time_taken_secs: i64,
    pub completed_at: DateTime<Utc>,
}

impl ExamRecord {
    pub fn from_result(exam: &ExamDefinition, result: &ExamResult) -> Self {
        Self {
            exam_id: exam.id,
            title: exam.title.clone(),
            subject: exam.subject.clone(),
            score: result.score,
            correct_count: result.correct_count,
            total_questions: result.total_questions,
            time_taken_secs: result.time_taken_secs,
            completed_at: result.completed_at,
        }
    }
}
