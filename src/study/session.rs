// src/study/session.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{
    exam::ExamDefinition,
    exam_record::ExamResult,
    question::OPTION_COUNT,
};

use super::error::{Result, StudyError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    NotStarted,
    InProgress,
    Submitted,
    Abandoned,
}

/// Recorded choices: question index -> option index.
pub type AnswerMap = BTreeMap<usize, usize>;

/// One attempt at an exam.
///
/// `NotStarted -> InProgress -> Submitted`, or `InProgress -> Abandoned` on
/// exit. Calls made in any other state are rejected and change nothing.
#[derive(Debug, Clone)]
pub struct ExamSession {
    exam: ExamDefinition,
    state: SessionState,
    started_at: Option<DateTime<Utc>>,
    answers: AnswerMap,
}

impl ExamSession {
    pub fn new(exam: ExamDefinition) -> Self {
        Self {
            exam,
            state: SessionState::NotStarted,
            started_at: None,
            answers: AnswerMap::new(),
        }
    }

    pub fn exam(&self) -> &ExamDefinition {
        &self.exam
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn answers(&self) -> &AnswerMap {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn unanswered_count(&self) -> usize {
        self.exam.question_count().saturating_sub(self.answers.len())
    }

    pub fn start(&mut self, now: DateTime<Utc>) -> Result<()> {
        if self.state != SessionState::NotStarted {
            return Err(StudyError::SessionNotActive { state: self.state });
        }
        self.state = SessionState::InProgress;
        self.started_at = Some(now);
        self.answers.clear();
        tracing::debug!("Exam session started for {}", self.exam.id);
        Ok(())
    }

    /// Records (or replaces) the choice for a question.
    pub fn select_answer(&mut self, question: usize, option: usize) -> Result<()> {
        self.ensure_in_progress()?;
        if question >= self.exam.question_count() {
            return Err(StudyError::QuestionOutOfRange(question));
        }
        if option >= OPTION_COUNT {
            return Err(StudyError::OptionOutOfRange(option));
        }
        self.answers.insert(question, option);
        Ok(())
    }

    /// Wall-clock time since `start`. Display only.
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        match self.started_at {
            Some(start) if now > start => now - start,
            _ => Duration::zero(),
        }
    }

    /// Grades the attempt.
    ///
    /// With unanswered questions the caller must pass `force = true`; the
    /// missing answers then count as incorrect.
    pub fn submit(&mut self, now: DateTime<Utc>, force: bool) -> Result<ExamResult> {
        self.ensure_in_progress()?;

        let unanswered = self.unanswered_count();
        if unanswered > 0 && !force {
            return Err(StudyError::UnansweredQuestions { unanswered });
        }

        let mut result = grade(&self.exam, &self.answers, now);
        result.time_taken_secs = self.elapsed(now).num_seconds();
        self.state = SessionState::Submitted;

        tracing::info!(
            "Exam '{}' submitted: {}/{} correct ({}%)",
            self.exam.title,
            result.correct_count,
            result.total_questions,
            result.score
        );
        Ok(result)
    }

    /// Leaves the exam without grading.
    pub fn exit(&mut self) -> Result<()> {
        self.ensure_in_progress()?;
        self.state = SessionState::Abandoned;
        self.answers.clear();
        tracing::debug!("Exam session for {} abandoned", self.exam.id);
        Ok(())
    }

    fn ensure_in_progress(&self) -> Result<()> {
        if self.state == SessionState::InProgress {
            Ok(())
        } else {
            Err(StudyError::SessionNotActive { state: self.state })
        }
    }
}

/// Scores `answers` against the exam key. Unanswered questions are incorrect.
pub fn grade(exam: &ExamDefinition, answers: &AnswerMap, now: DateTime<Utc>) -> ExamResult {
    let per_question: Vec<bool> = exam
        .questions
        .iter()
        .enumerate()
        .map(|(i, q)| answers.get(&i) == Some(&q.correct_index))
        .collect();

    let correct_count = per_question.iter().filter(|&&c| c).count();
    let total_questions = per_question.len();

    ExamResult {
        exam_id: exam.id,
        score: percentage(correct_count, total_questions),
        correct_count,
        total_questions,
        per_question,
        time_taken_secs: 0,
        completed_at: now,
    }
}

/// `round(100 * correct / total)` with halves rounded up; 0 for an empty exam.
pub fn percentage(correct: usize, total: usize) -> u32 {
    if total == 0 {
        return 0;
    }
    ((200 * correct + total) / (2 * total)) as u32
}
