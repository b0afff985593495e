// src/models/question.rs

use serde::{Deserialize, Serialize};

/// Every multiple-choice question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

/// A validated exam question.
///
/// `study::authoring` builds these from drafts. Questions read back from
/// storage are checked again on deserialization, so `correct_index` is always
/// a valid index into `options`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", try_from = "StoredQuestion")]
pub struct Question {
    pub text: String,

    pub options: [String; OPTION_COUNT],

    /// Index into `options` of the right answer.
    pub correct_index: usize,
}

/// Wire shape of a persisted question, before the index check.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredQuestion {
    text: String,
    options: [String; OPTION_COUNT],
    correct_index: usize,
}

impl TryFrom<StoredQuestion> for Question {
    type Error = String;

    fn try_from(stored: StoredQuestion) -> Result<Self, Self::Error> {
        if stored.correct_index >= OPTION_COUNT {
            return Err(format!(
                "correct index {} out of range for {} options",
                stored.correct_index, OPTION_COUNT
            ));
        }
        Ok(Question {
            text: stored.text,
            options: stored.options,
            correct_index: stored.correct_index,
        })
    }
}

impl Question {
    pub fn correct_option(&self) -> &str {
        &self.options[self.correct_index]
    }

    pub fn option(&self, index: usize) -> Option<&str> {
        self.options.get(index).map(String::as_str)
    }
}

/// Authoring input for one question, as typed into the exam form.
/// Options may be missing and no correct answer may be selected yet.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionDraft {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub correct_index: Option<usize>,
}

impl QuestionDraft {
    pub fn new(text: &str, options: [&str; OPTION_COUNT], correct_index: usize) -> Self {
        Self {
            text: text.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_index: Some(correct_index),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_stored_question_with_bad_index_is_rejected() {
        let raw = json!({
            "text": "What is 2 + 2?",
            "options": ["3", "4", "5", "6"],
            "correctIndex": 7
        });
        assert!(serde_json::from_value::<Question>(raw).is_err());

        let raw = json!({
            "text": "What is 2 + 2?",
            "options": ["3", "4", "5", "6"],
            "correctIndex": 1
        });
        let question: Question = serde_json::from_value(raw).unwrap();
        assert_eq!(question.correct_option(), "4");
    }
}
