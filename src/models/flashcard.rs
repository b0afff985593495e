// src/models/flashcard.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Which generator stage produced a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CardKind {
    Definition,
    Concept,
    Question,
    FillBlank,
    Summary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flashcard {
    pub id: Uuid,
    pub front: String,
    pub back: String,
    pub subject: String,
    pub created: DateTime<Utc>,
    #[serde(default)]
    pub ai_generated: bool,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<CardKind>,
}

/// A question/answer pair proposed by the heuristic generator, not yet saved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedCard {
    pub question: String,
    pub answer: String,
    #[serde(rename = "type")]
    pub kind: CardKind,
}

impl GeneratedCard {
    pub fn new(question: impl Into<String>, answer: impl Into<String>, kind: CardKind) -> Self {
        Self {
            question: question.into(),
            answer: answer.into(),
            kind,
        }
    }
}
