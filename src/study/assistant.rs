// src/study/assistant.rs

//! Entry points for the long-running "AI" helpers: OCR import, flashcard
//! generation and exam analysis. Only one may run at a time.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rand::Rng;
use thiserror::Error;

use crate::models::{exam::ExamDefinition, flashcard::GeneratedCard};

use super::analyzer::{self, Analysis};
use super::error::{Result, StudyError};
use super::generator;
use super::session::AnswerMap;

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("image could not be decoded: {0}")]
    InvalidImage(String),

    #[error("recognizer failed: {0}")]
    Recognizer(String),
}

/// Text recognition collaborator (camera capture, uploaded scans).
#[async_trait]
pub trait TextRecognizer: Send + Sync {
    /// May return an empty string when nothing legible was found.
    async fn recognize(&self, image: &[u8]) -> std::result::Result<String, OcrError>;
}

/// Single-slot guard: at most one operation holds it at a time.
#[derive(Debug, Clone, Default)]
pub struct BusyGate {
    busy: Arc<AtomicBool>,
}

/// Releases the gate when dropped.
#[derive(Debug)]
pub struct BusyGuard {
    busy: Arc<AtomicBool>,
}

impl BusyGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn try_acquire(&self) -> Result<BusyGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| StudyError::Busy)?;
        Ok(BusyGuard {
            busy: Arc::clone(&self.busy),
        })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Text extracted from one image along with the cards proposed for it.
#[derive(Debug, Clone)]
pub struct ImageImport {
    pub text: String,
    pub cards: Vec<GeneratedCard>,
}

pub struct Assistant {
    gate: BusyGate,
    recognizer: Arc<dyn TextRecognizer>,
}

impl Assistant {
    pub fn new(recognizer: Arc<dyn TextRecognizer>) -> Self {
        Self {
            gate: BusyGate::new(),
            recognizer,
        }
    }

    pub fn gate(&self) -> &BusyGate {
        &self.gate
    }

    pub fn is_busy(&self) -> bool {
        self.gate.is_busy()
    }

    pub fn cards_from_text(&self, text: &str) -> Result<Vec<GeneratedCard>> {
        let _guard = self.gate.try_acquire()?;
        Ok(generator::generate(text))
    }

    /// Runs OCR and then the generator. A recognizer failure is logged and
    /// treated as "no text", never as an error.
    pub async fn cards_from_image(&self, image: &[u8]) -> Result<ImageImport> {
        let _guard = self.gate.try_acquire()?;

        let text = match self.recognizer.recognize(image).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!("Text recognition failed, continuing without text: {}", e);
                String::new()
            }
        };

        if text.trim().is_empty() {
            tracing::info!("No text extracted from image ({} bytes)", image.len());
            return Ok(ImageImport {
                text,
                cards: Vec::new(),
            });
        }

        let cards = generator::generate(&text);
        Ok(ImageImport { text, cards })
    }

    pub fn analyze_attempt<R: Rng + ?Sized>(
        &self,
        exam: &ExamDefinition,
        answers: &AnswerMap,
        score: u32,
        rng: &mut R,
    ) -> Result<Analysis> {
        let _guard = self.gate.try_acquire()?;
        Ok(analyzer::analyze(exam, answers, score, rng))
    }
}
