// src/study/mod.rs

pub mod analytics;
pub mod analyzer;
pub mod assistant;
pub mod authoring;
pub mod context;
pub mod error;
pub mod generator;
pub mod session;

pub use assistant::{Assistant, BusyGate, TextRecognizer};
pub use context::{ProfileScope, ProfileSnapshot, StudyContext};
pub use error::StudyError;
pub use session::{ExamSession, SessionState};
