// src/models/note.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A captured page of notes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: Uuid,

    /// Opaque reference to the captured image (data URL or blob key).
    pub image_data: String,

    /// Text recognized from the image. Empty when OCR found nothing.
    #[serde(default)]
    pub text: String,

    pub timestamp: DateTime<Utc>,
}
