// src/storage/mod.rs

//! Key-value blob persistence.
//!
//! Keys are plain strings, scoped by the caller (e.g. `guest:notes`,
//! `user_42:flashcards`). Values are JSON documents. A missing key is not an
//! error: `get` returns `None`.

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Inserts or overwrites.
    async fn set(&self, key: &str, value: Value) -> Result<()>;

    /// Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> Result<()>;
}
