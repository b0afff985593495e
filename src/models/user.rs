// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'users' table of the sync server.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,

    /// Unique username.
    pub username: String,

    /// Unique email address.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password_hash: String,

    /// School grade, free-form (e.g. "Grade 11").
    pub grade: Option<String>,

    pub total_score: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for registration.
///
/// Fields default to empty so a missing field is reported as a validation
/// failure (400) instead of a deserialization failure.
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[serde(default)]
    #[validate(length(
        min = 1,
        max = 50,
        message = "Username is required and must be at most 50 characters."
    ))]
    pub username: String,
    #[serde(default)]
    #[validate(email(message = "A valid email address is required."))]
    pub email: String,
    #[serde(default)]
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    #[serde(default)]
    #[validate(length(max = 30))]
    pub grade: Option<String>,
}

/// DTO for login. `username` may hold either the username or the email.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

impl LoginRequest {
    /// The identifier to look the account up by, if any was given.
    pub fn identifier(&self) -> Option<&str> {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

/// Response body for signup and login.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub user: UserProfile,
    pub token: String,
}
