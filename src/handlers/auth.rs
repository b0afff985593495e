// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::user::{AuthResponse, LoginRequest, SignupRequest, UserProfile},
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
    },
};

const FIND_USER_SQL: &str = r#"
    SELECT id, username, email, password_hash, grade, total_score, created_at
    FROM users
    WHERE username = ? OR email = ?
"#;

/// Registers a new user.
///
/// Usernames and emails must both be unique. The password is hashed with
/// Argon2 before storing. Returns 201 Created with the user and a token.
pub async fn signup(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }

    let username = payload.username.trim();
    let email = payload.email.trim().to_lowercase();
    if username.is_empty() {
        return Err(AppError::BadRequest("Username is required".to_string()));
    }

    let existing: Option<(String,)> =
        sqlx::query_as("SELECT username FROM users WHERE username = ? OR email = ? LIMIT 1")
            .bind(username)
            .bind(&email)
            .fetch_optional(&pool)
            .await?;

    if let Some((taken,)) = existing {
        return Err(if taken == username {
            AppError::Conflict(format!("Username '{}' already exists", username))
        } else {
            AppError::Conflict("Email already registered".to_string())
        });
    }

    let user = UserProfile {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email,
        password_hash: hash_password(&payload.password)?,
        grade: payload.grade.filter(|g| !g.trim().is_empty()),
        total_score: 0,
        created_at: Utc::now(),
    };

    sqlx::query(
        r#"
        INSERT INTO users (id, username, email, password_hash, grade, total_score, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.username)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.grade)
    .bind(user.total_score)
    .bind(user.created_at)
    .execute(&pool)
    .await
    .map_err(|e| {
        // Lost a race with a concurrent signup for the same name or email.
        if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
            AppError::Conflict(format!("Username '{}' already exists", user.username))
        } else {
            tracing::error!("Failed to register user: {:?}", e);
            AppError::from(e)
        }
    })?;

    tracing::info!("Registered user {}", user.username);

    let token = sign_jwt(&user.id, &user.username, &config.jwt_secret, config.jwt_expiration)?;
    Ok((StatusCode::CREATED, Json(AuthResponse { user, token })))
}

/// Authenticates by username or email and returns the user with a token.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    if let Err(validation_errors) = payload.validate() {
        return Err(AppError::BadRequest(validation_errors.to_string()));
    }
    let identifier = payload
        .identifier()
        .ok_or_else(|| AppError::BadRequest("Username or email is required".to_string()))?;

    let user: Option<UserProfile> = sqlx::query_as(FIND_USER_SQL)
        .bind(identifier)
        .bind(identifier.to_lowercase())
        .fetch_optional(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Login DB error: {:?}", e);
            AppError::from(e)
        })?;

    let user = user.ok_or_else(|| AppError::AuthError("Invalid credentials".to_string()))?;

    if !verify_password(&payload.password, &user.password_hash)? {
        tracing::warn!("Failed login for {}", user.username);
        return Err(AppError::AuthError("Invalid credentials".to_string()));
    }

    let token = sign_jwt(&user.id, &user.username, &config.jwt_secret, config.jwt_expiration)?;
    Ok(Json(AuthResponse { user, token }))
}
