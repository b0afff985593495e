// src/handlers/userdata.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::{Value, json};
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    storage::{KeyValueStore, SqliteStore},
    utils::jwt::Claims,
};

fn userdata_key(user_id: &str) -> String {
    format!("userdata:{}", user_id)
}

/// A token only grants access to its own user's blob.
fn ensure_owner(claims: &Claims, user_id: &str) -> Result<(), AppError> {
    if claims.sub != user_id {
        tracing::warn!(
            "User {} tried to access data of {}",
            claims.username,
            user_id
        );
        return Err(AppError::Forbidden(
            "Cannot access another user's data".to_string(),
        ));
    }
    Ok(())
}

/// Returns the last blob uploaded for `user_id`.
pub async fn get_user_data(
    State(store): State<SqliteStore>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(&claims, &user_id)?;

    let blob = store
        .get(&userdata_key(&user_id))
        .await?
        .ok_or_else(|| AppError::NotFound("No data stored for this user".to_string()))?;

    Ok(Json(blob))
}

/// Replaces the stored blob for `user_id`.
///
/// A numeric top-level `score` is mirrored into `users.total_score` once the
/// blob has been stored.
pub async fn save_user_data(
    State(pool): State<SqlitePool>,
    State(store): State<SqliteStore>,
    Extension(claims): Extension<Claims>,
    Path(user_id): Path<String>,
    Json(blob): Json<Value>,
) -> Result<impl IntoResponse, AppError> {
    ensure_owner(&claims, &user_id)?;

    let score = blob.get("score").and_then(Value::as_i64);

    // The blob is written first; the profile score only follows a stored blob.
    store.set(&userdata_key(&user_id), blob).await?;
    tracing::debug!("Stored user data for {}", user_id);

    if let Some(score) = score {
        sqlx::query("UPDATE users SET total_score = ? WHERE id = ?")
            .bind(score)
            .bind(&user_id)
            .execute(&pool)
            .await?;
    }

    Ok(Json(json!({ "success": true })))
}
