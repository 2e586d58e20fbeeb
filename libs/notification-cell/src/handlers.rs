use axum::{
    extract::{Extension, Path, Query, State},
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use shared_models::auth::User;
use shared_models::error::AppError;

use crate::error::NotificationError;
use crate::models::NotificationQuery;
use crate::router::NotificationState;

fn map_notification_error(e: NotificationError) -> AppError {
    match e {
        NotificationError::NotFound(_) => AppError::NotFound(e.to_string()),
        NotificationError::DatabaseError(msg) => AppError::Database(msg),
    }
}

pub async fn list_notifications(
    State(state): State<NotificationState>,
    Extension(user): Extension<User>,
    Query(query): Query<NotificationQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = user.user_id()?;
    let notifications = state
        .notifications
        .list(user_id, query)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({
        "total": notifications.len(),
        "notifications": notifications
    })))
}

pub async fn unread_count(
    State(state): State<NotificationState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let count = state
        .notifications
        .unread_count(user.user_id()?)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({ "unread": count })))
}

pub async fn mark_read(
    State(state): State<NotificationState>,
    Extension(user): Extension<User>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state
        .notifications
        .mark_read(user.user_id()?, notification_id)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({ "success": true })))
}

pub async fn mark_all_read(
    State(state): State<NotificationState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, AppError> {
    let updated = state
        .notifications
        .mark_all_read(user.user_id()?)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({
        "success": true,
        "updated": updated
    })))
}

pub async fn delete_notification(
    State(state): State<NotificationState>,
    Extension(user): Extension<User>,
    Path(notification_id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    state
        .notifications
        .delete(user.user_id()?, notification_id)
        .await
        .map_err(map_notification_error)?;

    Ok(Json(json!({ "success": true })))
}
