use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Json},
    Extension,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{error::Result, middleware::auth::Claims, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotificationsQuery {
    pub unread: bool,
}

#[axum::debug_handler]
pub async fn poll_notifications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Query(query): Query<NotificationsQuery>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let items = state
        .notifications_service
        .list(user_id, query.unread)
        .await?;
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn mark_notification_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let notification = state
        .notifications_service
        .mark_as_read(user_id, id)
        .await?;
    Ok(Json(notification))
}

#[axum::debug_handler]
pub async fn mark_all_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let marked = state.notifications_service.mark_all_read(user_id).await?;
    Ok(Json(json!({ "marked": marked })))
}
