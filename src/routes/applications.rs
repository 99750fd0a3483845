use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::{
    dto::application_dto::{
        ApplicationResponse, SendMessagePayload, StatusHistoryResponse, StatusUpdateResponse,
        UpdateStatusPayload,
    },
    error::Result,
    middleware::auth::Claims,
    AppState,
};

#[axum::debug_handler]
pub async fn list_my_applications(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let seeker_id = claims.user_id()?;
    let items = state
        .applications_service
        .list_for_seeker(seeker_id)
        .await?;
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn list_applicants(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(listing_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.user_id()?;
    let items = state
        .applications_service
        .list_for_listing(employer_id, listing_id)
        .await?;
    let items: Vec<ApplicationResponse> =
        items.into_iter().map(ApplicationResponse::from).collect();
    Ok(Json(items))
}

#[axum::debug_handler]
pub async fn update_status(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse> {
    let employer_id = claims.user_id()?;
    let (application, history_recorded) = state
        .applications_service
        .update_status(employer_id, application_id, payload.status, payload.notes)
        .await?;
    Ok(Json(StatusUpdateResponse {
        application: ApplicationResponse::from(application),
        history_recorded,
    }))
}

#[axum::debug_handler]
pub async fn get_status_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor_id = claims.user_id()?;
    let items = state
        .applications_service
        .history_for(actor_id, application_id)
        .await?;
    Ok(Json(StatusHistoryResponse { items }))
}

#[axum::debug_handler]
pub async fn get_thread(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor_id = claims.user_id()?;
    state
        .applications_service
        .ensure_participant(actor_id, application_id)
        .await?;
    let messages = state.messages_service.thread(application_id).await?;
    Ok(Json(messages))
}

#[axum::debug_handler]
pub async fn send_message(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
    Json(payload): Json<SendMessagePayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let actor_id = claims.user_id()?;
    state
        .applications_service
        .ensure_participant(actor_id, application_id)
        .await?;
    let message = state
        .messages_service
        .send(application_id, actor_id, &payload.body)
        .await?;
    Ok((StatusCode::CREATED, Json(message)))
}

#[axum::debug_handler]
pub async fn mark_thread_read(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor_id = claims.user_id()?;
    state
        .applications_service
        .ensure_participant(actor_id, application_id)
        .await?;
    let marked = state
        .messages_service
        .mark_as_read(application_id, actor_id)
        .await?;
    Ok(Json(json!({ "marked": marked })))
}

#[axum::debug_handler]
pub async fn get_unread_count(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(application_id): Path<Uuid>,
) -> Result<impl IntoResponse> {
    let actor_id = claims.user_id()?;
    state
        .applications_service
        .ensure_participant(actor_id, application_id)
        .await?;
    let count = state
        .messages_service
        .unread_count(application_id, actor_id)
        .await?;
    Ok(Json(json!({ "unread": count })))
}
