use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use uuid::Uuid;

use crate::{
    dto::listing_dto::{ListingListResponse, ListingResponse},
    dto::swipe_dto::{ActionPayload, GesturePayload, StartSessionPayload},
    error::{Error, Result},
    middleware::auth::Claims,
    models::action::ActionKind,
    AppState,
};

#[axum::debug_handler]
pub async fn start_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<StartSessionPayload>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let session = state
        .swipe_service
        .start_session(user_id, payload.filters)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

#[axum::debug_handler]
pub async fn current_state(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    Ok(Json(state.swipe_service.current_state(user_id).await?))
}

#[axum::debug_handler]
pub async fn gesture(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<GesturePayload>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let outcome = state
        .swipe_service
        .gesture(user_id, payload.dx, payload.dy)
        .await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn act(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ActionPayload>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let outcome = state.swipe_service.act(user_id, payload.action).await?;
    Ok(Json(outcome))
}

#[axum::debug_handler]
pub async fn undo(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    Ok(Json(state.swipe_service.undo(user_id).await?))
}

#[axum::debug_handler]
pub async fn toggle_fullscreen(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    Ok(Json(state.swipe_service.toggle_fullscreen(user_id).await?))
}

fn parse_category(raw: &str) -> Result<ActionKind> {
    raw.parse::<ActionKind>().map_err(Error::BadRequest)
}

// Saved / blocked / applied / ignored shelves, resolved to full listings.
#[axum::debug_handler]
pub async fn list_actioned_listings(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(category): Path<String>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let kind = parse_category(&category)?;
    let ids = state.action_log_service.members(user_id, kind).await?;

    let mut items = Vec::with_capacity(ids.len());
    for id in ids {
        match state.listings_service.get(id).await {
            Ok(listing) => items.push(ListingResponse::from(listing)),
            // A listing deleted by its employer can still sit in the log.
            Err(Error::NotFound(_)) => continue,
            Err(err) => return Err(err),
        }
    }
    Ok(Json(ListingListResponse { items }))
}

// Un-save, un-block or restore: drops the listing from the shelf so it can
// show up in future queues again.
#[axum::debug_handler]
pub async fn remove_action(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path((category, id)): Path<(String, Uuid)>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let kind = parse_category(&category)?;
    state.action_log_service.remove(user_id, id, kind).await?;
    Ok(StatusCode::NO_CONTENT)
}
