use axum::{
    extract::State,
    response::{IntoResponse, Json},
    Extension,
};
use serde_json::json;

use crate::{error::Result, middleware::auth::Claims, AppState};

#[axum::debug_handler]
pub async fn get_summary(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let summary = state.points_service.summary(user_id).await?;
    Ok(Json(json!({
        "earned": summary.earned,
        "spent": summary.spent,
        "balance": summary.balance(),
    })))
}

#[axum::debug_handler]
pub async fn get_history(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims.user_id()?;
    let entries = state.points_service.list(user_id).await?;
    Ok(Json(entries))
}
