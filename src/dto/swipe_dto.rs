use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dto::listing_dto::ListingResponse;
use crate::models::action::ActionKind;
use crate::services::filter::ListingFilters;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StartSessionPayload {
    pub filters: ListingFilters,
}

// Pointer displacement at release, in pixels. The client reports the raw
// drag vector; classification happens server side.
#[derive(Debug, Clone, Deserialize)]
pub struct GesturePayload {
    pub dx: f64,
    pub dy: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionPayload {
    pub action: ActionKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingActionView {
    pub listing_id: Uuid,
    pub action: ActionKind,
    pub expires_in_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeStateResponse {
    pub phase: String,
    pub index: usize,
    pub total: usize,
    pub current: Option<ListingResponse>,
    pub pending: Option<PendingActionView>,
    pub fullscreen: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GestureOutcome {
    pub accepted: bool,
    pub notice: Option<String>,
    pub state: SwipeStateResponse,
}
