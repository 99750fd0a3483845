use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::application::{Application, ApplicationStatus, StatusHistoryEntry};

#[derive(Debug, Clone, Deserialize)]
pub struct UpdateStatusPayload {
    pub status: ApplicationStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationResponse {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub seeker_id: Uuid,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationDetail {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub listing_title: Option<String>,
    pub company: Option<String>,
    pub seeker_id: Uuid,
    pub status: ApplicationStatus,
    pub submitted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// The status change itself is never blocked by history recording; the flag
// tells the client whether the audit entry landed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateResponse {
    pub application: ApplicationResponse,
    pub history_recorded: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusHistoryResponse {
    pub items: Vec<StatusHistoryEntry>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SendMessagePayload {
    #[validate(length(min = 1))]
    pub body: String,
}

impl From<Application> for ApplicationResponse {
    fn from(value: Application) -> Self {
        Self {
            id: value.id,
            listing_id: value.listing_id,
            seeker_id: value.seeker_id,
            status: value.status,
            submitted_at: value.submitted_at,
            updated_at: value.updated_at,
        }
    }
}
