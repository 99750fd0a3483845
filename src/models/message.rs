use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub application_id: Uuid,
    pub sender_id: Uuid,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}

// Messages for one application thread, oldest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ThreadDoc {
    pub messages: Vec<Message>,
}
