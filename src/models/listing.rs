use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingKind {
    Job,
    Event,
}

impl ListingKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingKind::Job => "job",
            ListingKind::Event => "event",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub kind: ListingKind,
    pub title: String,
    pub company: String,
    pub location: String,
    pub category: Option<String>,
    pub experience_level: Option<String>,
    pub education_level: Option<String>,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    pub description: Option<String>,
    pub minimum_points: i64,
    pub featured: bool,
    pub requires_application: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListingsDoc {
    pub listings: Vec<Listing>,
}
