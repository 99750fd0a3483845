use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::listing::{Listing, ListingKind};

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateListingPayload {
    pub kind: ListingKind,
    #[validate(length(min = 1))]
    pub title: String,
    #[validate(length(min = 1))]
    pub company: String,
    #[validate(length(min = 1))]
    pub location: String,
    pub category: Option<String>,
    pub experience_level: Option<String>,
    pub education_level: Option<String>,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub minimum_points: Option<i64>,
    pub requires_application: Option<bool>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateListingPayload {
    #[validate(length(min = 1))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub company: Option<String>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    pub category: Option<String>,
    pub experience_level: Option<String>,
    pub education_level: Option<String>,
    pub salary_from: Option<Decimal>,
    pub salary_to: Option<Decimal>,
    pub description: Option<String>,
    #[validate(range(min = 0))]
    pub minimum_points: Option<i64>,
    pub requires_application: Option<bool>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingResponse {
    pub id: uuid::Uuid,
    pub employer_id: uuid::Uuid,
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

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListingListResponse {
    pub items: Vec<ListingResponse>,
}

impl From<Listing> for ListingResponse {
    fn from(value: Listing) -> Self {
        Self {
            id: value.id,
            employer_id: value.employer_id,
            kind: value.kind,
            title: value.title,
            company: value.company,
            location: value.location,
            category: value.category,
            experience_level: value.experience_level,
            education_level: value.education_level,
            salary_from: value.salary_from,
            salary_to: value.salary_to,
            description: value.description,
            minimum_points: value.minimum_points,
            featured: value.featured,
            requires_application: value.requires_application,
            status: value.status,
            created_at: value.created_at,
            updated_at: value.updated_at,
        }
    }
}
