use crate::models::listing::{Listing, ListingKind};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::HashSet;
use uuid::Uuid;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingFilters {
    pub search: Option<String>,
    pub kind: Option<ListingKind>,
    pub category: Option<String>,
    pub experience_level: Option<String>,
    pub education_level: Option<String>,
    pub salary_min: Option<Decimal>,
    pub salary_max: Option<Decimal>,
    pub max_points: Option<i64>,
}

/// Derives the swipe queue: drop excluded ids, then AND the active filters.
/// Output order is input order; nothing here re-sorts.
pub fn visible_queue(
    listings: &[Listing],
    excluded: &HashSet<Uuid>,
    filters: &ListingFilters,
) -> Vec<Listing> {
    listings
        .iter()
        .filter(|listing| !excluded.contains(&listing.id))
        .filter(|listing| matches_filters(listing, filters))
        .cloned()
        .collect()
}

pub fn matches_filters(listing: &Listing, filters: &ListingFilters) -> bool {
    if let Some(query) = non_blank(&filters.search) {
        let query = query.to_lowercase();
        let hit = listing.title.to_lowercase().contains(&query)
            || listing.company.to_lowercase().contains(&query);
        if !hit {
            return false;
        }
    }

    if let Some(kind) = filters.kind {
        if listing.kind != kind {
            return false;
        }
    }

    if let Some(wanted) = non_blank(&filters.category) {
        match listing.category.as_deref() {
            Some(have) if have.eq_ignore_ascii_case(wanted) => {}
            _ => return false,
        }
    }

    if let Some(wanted) = non_blank(&filters.experience_level) {
        match listing.experience_level.as_deref() {
            Some(have) if have.eq_ignore_ascii_case(wanted) => {}
            _ => return false,
        }
    }

    if let Some(wanted) = non_blank(&filters.education_level) {
        match listing.education_level.as_deref() {
            Some(have) if have.eq_ignore_ascii_case(wanted) => {}
            _ => return false,
        }
    }

    if let Some(min) = filters.salary_min {
        match listing.salary_to.or(listing.salary_from) {
            Some(top) if top >= min => {}
            _ => return false,
        }
    }

    if let Some(max) = filters.salary_max {
        match listing.salary_from.or(listing.salary_to) {
            Some(bottom) if bottom <= max => {}
            _ => return false,
        }
    }

    if let Some(max_points) = filters.max_points {
        if listing.minimum_points > max_points {
            return false;
        }
    }

    true
}

// An empty or whitespace-only value means the filter is inactive.
fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
