use crate::dto::listing_dto::{CreateListingPayload, UpdateListingPayload};
use crate::error::{Error, Result};
use crate::models::listing::{Listing, ListingKind, ListingsDoc};
use crate::services::filter::{matches_filters, ListingFilters};
use crate::services::points::PointsService;
use crate::store::{self, ns, SharedStore};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone)]
pub struct ListingsService {
    store: SharedStore,
    points: PointsService,
    feature_cost: i64,
    write_lock: Arc<Mutex<()>>,
}

impl ListingsService {
    pub fn new(store: SharedStore, points: PointsService, feature_cost: i64) -> Self {
        Self {
            store,
            points,
            feature_cost,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn create(&self, employer_id: Uuid, payload: CreateListingPayload) -> Result<Listing> {
        let _guard = self.write_lock.lock().await;
        let mut doc: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;
        let now = Utc::now();
        let listing = Listing {
            id: Uuid::new_v4(),
            employer_id,
            kind: payload.kind,
            title: payload.title,
            company: payload.company,
            location: payload.location,
            category: payload.category,
            experience_level: payload.experience_level,
            education_level: payload.education_level,
            salary_from: payload.salary_from,
            salary_to: payload.salary_to,
            description: payload.description,
            minimum_points: payload.minimum_points.unwrap_or(0),
            featured: false,
            requires_application: payload
                .requires_application
                .unwrap_or(payload.kind == ListingKind::Job),
            status: payload.status.unwrap_or_else(|| "draft".to_string()),
            created_at: now,
            updated_at: now,
        };
        doc.listings.push(listing.clone());
        store::save(self.store.as_ref(), &ns::listings(), &doc).await?;
        Ok(listing)
    }

    pub async fn update(
        &self,
        employer_id: Uuid,
        id: Uuid,
        payload: UpdateListingPayload,
    ) -> Result<Listing> {
        let _guard = self.write_lock.lock().await;
        let mut doc: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;
        let listing = doc
            .listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| Error::NotFound(format!("listing {} not found", id)))?;
        if listing.employer_id != employer_id {
            return Err(Error::Forbidden(
                "listing belongs to another employer".to_string(),
            ));
        }

        if let Some(title) = payload.title {
            listing.title = title;
        }
        if let Some(company) = payload.company {
            listing.company = company;
        }
        if let Some(location) = payload.location {
            listing.location = location;
        }
        if payload.category.is_some() {
            listing.category = payload.category;
        }
        if payload.experience_level.is_some() {
            listing.experience_level = payload.experience_level;
        }
        if payload.education_level.is_some() {
            listing.education_level = payload.education_level;
        }
        if payload.salary_from.is_some() {
            listing.salary_from = payload.salary_from;
        }
        if payload.salary_to.is_some() {
            listing.salary_to = payload.salary_to;
        }
        if payload.description.is_some() {
            listing.description = payload.description;
        }
        if let Some(minimum_points) = payload.minimum_points {
            listing.minimum_points = minimum_points;
        }
        if let Some(requires_application) = payload.requires_application {
            listing.requires_application = requires_application;
        }
        if let Some(status) = payload.status {
            listing.status = status;
        }
        listing.updated_at = Utc::now();

        let updated = listing.clone();
        store::save(self.store.as_ref(), &ns::listings(), &doc).await?;
        Ok(updated)
    }

    pub async fn delete(&self, employer_id: Uuid, id: Uuid) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut doc: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;
        let listing = doc
            .listings
            .iter()
            .find(|l| l.id == id)
            .ok_or_else(|| Error::NotFound(format!("listing {} not found", id)))?;
        if listing.employer_id != employer_id {
            return Err(Error::Forbidden(
                "listing belongs to another employer".to_string(),
            ));
        }
        doc.listings.retain(|l| l.id != id);
        store::save(self.store.as_ref(), &ns::listings(), &doc).await?;
        Ok(())
    }

    // Marks a listing as featured, paid for from the employer's ledger.
    pub async fn feature(&self, employer_id: Uuid, id: Uuid) -> Result<Listing> {
        let _guard = self.write_lock.lock().await;
        let mut doc: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;
        let listing = doc
            .listings
            .iter_mut()
            .find(|l| l.id == id)
            .ok_or_else(|| Error::NotFound(format!("listing {} not found", id)))?;
        if listing.employer_id != employer_id {
            return Err(Error::Forbidden(
                "listing belongs to another employer".to_string(),
            ));
        }
        if listing.featured {
            return Err(Error::BadRequest("listing is already featured".to_string()));
        }

        self.points
            .debit(
                employer_id,
                self.feature_cost,
                &format!("Featured listing: {}", listing.title),
                "feature",
            )
            .await?;

        listing.featured = true;
        listing.updated_at = Utc::now();
        let updated = listing.clone();
        store::save(self.store.as_ref(), &ns::listings(), &doc).await?;
        Ok(updated)
    }

    pub async fn get(&self, id: Uuid) -> Result<Listing> {
        let doc: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;
        doc.listings
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| Error::NotFound(format!("listing {} not found", id)))
    }

    pub async fn list_for_employer(&self, employer_id: Uuid) -> Result<Vec<Listing>> {
        let doc: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;
        Ok(doc
            .listings
            .into_iter()
            .filter(|l| l.employer_id == employer_id)
            .collect())
    }

    // Published listings with featured ones floated to the front; relative
    // order is otherwise insertion order. Downstream queue derivation never
    // re-sorts, so this is the one place ordering is decided.
    pub async fn browse(&self, filters: &ListingFilters) -> Result<Vec<Listing>> {
        let doc: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;
        let mut featured = Vec::new();
        let mut rest = Vec::new();
        for listing in doc.listings {
            if listing.status != "published" || !matches_filters(&listing, filters) {
                continue;
            }
            if listing.featured {
                featured.push(listing);
            } else {
                rest.push(listing);
            }
        }
        featured.extend(rest);
        Ok(featured)
    }
}
