use crate::dto::application_dto::ApplicationDetail;
use crate::error::{Error, Result};
use crate::models::application::{Application, ApplicationStatus, ApplicationsDoc, StatusHistoryEntry};
use crate::models::listing::{Listing, ListingsDoc};
use crate::models::notification::Severity;
use crate::services::notifications::NotificationsService;
use crate::services::status_history::StatusHistoryService;
use crate::services::webhook::WebhookService;
use crate::store::{self, ns, SharedStore};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct ApplicationsService {
    store: SharedStore,
    history: StatusHistoryService,
    notifications: NotificationsService,
    webhook: WebhookService,
    write_lock: Arc<Mutex<()>>,
}

impl ApplicationsService {
    pub fn new(
        store: SharedStore,
        history: StatusHistoryService,
        notifications: NotificationsService,
        webhook: WebhookService,
    ) -> Self {
        Self {
            store,
            history,
            notifications,
            webhook,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Files an application for the listing, or registers attendance when the
    /// listing does not take applications. Re-submission returns the existing
    /// record instead of duplicating it.
    pub async fn submit(&self, seeker_id: Uuid, listing: &Listing) -> Result<Option<Application>> {
        if !listing.requires_application {
            self.notifications
                .notify(
                    listing.employer_id,
                    Severity::Info,
                    &format!("New attendee for {}", listing.title),
                )
                .await;
            return Ok(None);
        }

        let application = {
            let _guard = self.write_lock.lock().await;
            let mut doc: ApplicationsDoc =
                store::load_or_default(self.store.as_ref(), &ns::applications()).await?;
            if let Some(existing) = doc
                .applications
                .iter()
                .find(|a| a.seeker_id == seeker_id && a.listing_id == listing.id)
            {
                return Ok(Some(existing.clone()));
            }
            let now = Utc::now();
            let application = Application {
                id: Uuid::new_v4(),
                listing_id: listing.id,
                seeker_id,
                status: ApplicationStatus::Applicant,
                submitted_at: now,
                updated_at: now,
            };
            doc.applications.push(application.clone());
            store::save(self.store.as_ref(), &ns::applications(), &doc).await?;
            application
        };

        let payload = json!({
            "application_id": application.id,
            "listing_id": listing.id,
            "listing_title": listing.title,
            "seeker_id": seeker_id,
            "submitted_at": application.submitted_at,
        });
        if let Err(err) = self.webhook.deliver("application.submitted", &payload).await {
            warn!(application_id = %application.id, error = %err, "webhook delivery failed");
        }
        self.notifications
            .notify(
                listing.employer_id,
                Severity::Info,
                &format!("New applicant for {}", listing.title),
            )
            .await;

        Ok(Some(application))
    }

    pub async fn get(&self, id: Uuid) -> Result<Application> {
        let doc: ApplicationsDoc =
            store::load_or_default(self.store.as_ref(), &ns::applications()).await?;
        doc.applications
            .into_iter()
            .find(|a| a.id == id)
            .ok_or_else(|| Error::NotFound(format!("application {} not found", id)))
    }

    pub async fn list_for_seeker(&self, seeker_id: Uuid) -> Result<Vec<ApplicationDetail>> {
        let doc: ApplicationsDoc =
            store::load_or_default(self.store.as_ref(), &ns::applications()).await?;
        let listings: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;

        let mut items: Vec<ApplicationDetail> = doc
            .applications
            .into_iter()
            .filter(|a| a.seeker_id == seeker_id)
            .map(|a| {
                let listing = listings.listings.iter().find(|l| l.id == a.listing_id);
                ApplicationDetail {
                    id: a.id,
                    listing_id: a.listing_id,
                    listing_title: listing.map(|l| l.title.clone()),
                    company: listing.map(|l| l.company.clone()),
                    seeker_id: a.seeker_id,
                    status: a.status,
                    submitted_at: a.submitted_at,
                    updated_at: a.updated_at,
                }
            })
            .collect();
        items.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(items)
    }

    // Applicants for one listing, grouped by workflow stage for display.
    pub async fn list_for_listing(
        &self,
        employer_id: Uuid,
        listing_id: Uuid,
    ) -> Result<Vec<Application>> {
        let listing = self.load_listing(listing_id).await?;
        if listing.employer_id != employer_id {
            return Err(Error::Forbidden(
                "listing belongs to another employer".to_string(),
            ));
        }

        let doc: ApplicationsDoc =
            store::load_or_default(self.store.as_ref(), &ns::applications()).await?;
        let mut items: Vec<Application> = doc
            .applications
            .into_iter()
            .filter(|a| a.listing_id == listing_id)
            .collect();
        items.sort_by(|a, b| {
            a.status
                .stage()
                .cmp(&b.status.stage())
                .then(a.submitted_at.cmp(&b.submitted_at))
        });
        Ok(items)
    }

    /// Applies the status change and then records it in the audit history.
    /// The change itself always lands first; a failed history write turns
    /// into `history_recorded = false`, never into a rejected update.
    pub async fn update_status(
        &self,
        employer_id: Uuid,
        application_id: Uuid,
        new_status: ApplicationStatus,
        notes: Option<String>,
    ) -> Result<(Application, bool)> {
        let (application, old_status, listing_title) = {
            let _guard = self.write_lock.lock().await;
            let mut doc: ApplicationsDoc =
                store::load_or_default(self.store.as_ref(), &ns::applications()).await?;
            let application = doc
                .applications
                .iter_mut()
                .find(|a| a.id == application_id)
                .ok_or_else(|| {
                    Error::NotFound(format!("application {} not found", application_id))
                })?;

            let listing = self.load_listing(application.listing_id).await?;
            if listing.employer_id != employer_id {
                return Err(Error::Forbidden(
                    "listing belongs to another employer".to_string(),
                ));
            }

            let old_status = application.status;
            if !ApplicationStatus::permits_transition(old_status, new_status) {
                return Err(Error::BadRequest(format!(
                    "application already has status '{}'",
                    new_status.as_str()
                )));
            }
            application.status = new_status;
            application.updated_at = Utc::now();
            let updated = application.clone();
            store::save(self.store.as_ref(), &ns::applications(), &doc).await?;
            (updated, old_status, listing.title)
        };

        let history_recorded = match self
            .history
            .record_change(
                application_id,
                old_status,
                new_status,
                Some(employer_id),
                notes,
            )
            .await
        {
            Ok(_) => true,
            Err(err) => {
                warn!(
                    application_id = %application_id,
                    error = %err,
                    "status change applied but history was not recorded"
                );
                false
            }
        };

        self.notifications
            .notify(
                application.seeker_id,
                Severity::Info,
                &format!(
                    "Your application for {} moved to {}",
                    listing_title,
                    new_status.as_str()
                ),
            )
            .await;

        Ok((application, history_recorded))
    }

    pub async fn history_for(
        &self,
        actor_id: Uuid,
        application_id: Uuid,
    ) -> Result<Vec<StatusHistoryEntry>> {
        self.ensure_participant(actor_id, application_id).await?;
        self.history.history(application_id).await
    }

    /// Both thread participants may read and write; everyone else is out.
    pub async fn ensure_participant(
        &self,
        actor_id: Uuid,
        application_id: Uuid,
    ) -> Result<Application> {
        let application = self.get(application_id).await?;
        if application.seeker_id == actor_id {
            return Ok(application);
        }
        let listing = self.load_listing(application.listing_id).await?;
        if listing.employer_id == actor_id {
            return Ok(application);
        }
        Err(Error::Forbidden(
            "not a participant of this application".to_string(),
        ))
    }

    async fn load_listing(&self, listing_id: Uuid) -> Result<Listing> {
        let doc: ListingsDoc =
            store::load_or_default(self.store.as_ref(), &ns::listings()).await?;
        doc.listings
            .into_iter()
            .find(|l| l.id == listing_id)
            .ok_or_else(|| Error::NotFound(format!("listing {} not found", listing_id)))
    }
}
