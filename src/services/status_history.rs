use crate::error::{Error, Result};
use crate::models::application::{ApplicationStatus, StatusHistoryDoc, StatusHistoryEntry};
use crate::store::{self, ns, SharedStore, StoreError};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

/// Audit trail of application status changes. Writes go to the primary
/// record store and drop to a secondary store when the primary is down, so
/// a status change is never lost just because the main store hiccuped.
#[derive(Clone)]
pub struct StatusHistoryService {
    primary: SharedStore,
    secondary: SharedStore,
    write_lock: Arc<Mutex<()>>,
}

impl StatusHistoryService {
    pub fn new(primary: SharedStore, secondary: SharedStore) -> Self {
        Self {
            primary,
            secondary,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn record_change(
        &self,
        application_id: Uuid,
        old_status: ApplicationStatus,
        new_status: ApplicationStatus,
        changed_by: Option<Uuid>,
        notes: Option<String>,
    ) -> Result<StatusHistoryEntry> {
        let entry = StatusHistoryEntry {
            id: Uuid::new_v4(),
            application_id,
            old_status,
            new_status,
            changed_at: Utc::now(),
            changed_by,
            notes,
        };

        let _guard = self.write_lock.lock().await;
        match self.append_to(self.primary.as_ref(), &entry).await {
            Ok(()) => Ok(entry),
            Err(primary_err) => {
                warn!(
                    application_id = %application_id,
                    error = %primary_err,
                    "primary status history write failed, using fallback store"
                );
                match self.append_to(self.secondary.as_ref(), &entry).await {
                    Ok(()) => Ok(entry),
                    Err(secondary_err) => Err(Error::HistoryUnavailable(format!(
                        "primary: {}, fallback: {}",
                        primary_err, secondary_err
                    ))),
                }
            }
        }
    }

    // Newest first, matching display order.
    pub async fn history(&self, application_id: Uuid) -> Result<Vec<StatusHistoryEntry>> {
        let namespace = ns::status_history(application_id);
        match store::load_or_default::<StatusHistoryDoc>(self.primary.as_ref(), &namespace).await
        {
            Ok(doc) => Ok(doc.entries),
            Err(primary_err) => {
                warn!(
                    application_id = %application_id,
                    error = %primary_err,
                    "primary status history read failed, using fallback store"
                );
                match store::load_or_default::<StatusHistoryDoc>(
                    self.secondary.as_ref(),
                    &namespace,
                )
                .await
                {
                    Ok(doc) => Ok(doc.entries),
                    Err(secondary_err) => Err(Error::HistoryUnavailable(format!(
                        "primary: {}, fallback: {}",
                        primary_err, secondary_err
                    ))),
                }
            }
        }
    }

    async fn append_to(
        &self,
        target: &dyn crate::store::RecordStore,
        entry: &StatusHistoryEntry,
    ) -> std::result::Result<(), StoreError> {
        let namespace = ns::status_history(entry.application_id);
        let mut doc: StatusHistoryDoc = store::load_or_default(target, &namespace).await?;
        doc.entries.insert(0, entry.clone());
        store::save(target, &namespace, &doc).await
    }
}
