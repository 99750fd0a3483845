use crate::error::{Error, Result};
use crate::models::notification::{Notification, NotificationsDoc, Severity};
use crate::store::{self, ns, SharedStore};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::warn;
use uuid::Uuid;

#[derive(Clone)]
pub struct NotificationsService {
    store: SharedStore,
    write_lock: Arc<Mutex<()>>,
}

impl NotificationsService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn push(
        &self,
        user_id: Uuid,
        severity: Severity,
        message: &str,
    ) -> Result<Notification> {
        let _guard = self.write_lock.lock().await;
        let namespace = ns::notifications(user_id);
        let mut doc: NotificationsDoc =
            store::load_or_default(self.store.as_ref(), &namespace).await?;
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id,
            severity,
            message: message.to_string(),
            read: false,
            created_at: Utc::now(),
        };
        doc.items.insert(0, notification.clone());
        store::save(self.store.as_ref(), &namespace, &doc).await?;
        Ok(notification)
    }

    // Fire-and-forget variant for flows that must not fail on a lost toast.
    pub async fn notify(&self, user_id: Uuid, severity: Severity, message: &str) {
        if let Err(err) = self.push(user_id, severity, message).await {
            warn!(user_id = %user_id, error = %err, "failed to deliver notification");
        }
    }

    pub async fn list(&self, user_id: Uuid, unread_only: bool) -> Result<Vec<Notification>> {
        let doc: NotificationsDoc =
            store::load_or_default(self.store.as_ref(), &ns::notifications(user_id)).await?;
        if unread_only {
            Ok(doc.items.into_iter().filter(|n| !n.read).collect())
        } else {
            Ok(doc.items)
        }
    }

    pub async fn unread_count(&self, user_id: Uuid) -> Result<usize> {
        let doc: NotificationsDoc =
            store::load_or_default(self.store.as_ref(), &ns::notifications(user_id)).await?;
        Ok(doc.items.iter().filter(|n| !n.read).count())
    }

    pub async fn mark_as_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification> {
        let _guard = self.write_lock.lock().await;
        let namespace = ns::notifications(user_id);
        let mut doc: NotificationsDoc =
            store::load_or_default(self.store.as_ref(), &namespace).await?;
        let notification = doc
            .items
            .iter_mut()
            .find(|n| n.id == id)
            .ok_or_else(|| Error::NotFound(format!("notification {} not found", id)))?;
        notification.read = true;
        let updated = notification.clone();
        store::save(self.store.as_ref(), &namespace, &doc).await?;
        Ok(updated)
    }

    pub async fn mark_all_read(&self, user_id: Uuid) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let namespace = ns::notifications(user_id);
        let mut doc: NotificationsDoc =
            store::load_or_default(self.store.as_ref(), &namespace).await?;
        let mut changed = 0;
        for notification in doc.items.iter_mut().filter(|n| !n.read) {
            notification.read = true;
            changed += 1;
        }
        if changed > 0 {
            store::save(self.store.as_ref(), &namespace, &doc).await?;
        }
        Ok(changed)
    }
}
