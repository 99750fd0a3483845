use crate::error::{Error, Result};
use crate::models::points::{EntryKind, LedgerDoc, PointsEntry, PointsSummary};
use crate::store::{self, ns, SharedStore};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

pub const APPLY_REWARD_POINTS: i64 = 10;

#[derive(Clone)]
pub struct PointsService {
    store: SharedStore,
    write_lock: Arc<Mutex<()>>,
    welcome_grant: i64,
}

impl PointsService {
    pub fn new(store: SharedStore, welcome_grant: i64) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
            welcome_grant,
        }
    }

    pub async fn credit(
        &self,
        user_id: Uuid,
        amount: i64,
        description: &str,
        category: &str,
    ) -> Result<PointsEntry> {
        if amount <= 0 {
            return Err(Error::BadRequest(
                "points amount must be positive".to_string(),
            ));
        }
        let _guard = self.write_lock.lock().await;
        let namespace = ns::points(user_id);
        let mut doc: LedgerDoc = store::load_or_default(self.store.as_ref(), &namespace).await?;
        let entry = new_entry(user_id, EntryKind::Earned, amount, description, category);
        doc.prepend(entry.clone());
        store::save(self.store.as_ref(), &namespace, &doc).await?;
        Ok(entry)
    }

    // Refuses to overdraw; the balance check and the append happen under the
    // same write lock.
    pub async fn debit(
        &self,
        user_id: Uuid,
        amount: i64,
        description: &str,
        category: &str,
    ) -> Result<PointsEntry> {
        if amount <= 0 {
            return Err(Error::BadRequest(
                "points amount must be positive".to_string(),
            ));
        }
        let _guard = self.write_lock.lock().await;
        let namespace = ns::points(user_id);
        let mut doc: LedgerDoc = store::load_or_default(self.store.as_ref(), &namespace).await?;
        let balance = doc.summary().balance();
        if balance < amount {
            return Err(Error::InsufficientPoints {
                required: amount,
                balance,
            });
        }
        let entry = new_entry(user_id, EntryKind::Spent, amount, description, category);
        doc.prepend(entry.clone());
        store::save(self.store.as_ref(), &namespace, &doc).await?;
        Ok(entry)
    }

    // Grants the starting balance exactly once, on first contact with an
    // empty ledger. A zero or negative configured grant disables it.
    pub async fn ensure_welcome_grant(&self, user_id: Uuid) -> Result<Option<PointsEntry>> {
        if self.welcome_grant <= 0 {
            return Ok(None);
        }
        let _guard = self.write_lock.lock().await;
        let namespace = ns::points(user_id);
        let mut doc: LedgerDoc = store::load_or_default(self.store.as_ref(), &namespace).await?;
        if !doc.entries.is_empty() {
            return Ok(None);
        }
        let entry = new_entry(
            user_id,
            EntryKind::Earned,
            self.welcome_grant,
            "Welcome bonus",
            "welcome",
        );
        doc.prepend(entry.clone());
        store::save(self.store.as_ref(), &namespace, &doc).await?;
        Ok(Some(entry))
    }

    pub async fn list(&self, user_id: Uuid) -> Result<Vec<PointsEntry>> {
        let doc: LedgerDoc =
            store::load_or_default(self.store.as_ref(), &ns::points(user_id)).await?;
        Ok(doc.entries)
    }

    pub async fn summary(&self, user_id: Uuid) -> Result<PointsSummary> {
        let doc: LedgerDoc =
            store::load_or_default(self.store.as_ref(), &ns::points(user_id)).await?;
        Ok(doc.summary())
    }

    pub async fn balance(&self, user_id: Uuid) -> Result<i64> {
        Ok(self.summary(user_id).await?.balance())
    }
}

fn new_entry(
    user_id: Uuid,
    kind: EntryKind,
    amount: i64,
    description: &str,
    category: &str,
) -> PointsEntry {
    PointsEntry {
        id: Uuid::new_v4(),
        user_id,
        kind,
        amount,
        description: description.to_string(),
        category: category.to_string(),
        created_at: Utc::now(),
    }
}
