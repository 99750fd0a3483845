use crate::error::Result;
use crate::models::action::{ActionKind, ActionLogDoc, ListingAction};
use crate::store::{self, ns, SharedStore};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone)]
pub struct ActionLogService {
    store: SharedStore,
    write_lock: Arc<Mutex<()>>,
}

impl ActionLogService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn append(
        &self,
        user_id: Uuid,
        listing_id: Uuid,
        kind: ActionKind,
    ) -> Result<ListingAction> {
        let _guard = self.write_lock.lock().await;
        let namespace = ns::actions(user_id);
        let mut doc: ActionLogDoc =
            store::load_or_default(self.store.as_ref(), &namespace).await?;
        let action = ListingAction {
            listing_id,
            action: kind,
            user_id,
            created_at: Utc::now(),
        };
        doc.append(action.clone());
        store::save(self.store.as_ref(), &namespace, &doc).await?;
        Ok(action)
    }

    pub async fn remove(&self, user_id: Uuid, listing_id: Uuid, kind: ActionKind) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let namespace = ns::actions(user_id);
        let mut doc: ActionLogDoc =
            store::load_or_default(self.store.as_ref(), &namespace).await?;
        doc.remove(kind, listing_id);
        store::save(self.store.as_ref(), &namespace, &doc).await?;
        Ok(())
    }

    pub async fn load(&self, user_id: Uuid) -> Result<ActionLogDoc> {
        let namespace = ns::actions(user_id);
        Ok(store::load_or_default(self.store.as_ref(), &namespace).await?)
    }

    pub async fn members(&self, user_id: Uuid, kind: ActionKind) -> Result<Vec<Uuid>> {
        let doc = self.load(user_id).await?;
        Ok(doc.members(kind).to_vec())
    }

    pub async fn excluded_ids(&self, user_id: Uuid) -> Result<HashSet<Uuid>> {
        let doc = self.load(user_id).await?;
        Ok(doc.excluded_ids())
    }
}
