use crate::error::{Error, Result};
use crate::models::message::{Message, ThreadDoc};
use crate::store::{self, ns, SharedStore};
use chrono::Utc;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Clone)]
pub struct MessagesService {
    store: SharedStore,
    write_lock: Arc<Mutex<()>>,
}

impl MessagesService {
    pub fn new(store: SharedStore) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn send(&self, application_id: Uuid, sender_id: Uuid, body: &str) -> Result<Message> {
        if body.trim().is_empty() {
            return Err(Error::BadRequest("message body is empty".to_string()));
        }
        let _guard = self.write_lock.lock().await;
        let namespace = ns::messages(application_id);
        let mut doc: ThreadDoc = store::load_or_default(self.store.as_ref(), &namespace).await?;
        let message = Message {
            id: Uuid::new_v4(),
            application_id,
            sender_id,
            body: body.to_string(),
            created_at: Utc::now(),
            read_at: None,
        };
        doc.messages.push(message.clone());
        store::save(self.store.as_ref(), &namespace, &doc).await?;
        Ok(message)
    }

    pub async fn thread(&self, application_id: Uuid) -> Result<Vec<Message>> {
        let doc: ThreadDoc =
            store::load_or_default(self.store.as_ref(), &ns::messages(application_id)).await?;
        Ok(doc.messages)
    }

    // Marks everything the reader did not send as read.
    pub async fn mark_as_read(&self, application_id: Uuid, reader_id: Uuid) -> Result<usize> {
        let _guard = self.write_lock.lock().await;
        let namespace = ns::messages(application_id);
        let mut doc: ThreadDoc = store::load_or_default(self.store.as_ref(), &namespace).await?;
        let now = Utc::now();
        let mut changed = 0;
        for message in doc
            .messages
            .iter_mut()
            .filter(|m| m.sender_id != reader_id && m.read_at.is_none())
        {
            message.read_at = Some(now);
            changed += 1;
        }
        if changed > 0 {
            store::save(self.store.as_ref(), &namespace, &doc).await?;
        }
        Ok(changed)
    }

    pub async fn unread_count(&self, application_id: Uuid, reader_id: Uuid) -> Result<usize> {
        let doc: ThreadDoc =
            store::load_or_default(self.store.as_ref(), &ns::messages(application_id)).await?;
        Ok(doc
            .messages
            .iter()
            .filter(|m| m.sender_id != reader_id && m.read_at.is_none())
            .count())
    }
}
