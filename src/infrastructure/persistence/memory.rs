#[cfg(test)]
#[path = "memory_test.rs"]
mod tests;

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;

use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::domain::models::Identity;
use crate::domain::models::MessageRecord;
use crate::domain::models::MessageStore;
use crate::domain::models::Persona;

/// Process local message store used offline and in tests. Clones share rows.
#[derive(Clone, Default)]
pub struct MemoryStore {
    rows: Arc<Mutex<Vec<MessageRecord>>>,
}

impl MemoryStore {
    pub fn with_records(records: Vec<MessageRecord>) -> MemoryStore {
        return MemoryStore {
            rows: Arc::new(Mutex::new(records)),
        };
    }

    fn rows(&self) -> MutexGuard<'_, Vec<MessageRecord>> {
        return self
            .rows
            .lock()
            .unwrap_or_else(|poisoned| return poisoned.into_inner());
    }

    /// Every row for `user_id`, ordered by timestamp.
    pub fn records(&self, user_id: &str) -> Vec<MessageRecord> {
        let mut records = self
            .rows()
            .iter()
            .filter(|e| return e.user_id == user_id)
            .cloned()
            .collect::<Vec<MessageRecord>>();
        records.sort_by_key(|e| return e.timestamp);

        return records;
    }
}

#[async_trait]
impl MessageStore for MemoryStore {
    async fn insert(&self, _identity: &Identity, record: &MessageRecord) -> Result<()> {
        self.rows().push(record.clone());
        return Ok(());
    }

    async fn list(&self, identity: &Identity) -> Result<Vec<MessageRecord>> {
        return Ok(self.records(&identity.user_id));
    }

    async fn list_between(
        &self,
        identity: &Identity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MessageRecord>> {
        return Ok(self
            .records(&identity.user_id)
            .into_iter()
            .filter(|e| return e.timestamp >= start && e.timestamp < end)
            .collect());
    }

    async fn latest_persona(&self, identity: &Identity) -> Result<Option<Persona>> {
        return Ok(self
            .records(&identity.user_id)
            .into_iter()
            .rev()
            .find_map(|e| return e.user_type));
    }

    async fn delete_all(&self, identity: &Identity) -> Result<()> {
        self.rows().retain(|e| return e.user_id != identity.user_id);
        return Ok(());
    }

    async fn delete(&self, identity: &Identity, id: &str) -> Result<()> {
        self.rows()
            .retain(|e| return !(e.user_id == identity.user_id && e.id == id));
        return Ok(());
    }
}
