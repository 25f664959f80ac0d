use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use super::Identity;
use super::MessageRecord;
use super::Persona;

/// Durable message history owned by the remote store.
#[async_trait]
pub trait MessageStore {
    async fn insert(&self, identity: &Identity, record: &MessageRecord) -> Result<()>;

    /// All rows for the identity ordered by timestamp ascending.
    async fn list(&self, identity: &Identity) -> Result<Vec<MessageRecord>>;

    /// Rows with `start <= timestamp < end`, ordered ascending.
    async fn list_between(
        &self,
        identity: &Identity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MessageRecord>>;

    /// Most recent non-null persona recorded for the identity.
    async fn latest_persona(&self, identity: &Identity) -> Result<Option<Persona>>;

    async fn delete_all(&self, identity: &Identity) -> Result<()>;

    async fn delete(&self, identity: &Identity, id: &str) -> Result<()>;
}

pub type MessageStoreBox = Box<dyn MessageStore + Send + Sync>;
