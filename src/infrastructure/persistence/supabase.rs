#[cfg(test)]
#[path = "supabase_test.rs"]
mod tests;

use anyhow::bail;
use anyhow::Result;
use async_trait::async_trait;
use chrono::DateTime;
use chrono::SecondsFormat;
use chrono::Utc;
use serde_derive::Deserialize;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Identity;
use crate::domain::models::MessageRecord;
use crate::domain::models::MessageStore;
use crate::domain::models::Persona;

#[derive(Debug, Deserialize)]
struct PersonaRow {
    user_type: Option<Persona>,
}

fn eq(value: &str) -> String {
    return format!("eq.{value}");
}

fn instant(value: DateTime<Utc>) -> String {
    return value.to_rfc3339_opts(SecondsFormat::Millis, true);
}

/// `messages` relation behind Supabase's PostgREST API. Row level security
/// scopes every query to the bearer's rows; `user_id` filters are still sent
/// explicitly.
pub struct SupabaseStore {
    url: String,
    anon_key: String,
}

impl Default for SupabaseStore {
    fn default() -> SupabaseStore {
        return SupabaseStore::new(
            &Config::get(ConfigKey::SupabaseURL),
            &Config::get(ConfigKey::SupabaseAnonKey),
        );
    }
}

impl SupabaseStore {
    pub fn new(url: &str, anon_key: &str) -> SupabaseStore {
        return SupabaseStore {
            url: url.trim_end_matches('/').to_string(),
            anon_key: anon_key.to_string(),
        };
    }

    fn request(&self, method: reqwest::Method, identity: &Identity) -> reqwest::RequestBuilder {
        return reqwest::Client::new()
            .request(method, format!("{url}/rest/v1/messages", url = self.url))
            .header("apikey", &self.anon_key)
            .header(
                "Authorization",
                format!("Bearer {token}", token = identity.access_token),
            );
    }

    async fn fetch<T: serde::de::DeserializeOwned>(
        &self,
        identity: &Identity,
        query: &[(&str, String)],
    ) -> Result<T> {
        let res = self
            .request(reqwest::Method::GET, identity)
            .query(query)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to query messages");
            bail!("Failed to query messages: status {}", res.status().as_u16());
        }

        return Ok(res.json::<T>().await?);
    }

    async fn remove(&self, identity: &Identity, query: &[(&str, String)]) -> Result<()> {
        let res = self
            .request(reqwest::Method::DELETE, identity)
            .query(query)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(status = res.status().as_u16(), "Failed to delete messages");
            bail!("Failed to delete messages: status {}", res.status().as_u16());
        }

        return Ok(());
    }
}

#[async_trait]
impl MessageStore for SupabaseStore {
    async fn insert(&self, identity: &Identity, record: &MessageRecord) -> Result<()> {
        let res = self
            .request(reqwest::Method::POST, identity)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        if !res.status().is_success() {
            tracing::error!(
                status = res.status().as_u16(),
                message_id = record.id,
                "Failed to insert message"
            );
            bail!("Failed to insert message: status {}", res.status().as_u16());
        }

        return Ok(());
    }

    async fn list(&self, identity: &Identity) -> Result<Vec<MessageRecord>> {
        return self
            .fetch(
                identity,
                &[
                    ("select", "*".to_string()),
                    ("user_id", eq(&identity.user_id)),
                    ("order", "timestamp.asc".to_string()),
                ],
            )
            .await;
    }

    async fn list_between(
        &self,
        identity: &Identity,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<MessageRecord>> {
        return self
            .fetch(
                identity,
                &[
                    ("select", "*".to_string()),
                    ("user_id", eq(&identity.user_id)),
                    ("timestamp", format!("gte.{}", instant(start))),
                    ("timestamp", format!("lt.{}", instant(end))),
                    ("order", "timestamp.asc".to_string()),
                ],
            )
            .await;
    }

    async fn latest_persona(&self, identity: &Identity) -> Result<Option<Persona>> {
        let rows: Vec<PersonaRow> = self
            .fetch(
                identity,
                &[
                    ("select", "user_type".to_string()),
                    ("user_id", eq(&identity.user_id)),
                    ("user_type", "not.is.null".to_string()),
                    ("order", "timestamp.desc".to_string()),
                    ("limit", "1".to_string()),
                ],
            )
            .await?;

        return Ok(rows.into_iter().find_map(|e| return e.user_type));
    }

    async fn delete_all(&self, identity: &Identity) -> Result<()> {
        return self
            .remove(identity, &[("user_id", eq(&identity.user_id))])
            .await;
    }

    async fn delete(&self, identity: &Identity, id: &str) -> Result<()> {
        return self
            .remove(
                identity,
                &[("id", eq(id)), ("user_id", eq(&identity.user_id))],
            )
            .await;
    }
}
