use anyhow::Result;
use chrono::Duration;
use chrono::TimeZone;
use chrono::Utc;

use super::MemoryStore;
use crate::domain::models::Identity;
use crate::domain::models::Message;
use crate::domain::models::MessageRecord;
use crate::domain::models::MessageStore;
use crate::domain::models::Persona;

fn identity(user_id: &str) -> Identity {
    return Identity {
        user_id: user_id.to_string(),
        email: format!("{user_id}@example.com"),
        access_token: "token".to_string(),
    };
}

fn record_at(user_id: &str, content: &str, minutes: i64) -> MessageRecord {
    let mut record = MessageRecord::from_message(user_id, &Message::user(content), None);
    record.timestamp = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap() + Duration::minutes(minutes);
    return record;
}

#[tokio::test]
async fn it_lists_rows_in_timestamp_order() -> Result<()> {
    let store = MemoryStore::with_records(vec![
        record_at("alice", "second", 5),
        record_at("bob", "other", 1),
        record_at("alice", "first", 0),
    ]);

    let rows = store.list(&identity("alice")).await?;
    let contents = rows.iter().map(|e| return e.content.as_str()).collect::<Vec<&str>>();
    assert_eq!(contents, vec!["first", "second"]);

    return Ok(());
}

#[tokio::test]
async fn it_lists_rows_between_bounds() -> Result<()> {
    let store = MemoryStore::with_records(vec![
        record_at("alice", "before", -1),
        record_at("alice", "start", 0),
        record_at("alice", "end", 60),
    ]);

    let start = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();
    let end = start + Duration::minutes(60);
    let rows = store.list_between(&identity("alice"), start, end).await?;

    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].content, "start");

    return Ok(());
}

#[tokio::test]
async fn it_finds_the_latest_persona() -> Result<()> {
    let mut older = MessageRecord::persona_marker("alice", Persona::Brother);
    older.timestamp = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let mut newer = MessageRecord::persona_marker("alice", Persona::Sister);
    newer.timestamp = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();
    let store = MemoryStore::with_records(vec![newer, older, record_at("alice", "hi", 0)]);

    assert_eq!(
        store.latest_persona(&identity("alice")).await?,
        Some(Persona::Sister)
    );
    assert_eq!(store.latest_persona(&identity("bob")).await?, None);

    return Ok(());
}

#[tokio::test]
async fn it_deletes_only_the_callers_rows() -> Result<()> {
    let target = record_at("alice", "target", 1);
    let store = MemoryStore::with_records(vec![
        target.clone(),
        record_at("alice", "kept", 2),
        record_at("bob", "bob's", 0),
    ]);

    store.delete(&identity("bob"), &target.id).await?;
    assert_eq!(store.records("alice").len(), 2);

    store.delete(&identity("alice"), &target.id).await?;
    assert_eq!(store.records("alice").len(), 1);

    store.delete_all(&identity("alice")).await?;
    assert!(store.records("alice").is_empty());
    assert_eq!(store.records("bob").len(), 1);

    return Ok(());
}
