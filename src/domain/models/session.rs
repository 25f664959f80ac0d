use chrono::NaiveDate;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::Language;
use super::Persona;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConversationSession {
    pub persona: Option<Persona>,
    pub language: Language,
    pub initialized: bool,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotaState {
    pub daily_count: u32,
    pub last_count_date: Option<NaiveDate>,
}

/// Durable preferences kept on the local disk. The message list is never part
/// of this snapshot; it's fetched from the message store on session start.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub persona: Option<Persona>,
    pub language: Language,
    pub quota: QuotaState,
}
