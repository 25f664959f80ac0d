use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::EnumVariantNames;
use strum::IntoEnumIterator;

#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    EnumIter,
    EnumVariantNames,
    strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Language {
    #[default]
    Hinglish,
    English,
    Marathi,
}

impl Language {
    pub fn parse(text: &str) -> Option<Language> {
        let lowered = text.trim().to_lowercase();
        return Language::iter().find(|e| return e.to_string() == lowered);
    }

    /// Language instruction spliced into the system prompt.
    pub fn instruction(&self) -> &'static str {
        match self {
            Language::Hinglish => {
                return "Communicate warmly in Hinglish (Hindi + English), using occasional Sanskrit terms where appropriate";
            }
            Language::English => {
                return "Communicate warmly in English, using occasional Sanskrit terms where appropriate";
            }
            Language::Marathi => {
                return "Communicate warmly in Marathi, using occasional Sanskrit terms where appropriate";
            }
        }
    }
}
