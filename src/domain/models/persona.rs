#[cfg(test)]
#[path = "persona_test.rs"]
mod tests;

use serde_derive::Deserialize;
use serde_derive::Serialize;
use strum::EnumIter;
use strum::IntoEnumIterator;

/// How the assistant addresses the user.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, EnumIter, strum::Display,
)]
pub enum Persona {
    #[serde(rename = "sakha")]
    #[strum(to_string = "sakha")]
    Brother,
    #[serde(rename = "sakhi")]
    #[strum(to_string = "sakhi")]
    Sister,
}

impl Persona {
    pub fn parse(text: &str) -> Option<Persona> {
        let lowered = text.trim().to_lowercase();
        return Persona::iter().find(|e| {
            return e.to_string() == lowered || e.english_name() == lowered;
        });
    }

    /// Finds a persona keyword anywhere in a free-text reply. Brother keywords
    /// win when both appear.
    pub fn detect(text: &str) -> Option<Persona> {
        let lowered = text.to_lowercase();
        if lowered.contains("sakha") || lowered.contains("brother") {
            return Some(Persona::Brother);
        }
        if lowered.contains("sakhi") || lowered.contains("sister") {
            return Some(Persona::Sister);
        }

        return None;
    }

    pub fn english_name(&self) -> &'static str {
        match self {
            Persona::Brother => return "brother",
            Persona::Sister => return "sister",
        }
    }

    /// Possessive used in greetings, "mere Sakha" / "meri Sakhi".
    pub fn address(&self) -> &'static str {
        match self {
            Persona::Brother => return "mere Sakha",
            Persona::Sister => return "meri Sakhi",
        }
    }
}
