use super::Language;
use super::Persona;

/// User intents forwarded from the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    Cancel(),
    ClearHistory(),
    DeleteMessage(String),
    Initialize(),
    SelectLanguage(Language),
    SelectPersona(Persona),
    SendMessage(String),
    SignIn(String, String),
    SignOut(),
}
