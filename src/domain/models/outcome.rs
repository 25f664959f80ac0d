use super::ChatError;
use super::Message;
use super::Persona;

/// Result of a single `send_user_message` call as seen by the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SendOutcome {
    AuthenticationRequired,
    DailyLimitReached,
    PersonaPrompted,
    PersonaSelected(Persona),
    Replied(Message),
    Failed(ChatError),
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DeleteOutcome {
    AuthenticationRequired,
    Deleted,
    NotFound,
    Failed,
}
