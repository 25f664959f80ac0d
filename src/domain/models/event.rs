use super::Message;
use super::Persona;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub text: String,
}

impl Toast {
    pub fn success(text: &str) -> Toast {
        return Toast {
            level: ToastLevel::Success,
            text: text.to_string(),
        };
    }

    pub fn error(text: &str) -> Toast {
        return Toast {
            level: ToastLevel::Error,
            text: text.to_string(),
        };
    }
}

/// State changes pushed from the controller to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    AuthenticationRequired(),
    AssistantComposing(bool),
    HistoryCleared(),
    HistoryLoaded(Vec<Message>),
    MessageAdded(Message),
    MessageDeleted(String),
    PersonaSelected(Persona),
    SignedOut(),
    Toast(Toast),
}
