#[cfg(test)]
#[path = "backend_test.rs"]
mod tests;

use async_trait::async_trait;
use serde_derive::Deserialize;
use serde_derive::Serialize;

use super::ChatError;
use super::Message;

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionMessage {
    pub role: String,
    pub content: String,
}

impl CompletionMessage {
    pub fn new(role: &str, content: &str) -> CompletionMessage {
        return CompletionMessage {
            role: role.to_string(),
            content: content.to_string(),
        };
    }
}

impl From<&Message> for CompletionMessage {
    fn from(message: &Message) -> CompletionMessage {
        return CompletionMessage::new(message.role(), &message.content);
    }
}

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub messages: Vec<CompletionMessage>,
    pub temperature: f64,
    pub max_tokens: u32,
    pub top_p: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f64>,
}

impl CompletionRequest {
    pub fn new(model: &str, messages: Vec<CompletionMessage>) -> CompletionRequest {
        return CompletionRequest {
            model: model.to_string(),
            messages,
            temperature: 0.5,
            max_tokens: 1000,
            top_p: 0.9,
            presence_penalty: Some(0.6),
            frequency_penalty: Some(0.5),
        };
    }
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionChoice {
    #[serde(default)]
    pub message: Option<CompletionChoiceMessage>,
}

#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    #[serde(default)]
    pub choices: Vec<CompletionChoice>,
}

impl CompletionResponse {
    /// Pulls `choices[0].message.content` out of the envelope.
    pub fn into_text(self) -> Result<String, ChatError> {
        let content = self
            .choices
            .into_iter()
            .next()
            .and_then(|choice| return choice.message)
            .and_then(|message| return message.content);

        return match content {
            Some(text) if !text.is_empty() => Ok(text),
            Some(_) => Err(ChatError::MalformedResponse("empty content".to_string())),
            None => Err(ChatError::MalformedResponse(
                "missing choices[0].message.content".to_string(),
            )),
        };
    }
}

#[async_trait]
pub trait Backend {
    /// Sends a single chat completion request using the given credential and
    /// returns the assistant's text.
    ///
    /// A 429 must come back as `ChatError::UpstreamQuotaExceeded` so the caller
    /// can rotate credentials; other non-2xx statuses as
    /// `ChatError::UpstreamStatus`, and transport failures as
    /// `ChatError::Network`.
    async fn get_completion(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, ChatError>;
}

pub type BackendBox = Box<dyn Backend + Send + Sync>;
