#[cfg(test)]
#[path = "openrouter_test.rs"]
mod tests;

use async_trait::async_trait;
use reqwest::StatusCode;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Backend;
use crate::domain::models::ChatError;
use crate::domain::models::CompletionRequest;
use crate::domain::models::CompletionResponse;

/// OpenAI compatible chat completions served by OpenRouter. Timeouts are
/// owned by the caller; a single call here never retries.
pub struct OpenRouter {
    url: String,
    referer: String,
    title: String,
}

impl Default for OpenRouter {
    fn default() -> OpenRouter {
        return OpenRouter {
            url: Config::get(ConfigKey::ApiURL),
            referer: Config::get(ConfigKey::Referer),
            title: Config::get(ConfigKey::Title),
        };
    }
}

#[async_trait]
impl Backend for OpenRouter {
    #[allow(clippy::implicit_return)]
    async fn get_completion(
        &self,
        api_key: &str,
        request: &CompletionRequest,
    ) -> Result<String, ChatError> {
        let res = reqwest::Client::new()
            .post(format!(
                "{url}/chat/completions",
                url = self.url.trim_end_matches('/')
            ))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("HTTP-Referer", &self.referer)
            .header("X-Title", &self.title)
            .json(request)
            .send()
            .await
            .map_err(|err| {
                tracing::warn!(error = ?err, "Completion request did not reach OpenRouter");
                return ChatError::Network(err.to_string());
            })?;

        let status = res.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(ChatError::UpstreamQuotaExceeded);
        }
        if !status.is_success() {
            tracing::error!(
                status = status.as_u16(),
                "Failed to make completion request to OpenRouter"
            );
            return Err(ChatError::UpstreamStatus(status.as_u16()));
        }

        let body = res
            .text()
            .await
            .map_err(|err| return ChatError::Network(err.to_string()))?;
        tracing::debug!(body, "Completion response");

        let completion = serde_json::from_str::<CompletionResponse>(&body)
            .map_err(|err| return ChatError::MalformedResponse(err.to_string()))?;

        return completion.into_text();
    }
}
