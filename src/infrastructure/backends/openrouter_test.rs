use anyhow::Result;
use mockito::Matcher;
use test_utils::completion_fixture;
use test_utils::gita_reply_fixture;

use super::OpenRouter;
use crate::domain::models::Backend;
use crate::domain::models::ChatError;
use crate::domain::models::CompletionMessage;
use crate::domain::models::CompletionRequest;

impl OpenRouter {
    fn with_url(url: String) -> OpenRouter {
        return OpenRouter {
            url,
            referer: "http://localhost".to_string(),
            title: "Sakha Chatbot".to_string(),
        };
    }
}

fn request() -> CompletionRequest {
    return CompletionRequest::new(
        "deepseek/deepseek-r1:free",
        vec![
            CompletionMessage::new("system", "You are Sakha."),
            CompletionMessage::new("user", "What does the Gita say about duty?"),
        ],
    );
}

#[tokio::test]
async fn it_gets_completions() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .match_header("Authorization", "Bearer first-key")
        .match_header("HTTP-Referer", "http://localhost")
        .match_header("X-Title", "Sakha Chatbot")
        .match_body(Matcher::PartialJson(serde_json::json!({
            "model": "deepseek/deepseek-r1:free",
            "temperature": 0.5,
            "max_tokens": 1000,
            "top_p": 0.9,
            "presence_penalty": 0.6,
            "frequency_penalty": 0.5,
            "messages": [
                { "role": "system", "content": "You are Sakha." },
                { "role": "user", "content": "What does the Gita say about duty?" }
            ]
        })))
        .with_status(200)
        .with_body(completion_fixture(gita_reply_fixture()))
        .create_async()
        .await;

    let backend = OpenRouter::with_url(server.url());
    let res = backend.get_completion("first-key", &request()).await?;
    mock.assert_async().await;

    assert_eq!(res, gita_reply_fixture());

    return Ok(());
}

#[tokio::test]
async fn it_maps_too_many_requests_to_quota_exceeded() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(429)
        .with_body(r#"{"error":{"message":"Rate limit exceeded"}}"#)
        .create_async()
        .await;

    let backend = OpenRouter::with_url(server.url());
    let res = backend.get_completion("first-key", &request()).await;
    mock.assert_async().await;

    assert_eq!(res, Err(ChatError::UpstreamQuotaExceeded));

    return Ok(());
}

#[tokio::test]
async fn it_maps_other_statuses() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(502)
        .create_async()
        .await;

    let backend = OpenRouter::with_url(server.url());
    let res = backend.get_completion("first-key", &request()).await;
    mock.assert_async().await;

    assert_eq!(res, Err(ChatError::UpstreamStatus(502)));

    return Ok(());
}

#[tokio::test]
async fn it_rejects_responses_without_content() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body(r#"{"choices":[]}"#)
        .create_async()
        .await;

    let backend = OpenRouter::with_url(server.url());
    let res = backend.get_completion("first-key", &request()).await;
    mock.assert_async().await;

    assert!(matches!(res, Err(ChatError::MalformedResponse(_))));

    return Ok(());
}

#[tokio::test]
async fn it_rejects_non_json_bodies() -> Result<()> {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/chat/completions")
        .with_status(200)
        .with_body("<html>gateway</html>")
        .create_async()
        .await;

    let backend = OpenRouter::with_url(server.url());
    let res = backend.get_completion("first-key", &request()).await;
    mock.assert_async().await;

    assert!(matches!(res, Err(ChatError::MalformedResponse(_))));

    return Ok(());
}

#[tokio::test]
async fn it_maps_unreachable_hosts_to_network_errors() -> Result<()> {
    let backend = OpenRouter::with_url("http://127.0.0.1:1".to_string());
    let res = backend.get_completion("first-key", &request()).await;

    assert!(matches!(res, Err(ChatError::Network(_))));

    return Ok(());
}
