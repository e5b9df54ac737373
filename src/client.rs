use anyhow::{anyhow, Context, Result};
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};

use crate::conversation::ChatMessage;

#[derive(Debug, Clone, Serialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    pub stream: bool,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        ChatRequest {
            model: model.into(),
            messages,
            stream: false,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    content: String,
}

/// Non-streaming client for an OpenAI-compatible `/v1/chat/completions` endpoint.
#[derive(Debug, Clone)]
pub struct ChatClient {
    endpoint: String,
    client: reqwest::Client,
}

impl ChatClient {
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        ChatClient {
            endpoint: endpoint.into(),
            client: reqwest::Client::new(),
        }
    }

    /// Returns `choices[0].message.content`. No timeout is set.
    pub async fn complete(&self, request: &ChatRequest) -> Result<String> {
        log::debug!(
            "POST {} model={} messages={}",
            self.endpoint,
            request.model,
            request.messages.len()
        );

        let response = self
            .client
            .post(&self.endpoint)
            .header(CONTENT_TYPE, "application/json")
            .json(request)
            .send()
            .await
            .with_context(|| format!("request to {} failed", self.endpoint))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("chat API error ({}): {}", status, body));
        }

        let data: ChatCompletionResponse = response
            .json()
            .await
            .context("unexpected chat completion response")?;

        data.choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("chat completion response has no choices"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    fn hello_request() -> ChatRequest {
        ChatRequest::new(
            "deepseek-chat",
            vec![ChatMessage::assistant("Greetings"), ChatMessage::user("Hello")],
        )
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(hello_request()).unwrap();
        assert_eq!(
            body,
            json!({
                "model": "deepseek-chat",
                "messages": [
                    {"role": "assistant", "content": "Greetings"},
                    {"role": "user", "content": "Hello"}
                ],
                "stream": false
            })
        );
    }

    #[tokio::test]
    async fn test_complete_returns_first_choice() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("content-type", "application/json")
                    .json_body(json!({
                        "model": "deepseek-chat",
                        "messages": [
                            {"role": "assistant", "content": "Greetings"},
                            {"role": "user", "content": "Hello"}
                        ],
                        "stream": false
                    }));
                then.status(200).json_body(json!({
                    "choices": [
                        {"message": {"role": "assistant", "content": "first"}},
                        {"message": {"role": "assistant", "content": "second"}}
                    ]
                }));
            })
            .await;

        let client = ChatClient::with_endpoint(server.url("/v1/chat/completions"));
        let content = client.complete(&hello_request()).await.unwrap();

        mock.assert_async().await;
        assert_eq!(content, "first");
    }

    #[tokio::test]
    async fn test_non_success_status_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(503).body("model not loaded");
            })
            .await;

        let client = ChatClient::with_endpoint(server.url("/v1/chat/completions"));
        let err = client.complete(&hello_request()).await.unwrap_err();
        let message = format!("{:#}", err);
        assert!(message.contains("503"));
        assert!(message.contains("model not loaded"));
    }

    #[tokio::test]
    async fn test_missing_content_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({"choices": [{"message": {}}]}));
            })
            .await;

        let client = ChatClient::with_endpoint(server.url("/v1/chat/completions"));
        assert!(client.complete(&hello_request()).await.is_err());
    }

    #[tokio::test]
    async fn test_empty_choices_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).json_body(json!({"choices": []}));
            })
            .await;

        let client = ChatClient::with_endpoint(server.url("/v1/chat/completions"));
        let err = client.complete(&hello_request()).await.unwrap_err();
        assert!(err.to_string().contains("no choices"));
    }

    #[tokio::test]
    async fn test_malformed_json_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/chat/completions");
                then.status(200).body("<html>not json</html>");
            })
            .await;

        let client = ChatClient::with_endpoint(server.url("/v1/chat/completions"));
        let err = client.complete(&hello_request()).await.unwrap_err();
        assert!(err.to_string().contains("unexpected chat completion response"));
    }
}
