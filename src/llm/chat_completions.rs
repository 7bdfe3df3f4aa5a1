//! OpenAI-compatible chat-completions client (Groq, OpenRouter, ...).
//!
//! One HTTP request per call. No timeout beyond what the transport applies.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::error::LlmError;
use super::{ChatMessage, ChatOptions, ChatResponse, LlmClient, ResponseFormat, TokenUsage};

pub const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

/// Chat-completions client for any OpenAI-compatible endpoint.
pub struct ChatCompletionsClient {
    client: Client,
    api_url: String,
    api_key: String,
}

impl ChatCompletionsClient {
    /// Create a client for an endpoint such as [`GROQ_API_URL`].
    pub fn with_url(api_url: String, api_key: String) -> Self {
        Self {
            client: Client::new(),
            api_url,
            api_key,
        }
    }

    /// Execute a single request.
    async fn execute_request(&self, request: &CompletionRequest) -> Result<ChatResponse, LlmError> {
        let response = match self
            .client
            .post(&self.api_url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(request)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                if e.is_timeout() {
                    return Err(LlmError::network_error(format!("Request timeout: {}", e)));
                } else if e.is_connect() {
                    return Err(LlmError::network_error(format!("Connection failed: {}", e)));
                } else {
                    return Err(LlmError::network_error(format!("Request failed: {}", e)));
                }
            }
        };

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LlmError::from_status(status.as_u16(), body));
        }

        let parsed: CompletionResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::parse_error(format!("Failed to parse response: {}, body: {}", e, body))
        })?;

        let choice = parsed
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::parse_error("No choices in response".to_string()))?;

        Ok(ChatResponse {
            content: choice.message.content,
            finish_reason: choice.finish_reason,
            usage: parsed
                .usage
                .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
            model: parsed.model.or_else(|| Some(request.model.clone())),
        })
    }
}

#[async_trait]
impl LlmClient for ChatCompletionsClient {
    async fn chat_completion(
        &self,
        model: &str,
        messages: &[ChatMessage],
        options: ChatOptions,
    ) -> Result<ChatResponse, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::not_configured("No API key configured"));
        }

        let request = CompletionRequest {
            model: model.to_string(),
            messages: messages.to_vec(),
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            response_format: options.response_format,
        };

        tracing::debug!("Sending chat completion: url={} model={}", self.api_url, model);

        match self.execute_request(&request).await {
            Ok(response) => {
                if let Some(usage) = &response.usage {
                    tracing::debug!(
                        "Chat completion used {} prompt + {} completion tokens",
                        usage.prompt_tokens,
                        usage.completion_tokens
                    );
                }
                Ok(response)
            }
            Err(error) => {
                tracing::error!("Chat completion failed: {}", error);
                Err(error)
            }
        }
    }
}

/// Chat-completions request body.
#[derive(Debug, Serialize)]
struct CompletionRequest {
    model: String,
    messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

/// Chat-completions response body.
#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
    #[serde(default)]
    usage: Option<CompletionUsage>,
    #[serde(default)]
    model: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    content: Option<String>,
}

/// Usage data (OpenAI-compatible).
#[derive(Debug, Deserialize)]
struct CompletionUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::Role;

    #[test]
    fn test_request_serialization() {
        let request = CompletionRequest {
            model: "llama-3.3-70b-versatile".to_string(),
            messages: vec![ChatMessage::new(Role::System, "sys"), ChatMessage::user("hi")],
            temperature: Some(0.8),
            max_tokens: None,
            response_format: Some(ResponseFormat::json_object()),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
        assert_eq!(value["response_format"]["type"], "json_object");
        assert!(value.get("max_tokens").is_none());
    }

    #[test]
    fn test_response_parsing() {
        let body = r#"{
            "choices": [{"message": {"role": "assistant", "content": "{\"pillars\": []}"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5, "total_tokens": 15},
            "model": "llama"
        }"#;
        let parsed: CompletionResponse = serde_json::from_str(body).unwrap();
        assert_eq!(parsed.choices.len(), 1);
        assert_eq!(parsed.choices[0].message.content.as_deref(), Some("{\"pillars\": []}"));
        assert_eq!(parsed.usage.unwrap().completion_tokens, 5);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_network_error() {
        let client = ChatCompletionsClient::with_url(
            "http://127.0.0.1:9/v1/chat/completions".to_string(),
            "key".to_string(),
        );
        let err = client
            .chat_completion("m", &[ChatMessage::user("hi")], ChatOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::llm::LlmErrorKind::Network);
    }

    #[tokio::test]
    async fn test_missing_key_fails_before_sending() {
        // Port 9 is never contacted: a network attempt would report Network.
        let client = ChatCompletionsClient::with_url(
            "http://127.0.0.1:9/v1/chat/completions".to_string(),
            "  ".to_string(),
        );
        let err = client
            .chat_completion("m", &[ChatMessage::user("hi")], ChatOptions::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind, crate::llm::LlmErrorKind::NotConfigured);
        assert_eq!(err.to_string(), "not configured: No API key configured");
    }
}
