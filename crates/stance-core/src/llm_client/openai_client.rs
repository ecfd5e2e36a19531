/*
Copyright 2024, Zep Software, Inc.

Licensed under the Apache License, Version 2.0 (the "License");
you may not use this file except in compliance with the License.
You may obtain a copy of the License at

    http://www.apache.org/licenses/LICENSE-2.0

Unless required by applicable law or agreed to in writing, software
distributed under the License is distributed on an "AS IS" BASIS,
WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
See the License for the specific language governing permissions and
limitations under the License.
*/


use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{BaseLlmClient, LlmClient};
use super::config::LlmConfig;
use super::models::{CompletionResponse, Message, TokenUsage};
use crate::errors::{LlmError, LlmResult};

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
    refusal: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    model: Option<String>,
    usage: Option<ChatUsage>,
    #[serde(default)]
    error: Option<ChatError>,
}

#[derive(Debug, Deserialize)]
struct ChatError {
    message: String,
}

/// Client for any OpenAI-compatible chat completions endpoint (OpenAI, OpenRouter, ...)
pub struct OpenAiClient {
    base_client: BaseLlmClient,
    http_client: Client,
    base_url: String,
    api_key: String,
}

impl OpenAiClient {
    pub fn new(config: LlmConfig) -> LlmResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| LlmError::Authentication {
                message: "An API key for the completion service is required".to_string(),
            })?;

        let base_url = config.resolved_base_url();

        let http_client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::InvalidConfig {
                message: format!("Failed to create HTTP client: {}", e),
            })?;

        Ok(Self {
            base_client: BaseLlmClient::new(config),
            http_client,
            base_url,
            api_key,
        })
    }

    async fn send_request(
        &self,
        messages: &[Message],
        max_tokens: Option<u32>,
    ) -> LlmResult<CompletionResponse> {
        let config = &self.base_client.config;
        let request = ChatRequest {
            model: &config.model,
            messages,
            temperature: config.temperature,
            max_tokens: max_tokens.unwrap_or(config.max_tokens),
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {} (model {}, {} messages)", url, config.model, messages.len());

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Timeout {
                        message: e.to_string(),
                    }
                } else {
                    LlmError::Http(e)
                }
            })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Authentication {
                message: format!("HTTP {} - {}", status, error_text),
            });
        }
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(LlmError::Service {
                status: status.as_u16(),
                message: error_text,
            });
        }

        let chat_response: ChatResponse = response.json().await?;
        into_completion(chat_response)
    }
}

fn into_completion(chat_response: ChatResponse) -> LlmResult<CompletionResponse> {
    if let Some(error) = chat_response.error {
        return Err(LlmError::Service {
            status: 200,
            message: error.message,
        });
    }

    let choice = chat_response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LlmError::EmptyResponse {
            message: "No choices in response".to_string(),
        })?;

    if let Some(refusal) = choice.message.refusal {
        return Err(LlmError::Refusal { message: refusal });
    }

    let content = choice
        .message
        .content
        .ok_or_else(|| LlmError::EmptyResponse {
            message: "No content in response".to_string(),
        })?;

    Ok(CompletionResponse {
        content,
        model: chat_response.model,
        usage: chat_response
            .usage
            .map(|u| TokenUsage::new(u.prompt_tokens, u.completion_tokens)),
    })
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate_response(
        &self,
        messages: &[Message],
        max_tokens: Option<u32>,
    ) -> LlmResult<CompletionResponse> {
        let prepared = self.base_client.prepare_messages(messages);
        self.base_client
            .execute_with_retry(|| self.send_request(&prepared, max_tokens))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_api_key() {
        let result = OpenAiClient::new(LlmConfig::default());
        assert!(matches!(result, Err(LlmError::Authentication { .. })));
    }

    #[test]
    fn test_request_serialization() {
        let messages = vec![Message::system("sys"), Message::user("hi")];
        let request = ChatRequest {
            model: "gpt-4o",
            messages: &messages,
            temperature: 0.0,
            max_tokens: 16,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], "gpt-4o");
        assert_eq!(value["temperature"], 0.0);
        assert_eq!(value["messages"][0]["role"], "system");
        assert_eq!(value["messages"][1]["content"], "hi");
    }

    #[test]
    fn test_response_with_content() {
        let raw = r#"{
            "model": "gpt-4o",
            "choices": [{"message": {"content": "FAVOR"}, "finish_reason": "stop"}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 1, "total_tokens": 11}
        }"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        let completion = into_completion(parsed).unwrap();
        assert_eq!(completion.content, "FAVOR");
        assert_eq!(completion.usage.unwrap().total_tokens, 11);
    }

    #[test]
    fn test_response_with_refusal() {
        let raw = r#"{"choices": [{"message": {"content": null, "refusal": "cannot"}}]}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            into_completion(parsed),
            Err(LlmError::Refusal { .. })
        ));
    }

    #[test]
    fn test_response_with_error_body() {
        let raw = r#"{"error": {"message": "quota exceeded", "code": 402}}"#;
        let parsed: ChatResponse = serde_json::from_str(raw).unwrap();
        assert!(matches!(
            into_completion(parsed),
            Err(LlmError::Service { .. })
        ));
    }

    #[test]
    fn test_response_without_choices() {
        let parsed: ChatResponse = serde_json::from_str(r#"{"choices": []}"#).unwrap();
        assert!(matches!(
            into_completion(parsed),
            Err(LlmError::EmptyResponse { .. })
        ));
    }
}
