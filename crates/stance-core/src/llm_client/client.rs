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


use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use tokio_retry::strategy::{jitter, ExponentialBackoff};
use tokio_retry::RetryIf;
use tracing::warn;

use super::config::LlmConfig;
use super::models::{CompletionResponse, Message};
use crate::errors::{LlmError, LlmResult};

const RETRY_BASE_MILLIS: u64 = 500;
const RETRY_MAX_DELAY: Duration = Duration::from_secs(60);

/// Trait for clients of a text-completion service
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send one request and return the generated text block
    async fn generate_response(
        &self,
        messages: &[Message],
        max_tokens: Option<u32>,
    ) -> LlmResult<CompletionResponse>;

    /// Generate a response and return only its text
    async fn generate_text(&self, messages: &[Message]) -> LlmResult<String> {
        let response = self.generate_response(messages, None).await?;
        if response.content.trim().is_empty() {
            return Err(LlmError::EmptyResponse {
                message: "Completion contained no text".to_string(),
            });
        }
        Ok(response.content)
    }
}

/// Parse a JSON document out of a completion, tolerating markdown code fences
pub fn parse_json_content<T: DeserializeOwned>(content: &str) -> LlmResult<T> {
    let trimmed = content.trim();
    let unfenced = trimmed
        .strip_prefix("```json")
        .or_else(|| trimmed.strip_prefix("```"))
        .map(|rest| rest.trim_end().trim_end_matches("```"))
        .unwrap_or(trimmed);

    match serde_json::from_str(unfenced.trim()) {
        Ok(value) => Ok(value),
        Err(e) => {
            // Fall back to the outermost object in case the model wrapped it in prose
            match (unfenced.find('{'), unfenced.rfind('}')) {
                (Some(start), Some(end)) if start < end => {
                    Ok(serde_json::from_str(&unfenced[start..=end])?)
                }
                _ => Err(LlmError::Json(e)),
            }
        }
    }
}

/// Shared request preparation and retry logic for concrete clients
pub struct BaseLlmClient {
    pub config: LlmConfig,
}

impl BaseLlmClient {
    pub fn new(config: LlmConfig) -> Self {
        Self { config }
    }

    /// Clean input string of invisible unicode and control characters
    pub fn clean_input(&self, input: &str) -> String {
        let zero_width_chars = ['\u{200b}', '\u{200c}', '\u{200d}', '\u{feff}', '\u{2060}'];
        input
            .chars()
            .filter(|c| !zero_width_chars.contains(c))
            .filter(|&c| (c as u32) >= 32 || c == '\n' || c == '\r' || c == '\t')
            .collect()
    }

    /// Clean every message before it goes on the wire
    pub fn prepare_messages(&self, messages: &[Message]) -> Vec<Message> {
        messages
            .iter()
            .map(|m| Message::new(m.role.clone(), self.clean_input(&m.content)))
            .collect()
    }

    /// Execute with exponential backoff, retrying only transient failures
    pub async fn execute_with_retry<F, Fut, T>(&self, operation: F) -> LlmResult<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = LlmResult<T>>,
    {
        let retry_strategy = ExponentialBackoff::from_millis(2)
            .factor(RETRY_BASE_MILLIS)
            .max_delay(RETRY_MAX_DELAY)
            .map(jitter)
            .take(self.config.max_retries);

        RetryIf::start(retry_strategy, operation, |error: &LlmError| {
            let transient = error.is_transient();
            if transient {
                warn!("Transient completion failure, retrying: {}", error);
            }
            transient
        })
        .await
        .map_err(|e| {
            warn!("Completion request failed: {}", e);
            e
        })
    }
}
