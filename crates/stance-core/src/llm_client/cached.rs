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


//! Caching wrapper for LLM clients

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::cache::{generate_cache_key, Cache};
use crate::errors::LlmResult;
use crate::llm_client::{
    models::{CompletionResponse, Message},
    LlmClient,
};

/// Wrapper that adds response caching to any LlmClient implementation.
///
/// The namespace should identify everything that changes the output for a
/// given message list (model name and temperature); re-runs of a stage then
/// reuse earlier completions instead of calling the service again.
pub struct CachedLlmClient {
    inner: Arc<dyn LlmClient>,
    cache: Arc<dyn Cache>,
    namespace: String,
}

impl CachedLlmClient {
    pub fn new(inner: Arc<dyn LlmClient>, cache: Arc<dyn Cache>, namespace: impl Into<String>) -> Self {
        Self {
            inner,
            cache,
            namespace: namespace.into(),
        }
    }

    fn response_cache_key(&self, messages: &[Message], max_tokens: Option<u32>) -> String {
        let messages_str = serde_json::to_string(messages).unwrap_or_default();
        let max_tokens_str = max_tokens.map(|t| t.to_string()).unwrap_or_default();
        generate_cache_key(&["completion", &self.namespace, &messages_str, &max_tokens_str])
    }
}

#[async_trait]
impl LlmClient for CachedLlmClient {
    async fn generate_response(
        &self,
        messages: &[Message],
        max_tokens: Option<u32>,
    ) -> LlmResult<CompletionResponse> {
        let cache_key = self.response_cache_key(messages, max_tokens);

        if let Ok(Some(cached_bytes)) = self.cache.get(&cache_key).await {
            if let Ok(cached) = serde_json::from_slice::<CompletionResponse>(&cached_bytes) {
                debug!("Completion cache hit for {}", cache_key);
                return Ok(cached);
            }
        }

        let response = self.inner.generate_response(messages, max_tokens).await?;

        if let Ok(serialized) = serde_json::to_vec(&response) {
            if let Err(e) = self.cache.set(&cache_key, serialized).await {
                debug!("Failed to cache completion: {}", e);
            }
        }

        Ok(response)
    }
}
