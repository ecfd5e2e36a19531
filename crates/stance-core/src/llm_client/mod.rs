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


//! Client for the hosted text-completion service

pub mod cached;
pub mod client;
pub mod config;
pub mod models;
pub mod openai_client;

pub use cached::CachedLlmClient;
pub use client::{parse_json_content, BaseLlmClient, LlmClient};
pub use config::LlmConfig;
pub use models::{CompletionResponse, Message, TokenUsage};
pub use openai_client::OpenAiClient;

#[cfg(test)]
pub(crate) mod testing {
    use async_trait::async_trait;
    use mockall::mock;

    use super::{CompletionResponse, LlmClient, Message};
    use crate::errors::LlmResult;

    mock! {
        pub Completion {}

        #[async_trait]
        impl LlmClient for Completion {
            async fn generate_response(
                &self,
                messages: &[Message],
                max_tokens: Option<u32>,
            ) -> LlmResult<CompletionResponse>;
        }
    }
}
