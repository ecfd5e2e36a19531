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

use validator::Validate;

pub const DEFAULT_MAX_TOKENS: u32 = 1024;
pub const DEFAULT_TEMPERATURE: f32 = 0.0;
pub const DEFAULT_MODEL: &str = "openai/gpt-4o";
pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_MAX_RETRIES: usize = 3;

#[derive(Debug, Clone, Validate)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    #[validate(length(min = 1, message = "model name must not be empty"))]
    pub model: String,
    #[validate(url)]
    pub base_url: Option<String>,
    #[validate(range(min = 0.0, max = 2.0))]
    pub temperature: f32,
    #[validate(range(min = 1))]
    pub max_tokens: u32,
    pub timeout: Duration,
    pub max_retries: usize,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: None,
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl LlmConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_key(mut self, api_key: String) -> Self {
        self.api_key = Some(api_key);
        self
    }

    pub fn with_model(mut self, model: String) -> Self {
        self.model = model;
        self
    }

    pub fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Base URL with any trailing slash removed
    pub fn resolved_base_url(&self) -> String {
        self.base_url
            .as_deref()
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_deterministic_and_valid() {
        let config = LlmConfig::default();
        assert_eq!(config.temperature, 0.0);
        assert!(config.validate().is_ok());
        assert_eq!(config.resolved_base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_rejects_out_of_range_temperature() {
        let config = LlmConfig::default().with_temperature(3.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_empty_model_and_bad_url() {
        let config = LlmConfig::default().with_model(String::new());
        assert!(config.validate().is_err());

        let config = LlmConfig::default().with_base_url("not a url".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let config = LlmConfig::default().with_base_url("https://api.openai.com/v1/".to_string());
        assert_eq!(config.resolved_base_url(), "https://api.openai.com/v1");
    }
}
