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
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::client::{EmbedderClient, DEFAULT_EMBEDDING_DIM};
use crate::errors::{PipelineError, PipelineResult};

const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

#[derive(Debug, Clone)]
pub struct OpenAiEmbedderConfig {
    pub embedding_model: String,
    /// Vectors are cut to this length
    pub embedding_dim: usize,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
}

impl Default for OpenAiEmbedderConfig {
    fn default() -> Self {
        Self {
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            api_key: None,
            base_url: None,
        }
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    input: &'a [String],
    model: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Embedder backed by an OpenAI-compatible `/embeddings` endpoint
pub struct OpenAiEmbedder {
    config: OpenAiEmbedderConfig,
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAiEmbedder {
    pub fn new(config: OpenAiEmbedderConfig) -> PipelineResult<Self> {
        let api_key = config.api_key.clone().ok_or_else(|| PipelineError::Config {
            message: "An API key for the embedding service is required".to_string(),
        })?;

        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Self {
            config,
            client,
            api_key,
            base_url,
        })
    }

    async fn create_embeddings_request(&self, input: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        let request = EmbeddingRequest {
            input,
            model: &self.config.embedding_model,
        };

        let url = format!("{}/embeddings", self.base_url);
        debug!("Embedding {} inputs with {}", input.len(), self.config.embedding_model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(PipelineError::Config {
                message: format!("Embedding API error {}: {}", status, error_text),
            });
        }

        let embedding_response: EmbeddingResponse = response.json().await?;
        let max_dim = self.config.embedding_dim;

        Ok(embedding_response
            .data
            .into_iter()
            .map(|data| {
                let dim = max_dim.min(data.embedding.len());
                data.embedding[..dim].to_vec()
            })
            .collect())
    }
}

#[async_trait]
impl EmbedderClient for OpenAiEmbedder {
    async fn create(&self, input_data: &str) -> PipelineResult<Vec<f32>> {
        let embeddings = self
            .create_embeddings_request(&[input_data.to_string()])
            .await?;
        embeddings
            .into_iter()
            .next()
            .ok_or_else(|| PipelineError::Config {
                message: "No embeddings returned from the embedding service".to_string(),
            })
    }

    async fn create_batch(&self, input_data_list: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        if input_data_list.is_empty() {
            return Ok(Vec::new());
        }
        self.create_embeddings_request(input_data_list).await
    }

    fn dimension(&self) -> usize {
        self.config.embedding_dim
    }
}
