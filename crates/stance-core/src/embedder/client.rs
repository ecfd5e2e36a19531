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


//! Text embedding seam for stored source windows

use async_trait::async_trait;

use crate::errors::{PipelineError, PipelineResult};

/// Vector size of `text-embedding-3-small`
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;

#[async_trait]
pub trait EmbedderClient: Send + Sync {
    async fn create(&self, text: &str) -> PipelineResult<Vec<f32>>;

    /// One vector per text, in input order
    async fn create_batch(&self, texts: &[String]) -> PipelineResult<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(texts.len());
        for text in texts {
            vectors.push(self.create(text).await?);
        }
        Ok(vectors)
    }

    /// Length of every returned vector; sizes the vector index
    fn dimension(&self) -> usize;
}

/// A vector index only accepts vectors of its own dimension
pub fn check_dimension(vector: &[f32], expected: usize) -> PipelineResult<()> {
    if vector.len() == expected {
        Ok(())
    } else {
        Err(PipelineError::InvalidInput(format!(
            "Embedding has {} dimensions, the index expects {}",
            vector.len(),
            expected
        )))
    }
}
