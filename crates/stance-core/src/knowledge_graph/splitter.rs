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


//! Fixed-size overlapping token windows

use serde::{Deserialize, Serialize};

use crate::errors::{PipelineError, PipelineResult};
use crate::knowledge_graph::Document;
use crate::text::token_spans;

pub const DEFAULT_CHUNK_SIZE: usize = 256;
pub const DEFAULT_CHUNK_OVERLAP: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Splits text into windows of `chunk_size` tokens, consecutive windows
/// sharing `chunk_overlap` tokens. Window text is the original slice, so
/// whitespace inside a window is preserved.
#[derive(Debug, Clone)]
pub struct TokenTextSplitter {
    config: SplitterConfig,
}

impl TokenTextSplitter {
    pub fn new(config: SplitterConfig) -> PipelineResult<Self> {
        if config.chunk_size == 0 || config.chunk_overlap >= config.chunk_size {
            return Err(PipelineError::Config {
                message: format!(
                    "chunk overlap ({}) must be smaller than a non-zero chunk size ({})",
                    config.chunk_overlap, config.chunk_size
                ),
            });
        }
        Ok(Self { config })
    }

    pub fn split_text<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let spans = token_spans(text);
        let step = self.config.chunk_size - self.config.chunk_overlap;
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < spans.len() {
            let end = (start + self.config.chunk_size).min(spans.len());
            chunks.push(&text[spans[start].start..spans[end - 1].end]);
            if end == spans.len() {
                break;
            }
            start += step;
        }
        chunks
    }

    /// Split each document, copying its metadata onto every window
    pub fn split_documents(&self, documents: &[Document]) -> Vec<Document> {
        documents
            .iter()
            .flat_map(|doc| {
                self.split_text(&doc.page_content)
                    .into_iter()
                    .map(|chunk| Document {
                        page_content: chunk.to_string(),
                        metadata: doc.metadata.clone(),
                    })
            })
            .collect()
    }
}
