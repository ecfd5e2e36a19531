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


//! # Stance Core
//!
//! Pipeline stages for political stance detection on tweets.
//!
//! Each stage reads a CSV table and writes a table or an image: dataset
//! filtering, LLM translation, lexical summary with a word cloud, prompt-based
//! stance classification, and knowledge-graph ingestion from Wikipedia into
//! Neo4j.

pub mod cache;
pub mod database;
pub mod dataset;
pub mod embedder;
pub mod errors;
pub mod knowledge_graph;
pub mod lexicon;
pub mod llm_client;
pub mod prompts;
pub mod stance;
pub mod text;
pub mod translator;

// Re-export commonly used types
pub use errors::{LlmError, PipelineError, PipelineResult};

// Re-export traits
pub use cache::Cache;
pub use database::GraphStore;
pub use embedder::EmbedderClient;
pub use knowledge_graph::{ContentSource, GraphExtractor};
pub use lexicon::EntityRecognizer;
pub use llm_client::LlmClient;

// Re-export concrete types
pub use database::{DatabaseConfig, Neo4jGraphStore};
pub use dataset::{filter_dataset, FilterConfig, FilterReport, Table};
pub use embedder::OpenAiEmbedder;
pub use knowledge_graph::{KnowledgeGraphIngestor, LlmGraphExtractor, WikipediaSource};
pub use lexicon::{LexicalSummarizer, WordCloud};
pub use llm_client::{CachedLlmClient, LlmConfig, Message, OpenAiClient};
pub use stance::{StanceClassifier, StanceLabel, StanceStrategy};
pub use translator::{Translator, TranslatorConfig};
