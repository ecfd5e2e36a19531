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


//! Knowledge graph construction from encyclopedia text

pub mod document;
pub mod extractor;
pub mod ingestor;
pub mod source;
pub mod splitter;

pub use document::{Document, GraphDocument, GraphNode, GraphRelationship};
pub use extractor::{to_graph_document, GraphExtractor, LlmGraphExtractor};
pub use ingestor::{IngestConfig, IngestReport, KnowledgeGraphIngestor};
pub use source::{ContentSource, WikipediaConfig, WikipediaSource};
pub use splitter::{SplitterConfig, TokenTextSplitter};
