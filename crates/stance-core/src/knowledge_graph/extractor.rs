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


//! Graph extraction from text windows

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{PipelineError, PipelineResult};
use crate::knowledge_graph::{Document, GraphDocument, GraphNode, GraphRelationship};
use crate::llm_client::{parse_json_content, LlmClient};
use crate::prompts::extract_graph::ExtractedGraph;
use crate::prompts::{context_from, get_prompt_library, PromptTemplate};

const DEFAULT_NODE_TYPE: &str = "Node";

/// Turns a document into typed nodes and relationships
#[async_trait]
pub trait GraphExtractor: Send + Sync {
    async fn extract(&self, document: &Document) -> PipelineResult<GraphDocument>;
}

/// Extractor that asks the completion service for a JSON graph
pub struct LlmGraphExtractor {
    client: Arc<dyn LlmClient>,
    prompt: PromptTemplate,
}

impl LlmGraphExtractor {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            prompt: get_prompt_library().extract_graph,
        }
    }
}

/// `"PERSON"` and `"person"` both become `"Person"`
fn normalize_node_type(node_type: &str) -> String {
    let mut chars = node_type.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => DEFAULT_NODE_TYPE.to_string(),
    }
}

/// Clean a raw extraction into a graph document for `source`. Nodes without
/// an id and relationships missing an endpoint or type are dropped; duplicate
/// nodes collapse.
pub fn to_graph_document(extracted: ExtractedGraph, source: Document) -> GraphDocument {
    let mut seen = HashSet::new();
    let nodes = extracted
        .nodes
        .into_iter()
        .filter(|n| !n.id.trim().is_empty())
        .map(|n| GraphNode::new(n.id.trim(), normalize_node_type(&n.node_type)))
        .filter(|n| seen.insert(n.clone()))
        .collect();

    let relationships = extracted
        .relationships
        .into_iter()
        .filter(|r| {
            !r.source.trim().is_empty()
                && !r.target.trim().is_empty()
                && !r.relation_type.trim().is_empty()
        })
        .map(|r| GraphRelationship {
            source: GraphNode::new(r.source.trim(), normalize_node_type(&r.source_type)),
            target: GraphNode::new(r.target.trim(), normalize_node_type(&r.target_type)),
            relation_type: r.relation_type.trim().to_string(),
        })
        .collect();

    GraphDocument {
        nodes,
        relationships,
        source,
    }
}

#[async_trait]
impl GraphExtractor for LlmGraphExtractor {
    async fn extract(&self, document: &Document) -> PipelineResult<GraphDocument> {
        let messages = self
            .prompt
            .render(&context_from([("input", document.page_content.as_str())]))?;
        let reply = self.client.generate_text(&messages).await?;
        let extracted: ExtractedGraph =
            parse_json_content(&reply).map_err(|e| PipelineError::Extraction {
                message: format!("Unparseable graph reply: {}", e),
            })?;
        debug!(
            "Extracted {} nodes and {} relationships",
            extracted.nodes.len(),
            extracted.relationships.len()
        );
        Ok(to_graph_document(extracted, document.clone()))
    }
}
