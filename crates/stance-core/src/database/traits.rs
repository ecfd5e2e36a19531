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


//! Graph store abstraction and Cypher statement building

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::types::{DatabaseError, DatabaseResult};
use crate::knowledge_graph::{GraphDocument, GraphNode};

pub const BASE_ENTITY_LABEL: &str = "__Entity__";
pub const DOCUMENT_LABEL: &str = "Document";
pub const MENTIONS_RELATIONSHIP: &str = "MENTIONS";
pub const VECTOR_INDEX_NAME: &str = "document_embedding";
pub const FULLTEXT_INDEX_NAME: &str = "document_text";

/// Represents a query parameter value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryParameter {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Null,
    List(Vec<QueryParameter>),
    Map(HashMap<String, QueryParameter>),
}

impl From<&str> for QueryParameter {
    fn from(value: &str) -> Self {
        QueryParameter::String(value.to_string())
    }
}

impl From<String> for QueryParameter {
    fn from(value: String) -> Self {
        QueryParameter::String(value)
    }
}

/// A Cypher statement with its parameters
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub cypher: String,
    pub params: HashMap<String, QueryParameter>,
}

impl Statement {
    pub fn new(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            params: HashMap::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<QueryParameter>) -> Self {
        self.params.insert(key.to_string(), value.into());
        self
    }
}

/// How extracted graph documents are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreOptions {
    /// Also label every entity with `__Entity__`
    pub base_entity_label: bool,
    /// Store the source text as a `Document` node that `MENTIONS` each entity
    pub include_source: bool,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            base_entity_label: true,
            include_source: true,
        }
    }
}

/// Persistent graph store for extracted documents
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// Merge the documents' nodes and relationships into the graph
    async fn add_graph_documents(
        &self,
        documents: &[GraphDocument],
        options: &StoreOptions,
    ) -> DatabaseResult<()>;

    /// Attach an embedding vector to a stored source document
    async fn set_document_embedding(&self, document_id: &str, embedding: &[f32])
        -> DatabaseResult<()>;

    /// Create the lookup indexes; the vector index only when a dimension is given
    async fn ensure_indexes(&self, embedding_dim: Option<usize>) -> DatabaseResult<()>;

    async fn health_check(&self) -> DatabaseResult<bool>;
}

/// Backtick-quote a label or relationship type for inlining into Cypher
pub fn quote_identifier(name: &str) -> DatabaseResult<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(DatabaseError::InvalidIdentifier(name.to_string()));
    }
    Ok(format!("`{}`", name.replace('`', "``")))
}

/// Relationship types are stored upper snake case (`LEADER_OF`)
pub fn normalize_relation_type(relation_type: &str) -> String {
    relation_type
        .trim()
        .split(|c: char| c.is_whitespace() || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
        .to_uppercase()
}

fn merge_entity(var: &str, id_param: &str, node: &GraphNode, options: &StoreOptions) -> DatabaseResult<String> {
    let type_label = quote_identifier(&node.node_type)?;
    Ok(if options.base_entity_label {
        format!(
            "MERGE ({var}:`{BASE_ENTITY_LABEL}` {{id: ${id_param}}}) SET {var}:{type_label}"
        )
    } else {
        format!("MERGE ({var}:{type_label} {{id: ${id_param}}})")
    })
}

/// Statements that write one graph document, in execution order
pub fn graph_document_statements(
    document: &GraphDocument,
    options: &StoreOptions,
) -> DatabaseResult<Vec<Statement>> {
    let mut statements = Vec::new();
    let document_id = document.source.id();

    if options.include_source {
        let metadata = document
            .source
            .metadata
            .iter()
            .map(|(k, v)| (k.clone(), QueryParameter::String(v.clone())))
            .collect();
        statements.push(
            Statement::new(format!(
                "MERGE (d:{DOCUMENT_LABEL} {{id: $document_id}}) SET d.text = $text SET d += $metadata"
            ))
            .param("document_id", document_id.as_str())
            .param("text", document.source.page_content.as_str())
            .param("metadata", QueryParameter::Map(metadata)),
        );
    }

    for node in &document.nodes {
        let mut cypher = merge_entity("n", "id", node, options)?;
        if options.include_source {
            cypher.push_str(&format!(
                " WITH n MATCH (d:{DOCUMENT_LABEL} {{id: $document_id}}) MERGE (d)-[:{MENTIONS_RELATIONSHIP}]->(n)"
            ));
        }
        let mut statement = Statement::new(cypher).param("id", node.id.as_str());
        if options.include_source {
            statement = statement.param("document_id", document_id.as_str());
        }
        statements.push(statement);
    }

    for relationship in &document.relationships {
        let rel_type = quote_identifier(&normalize_relation_type(&relationship.relation_type))?;
        let cypher = format!(
            "{} {} MERGE (s)-[:{}]->(t)",
            merge_entity("s", "source_id", &relationship.source, options)?,
            merge_entity("t", "target_id", &relationship.target, options)?,
            rel_type
        );
        statements.push(
            Statement::new(cypher)
                .param("source_id", relationship.source.id.as_str())
                .param("target_id", relationship.target.id.as_str()),
        );
    }

    Ok(statements)
}

pub fn document_embedding_statement(document_id: &str, embedding: &[f32]) -> Statement {
    let vector = embedding
        .iter()
        .map(|v| QueryParameter::Float(f64::from(*v)))
        .collect();
    Statement::new(format!(
        "MATCH (d:{DOCUMENT_LABEL} {{id: $document_id}}) SET d.embedding = $embedding"
    ))
    .param("document_id", document_id)
    .param("embedding", QueryParameter::List(vector))
}

pub fn index_statements(embedding_dim: Option<usize>) -> Vec<Statement> {
    let mut statements = vec![
        Statement::new(format!(
            "CREATE INDEX entity_id IF NOT EXISTS FOR (n:`{BASE_ENTITY_LABEL}`) ON (n.id)"
        )),
        Statement::new(format!(
            "CREATE FULLTEXT INDEX {FULLTEXT_INDEX_NAME} IF NOT EXISTS FOR (d:{DOCUMENT_LABEL}) ON EACH [d.text]"
        )),
    ];
    if let Some(dim) = embedding_dim {
        statements.push(Statement::new(format!(
            "CREATE VECTOR INDEX {VECTOR_INDEX_NAME} IF NOT EXISTS FOR (d:{DOCUMENT_LABEL}) ON (d.embedding) \
             OPTIONS {{indexConfig: {{`vector.dimensions`: {dim}, `vector.similarity_function`: 'cosine'}}}}"
        )));
    }
    statements
}
