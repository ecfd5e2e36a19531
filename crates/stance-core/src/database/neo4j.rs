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


//! Neo4j graph store

use std::sync::Arc;

use async_trait::async_trait;
use neo4rs::{BoltList, BoltMap, BoltType, ConfigBuilder, Graph, Query};
use tracing::{debug, info};

use super::config::DatabaseConfig;
use super::traits::{
    document_embedding_statement, graph_document_statements, index_statements, GraphStore,
    QueryParameter, Statement, StoreOptions,
};
use super::types::{DatabaseError, DatabaseResult};
use crate::knowledge_graph::GraphDocument;

/// Graph store backed by a Neo4j server over Bolt
pub struct Neo4jGraphStore {
    graph: Arc<Graph>,
}

impl Neo4jGraphStore {
    pub async fn new(config: DatabaseConfig) -> DatabaseResult<Self> {
        let mut builder = ConfigBuilder::default().uri(&config.uri);

        if let Some(username) = &config.username {
            builder = builder.user(username);
        }

        if let Some(password) = &config.password {
            builder = builder.password(password);
        }

        if let Some(database) = &config.database {
            builder = builder.db(database.as_str());
        }

        if let Some(pool_size) = config.pool_size {
            builder = builder.max_connections(pool_size);
        }

        let graph = Graph::connect(builder.build()?)
            .await
            .map_err(|source| DatabaseError::Connection {
                uri: config.uri.clone(),
                source,
            })?;
        info!("Connected to Neo4j at {}", config.uri);

        Ok(Self {
            graph: Arc::new(graph),
        })
    }

    /// Convert QueryParameter to BoltType for Neo4j
    fn param_to_bolt(param: &QueryParameter) -> BoltType {
        match param {
            QueryParameter::String(s) => BoltType::String(neo4rs::BoltString::new(s)),
            QueryParameter::Integer(i) => BoltType::Integer(neo4rs::BoltInteger::new(*i)),
            QueryParameter::Float(f) => BoltType::Float(neo4rs::BoltFloat::new(*f)),
            QueryParameter::Boolean(b) => BoltType::Boolean(neo4rs::BoltBoolean::new(*b)),
            QueryParameter::Null => BoltType::Null(neo4rs::BoltNull),
            QueryParameter::List(list) => {
                let mut bolt_list = BoltList::new();
                for item in list {
                    bolt_list.push(Self::param_to_bolt(item));
                }
                BoltType::List(bolt_list)
            }
            QueryParameter::Map(map) => {
                let mut bolt_map = BoltMap::new();
                for (key, value) in map {
                    bolt_map.put(neo4rs::BoltString::new(key), Self::param_to_bolt(value));
                }
                BoltType::Map(bolt_map)
            }
        }
    }

    fn to_query(statement: &Statement) -> Query {
        statement
            .params
            .iter()
            .fold(Query::new(statement.cypher.clone()), |query, (key, value)| {
                query.param(key, Self::param_to_bolt(value))
            })
    }

    /// Run one document's statements in a single transaction
    async fn write_document(&self, document: &GraphDocument, statements: &[Statement]) -> DatabaseResult<()> {
        if statements.is_empty() {
            return Ok(());
        }
        let queries: Vec<Query> = statements.iter().map(Self::to_query).collect();
        let write = async {
            let mut txn = self.graph.start_txn().await?;
            txn.run_queries(queries).await?;
            txn.commit().await
        };
        write.await.map_err(|source| DatabaseError::Write {
            document: document.source.id(),
            source,
        })
    }
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    async fn add_graph_documents(
        &self,
        documents: &[GraphDocument],
        options: &StoreOptions,
    ) -> DatabaseResult<()> {
        for document in documents {
            let statements = graph_document_statements(document, options)?;
            self.write_document(document, &statements).await?;
            debug!(
                "Stored {} nodes and {} relationships from document {}",
                document.nodes.len(),
                document.relationships.len(),
                document.source.id()
            );
        }
        Ok(())
    }

    async fn set_document_embedding(
        &self,
        document_id: &str,
        embedding: &[f32],
    ) -> DatabaseResult<()> {
        let statement = document_embedding_statement(document_id, embedding);
        self.graph.run(Self::to_query(&statement)).await?;
        Ok(())
    }

    async fn ensure_indexes(&self, embedding_dim: Option<usize>) -> DatabaseResult<()> {
        // schema statements cannot share a transaction with each other
        for statement in index_statements(embedding_dim) {
            self.graph.run(Self::to_query(&statement)).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> DatabaseResult<bool> {
        let mut rows = self
            .graph
            .execute(Query::new("RETURN 1 AS health".to_string()))
            .await?;
        Ok(rows.next().await?.is_some())
    }
}
