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


//! Ranked entities to knowledge graph
//!
//! For each of the top entities: load encyclopedia pages, cut them into
//! token windows, extract a graph per window and write the result to the
//! store. An entity with no pages, or one whose processing fails, is logged
//! and the run moves on.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::database::{GraphStore, StoreOptions};
use crate::dataset::Table;
use crate::embedder::{check_dimension, EmbedderClient};
use crate::errors::PipelineResult;
use crate::knowledge_graph::{
    ContentSource, GraphDocument, GraphExtractor, SplitterConfig, TokenTextSplitter,
};

pub const DEFAULT_ENTITY_COLUMN: &str = "Word";
pub const DEFAULT_TOP_ENTITIES: usize = 20;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub entity_column: String,
    pub top_entities: usize,
    pub splitter: SplitterConfig,
    pub store: StoreOptions,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            entity_column: DEFAULT_ENTITY_COLUMN.to_string(),
            top_entities: DEFAULT_TOP_ENTITIES,
            splitter: SplitterConfig::default(),
            store: StoreOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestReport {
    pub entities_processed: usize,
    pub entities_without_content: Vec<String>,
    pub entities_failed: Vec<String>,
    pub chunks: usize,
    pub failed_chunks: usize,
    pub nodes: usize,
    pub relationships: usize,
}

#[derive(Debug, Default)]
struct EntityOutcome {
    chunks: usize,
    failed_chunks: usize,
    nodes: usize,
    relationships: usize,
}

pub struct KnowledgeGraphIngestor {
    source: Arc<dyn ContentSource>,
    extractor: Arc<dyn GraphExtractor>,
    store: Arc<dyn GraphStore>,
    embedder: Option<Arc<dyn EmbedderClient>>,
    splitter: TokenTextSplitter,
    config: IngestConfig,
}

impl KnowledgeGraphIngestor {
    pub fn new(
        source: Arc<dyn ContentSource>,
        extractor: Arc<dyn GraphExtractor>,
        store: Arc<dyn GraphStore>,
        config: IngestConfig,
    ) -> PipelineResult<Self> {
        Ok(Self {
            source,
            extractor,
            store,
            embedder: None,
            splitter: TokenTextSplitter::new(config.splitter)?,
            config,
        })
    }

    /// Embed each stored source window and index the vectors
    pub fn with_embedder(mut self, embedder: Arc<dyn EmbedderClient>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Ingest the first `top_entities` rows of the entity column
    pub async fn ingest_table(&self, table: &Table) -> PipelineResult<IngestReport> {
        let entities: Vec<String> = table
            .column_values(&self.config.entity_column)?
            .into_iter()
            .map(|e| e.trim().to_string())
            .collect();
        self.ingest_entities(&entities).await
    }

    /// Ingest the first `top_entities` names in rank order. Blank names keep
    /// their rank but are never queried.

    pub async fn ingest_entities(&self, entities: &[String]) -> PipelineResult<IngestReport> {
        let embedding_dim = self.embedder.as_ref().map(|e| e.dimension());
        self.store.ensure_indexes(embedding_dim).await?;

        let mut report = IngestReport::default();
        for entity in entities.iter().take(self.config.top_entities) {
            if entity.trim().is_empty() {
                warn!("Blank entity name in the top {}; skipping", self.config.top_entities);
                report.entities_without_content.push(entity.clone());
                continue;
            }
            info!("Processing entity: {}", entity);
            match self.ingest_entity(entity).await {
                Ok(None) => {
                    info!("No content found for '{}'; skipping", entity);
                    report.entities_without_content.push(entity.clone());
                }
                Ok(Some(outcome)) => {
                    report.entities_processed += 1;
                    report.chunks += outcome.chunks;
                    report.failed_chunks += outcome.failed_chunks;
                    report.nodes += outcome.nodes;
                    report.relationships += outcome.relationships;
                }
                Err(e) => {
                    warn!("Failed to ingest entity '{}': {}", entity, e);
                    report.entities_failed.push(entity.clone());
                }
            }
        }

        info!(
            "Ingestion complete: {} entities, {} chunks, {} nodes, {} relationships",
            report.entities_processed, report.chunks, report.nodes, report.relationships
        );
        Ok(report)
    }

    async fn ingest_entity(&self, entity: &str) -> PipelineResult<Option<EntityOutcome>> {
        let raw_documents = self.source.load(entity).await?;
        if raw_documents.is_empty() {
            return Ok(None);
        }

        let chunks = self.splitter.split_documents(&raw_documents);
        let mut outcome = EntityOutcome {
            chunks: chunks.len(),
            ..Default::default()
        };

        let mut graph_documents = Vec::with_capacity(chunks.len());
        for (index, chunk) in chunks.iter().enumerate() {
            match self.extractor.extract(chunk).await {
                Ok(graph_document) => graph_documents.push(graph_document),
                Err(e) => {
                    warn!("Extraction failed for '{}' chunk {}: {}", entity, index, e);
                    outcome.failed_chunks += 1;
                }
            }
        }

        outcome.nodes = graph_documents.iter().map(|d| d.nodes.len()).sum();
        outcome.relationships = graph_documents.iter().map(|d| d.relationships.len()).sum();
        self.store
            .add_graph_documents(&graph_documents, &self.config.store)
            .await?;

        if let (Some(embedder), true) = (&self.embedder, self.config.store.include_source) {
            self.embed_sources(embedder.as_ref(), entity, &graph_documents)
                .await?;
        }

        Ok(Some(outcome))
    }

    /// Attach vectors to the stored source windows. Embedding failures only
    /// cost the vectors; store failures propagate.
    async fn embed_sources(
        &self,
        embedder: &dyn EmbedderClient,
        entity: &str,
        graph_documents: &[GraphDocument],
    ) -> PipelineResult<()> {
        let texts: Vec<String> = graph_documents
            .iter()
            .map(|d| d.source.page_content.clone())
            .collect();
        let vectors = match embedder.create_batch(&texts).await {
            Ok(vectors) => vectors,
            Err(e) => {
                warn!("Embedding failed for '{}': {}", entity, e);
                return Ok(());
            }
        };

        for (document, vector) in graph_documents.iter().map(|d| &d.source).zip(vectors) {
            if let Err(e) = check_dimension(&vector, embedder.dimension()) {
                warn!("Skipping a '{}' window: {}", entity, e);
                continue;
            }
            self.store
                .set_document_embedding(&document.id(), &vector)
                .await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use mockall::mock;

    use crate::database::{DatabaseError, DatabaseResult};
    use crate::errors::PipelineError;
    use crate::knowledge_graph::{Document, GraphDocument, GraphNode};

    /// Returns one page per entity except those listed as empty
    struct FakeSource {
        queries: Mutex<Vec<String>>,
        empty: Vec<&'static str>,
    }

    impl FakeSource {
        fn new(empty: Vec<&'static str>) -> Self {
            Self {
                queries: Mutex::new(Vec::new()),
                empty,
            }
        }
    }

    #[async_trait]
    impl ContentSource for FakeSource {
        async fn load(&self, query: &str) -> PipelineResult<Vec<Document>> {
            self.queries.lock().unwrap().push(query.to_string());
            if self.empty.iter().any(|e| *e == query) {
                return Ok(Vec::new());
            }
            Ok(vec![Document::new(format!("{} is a political entity.", query))
                .with_metadata("title", query)])
        }
    }

    /// One node per chunk, named after the chunk's title
    struct FakeExtractor;

    #[async_trait]
    impl GraphExtractor for FakeExtractor {
        async fn extract(&self, document: &Document) -> PipelineResult<GraphDocument> {
            let title = document.metadata.get("title").cloned().unwrap_or_default();
            if title == "Broken" {
                return Err(PipelineError::Extraction {
                    message: "bad reply".to_string(),
                });
            }
            Ok(GraphDocument {
                nodes: vec![GraphNode::new(title, "Organization")],
                relationships: Vec::new(),
                source: document.clone(),
            })
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        documents: Mutex<Vec<GraphDocument>>,
        embeddings: Mutex<Vec<String>>,
        index_dims: Mutex<Vec<Option<usize>>>,
        fail_for: Option<&'static str>,
    }

    #[async_trait]
    impl GraphStore for RecordingStore {
        async fn add_graph_documents(
            &self,
            documents: &[GraphDocument],
            options: &StoreOptions,
        ) -> DatabaseResult<()> {
            assert!(options.base_entity_label && options.include_source);
            if let Some(bad) = self.fail_for {
                if documents.iter().any(|d| d.nodes.iter().any(|n| n.id == bad)) {
                    return Err(DatabaseError::InvalidIdentifier("Bad Label".to_string()));
                }
            }
            self.documents.lock().unwrap().extend_from_slice(documents);
            Ok(())
        }

        async fn set_document_embedding(
            &self,
            document_id: &str,
            _embedding: &[f32],
        ) -> DatabaseResult<()> {
            self.embeddings.lock().unwrap().push(document_id.to_string());
            Ok(())
        }

        async fn ensure_indexes(&self, embedding_dim: Option<usize>) -> DatabaseResult<()> {
            self.index_dims.lock().unwrap().push(embedding_dim);
            Ok(())
        }

        async fn health_check(&self) -> DatabaseResult<bool> {
            Ok(true)
        }
    }

    mock! {
        Embedder {}

        #[async_trait]
        impl EmbedderClient for Embedder {
            async fn create(&self, input_data: &str) -> PipelineResult<Vec<f32>>;
            fn dimension(&self) -> usize;
        }
    }

    fn entity_table(n: usize) -> Table {
        let mut csv = String::from("Word,Frequency,NER\n");
        for i in 0..n {
            csv.push_str(&format!("Entity{},{},ORG\n", i, 100 - i));
        }
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    #[tokio::test]
    async fn test_only_top_twenty_are_processed() {
        let source = Arc::new(FakeSource::new(vec!["Entity3"]));
        let store = Arc::new(RecordingStore::default());
        let ingestor = KnowledgeGraphIngestor::new(
            source.clone(),
            Arc::new(FakeExtractor),
            store.clone(),
            IngestConfig::default(),
        )
        .unwrap();

        let report = ingestor.ingest_table(&entity_table(25)).await.unwrap();

        let queries = source.queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 20);
        assert_eq!(queries.last().map(String::as_str), Some("Entity19"));
        assert_eq!(report.entities_processed, 19);
        assert_eq!(report.entities_without_content, vec!["Entity3".to_string()]);
        assert_eq!(report.nodes, 19);

        let stored = store.documents.lock().unwrap();
        assert_eq!(stored.len(), 19);
        assert!(stored.iter().all(|d| d.nodes[0].id != "Entity3"));
        assert_eq!(*store.index_dims.lock().unwrap(), vec![None]);
    }

    #[tokio::test]
    async fn test_blank_rows_keep_their_rank() {
        let mut csv = String::from("Word\n");
        for i in 0..25 {
            if i == 2 {
                csv.push_str("\"  \"\n");
            } else {
                csv.push_str(&format!("Entity{}\n", i));
            }
        }
        let table = Table::from_reader(csv.as_bytes()).unwrap();

        let source = Arc::new(FakeSource::new(Vec::new()));
        let ingestor = KnowledgeGraphIngestor::new(
            source.clone(),
            Arc::new(FakeExtractor),
            Arc::new(RecordingStore::default()),
            IngestConfig::default(),
        )
        .unwrap();

        let report = ingestor.ingest_table(&table).await.unwrap();

        let queries = source.queries.lock().unwrap().clone();
        assert_eq!(queries.len(), 19);
        assert_eq!(queries.last().map(String::as_str), Some("Entity19"));
        assert!(!queries.iter().any(|q| q == "Entity20"));
        assert_eq!(report.entities_processed, 19);
        assert_eq!(report.entities_without_content, vec![String::new()]);
    }

    #[tokio::test]
    async fn test_store_failure_does_not_halt_the_run() {
        let store = Arc::new(RecordingStore {
            fail_for: Some("Entity1"),
            ..Default::default()
        });
        let ingestor = KnowledgeGraphIngestor::new(
            Arc::new(FakeSource::new(Vec::new())),
            Arc::new(FakeExtractor),
            store.clone(),
            IngestConfig::default(),
        )
        .unwrap();

        let report = ingestor.ingest_table(&entity_table(3)).await.unwrap();
        assert_eq!(report.entities_failed, vec!["Entity1".to_string()]);
        assert_eq!(report.entities_processed, 2);
    }

    #[tokio::test]
    async fn test_failed_chunks_are_counted() {
        let ingestor = KnowledgeGraphIngestor::new(
            Arc::new(FakeSource::new(Vec::new())),
            Arc::new(FakeExtractor),
            Arc::new(RecordingStore::default()),
            IngestConfig::default(),
        )
        .unwrap();

        let report = ingestor
            .ingest_entities(&["Broken".to_string(), "BNP".to_string()])
            .await
            .unwrap();
        assert_eq!(report.failed_chunks, 1);
        assert_eq!(report.entities_processed, 2);
        assert_eq!(report.nodes, 1);
    }

    #[tokio::test]
    async fn test_embeddings_are_attached_to_source_windows() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_dimension().return_const(2usize);
        embedder
            .expect_create()
            .times(2)
            .returning(|_| Ok(vec![0.1, 0.2]));

        let store = Arc::new(RecordingStore::default());
        let ingestor = KnowledgeGraphIngestor::new(
            Arc::new(FakeSource::new(Vec::new())),
            Arc::new(FakeExtractor),
            store.clone(),
            IngestConfig::default(),
        )
        .unwrap()
        .with_embedder(Arc::new(embedder));

        ingestor.ingest_table(&entity_table(2)).await.unwrap();

        let stored_ids: Vec<String> = store
            .documents
            .lock()
            .unwrap()
            .iter()
            .map(|d| d.source.id())
            .collect();
        assert_eq!(*store.embeddings.lock().unwrap(), stored_ids);
        assert_eq!(*store.index_dims.lock().unwrap(), vec![Some(2)]);
    }

    #[tokio::test]
    async fn test_vectors_of_the_wrong_size_are_skipped() {
        let mut embedder = MockEmbedder::new();
        embedder.expect_dimension().return_const(384usize);
        embedder.expect_create().returning(|_| Ok(vec![0.1, 0.2]));

        let store = Arc::new(RecordingStore::default());
        let ingestor = KnowledgeGraphIngestor::new(
            Arc::new(FakeSource::new(Vec::new())),
            Arc::new(FakeExtractor),
            store.clone(),
            IngestConfig::default(),
        )
        .unwrap()
        .with_embedder(Arc::new(embedder));

        let report = ingestor.ingest_table(&entity_table(2)).await.unwrap();
        assert_eq!(report.entities_processed, 2);
        assert!(store.embeddings.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_entity_column() {
        let ingestor = KnowledgeGraphIngestor::new(
            Arc::new(FakeSource::new(Vec::new())),
            Arc::new(FakeExtractor),
            Arc::new(RecordingStore::default()),
            IngestConfig::default(),
        )
        .unwrap();
        let table = Table::from_reader("Name\nx\n".as_bytes()).unwrap();
        assert!(matches!(
            ingestor.ingest_table(&table).await,
            Err(PipelineError::ColumnNotFound { .. })
        ));
    }
}
