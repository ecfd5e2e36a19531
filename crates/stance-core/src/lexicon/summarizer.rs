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


//! Term-frequency table with entity tags, plus the matching word cloud

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use validator::Validate;

use crate::dataset::Table;
use crate::errors::PipelineResult;
use crate::lexicon::ner::{bound_corpus, EntityRecognizer, DEFAULT_MAX_CHARS};
use crate::lexicon::{build_corpus, term_frequencies, WordCloud, WordCloudConfig};

pub const DEFAULT_COLUMN: &str = "translation";
pub const DEFAULT_TOP_N: usize = 100;
pub const NO_ENTITY_TAG: &str = "O";
pub const OUTPUT_HEADERS: [&str; 3] = ["Word", "Frequency", "NER"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SummarizerConfig {
    #[validate(length(min = 1))]
    pub column: String,
    #[validate(range(min = 1))]
    pub top_n: usize,
    /// Entity recognition reads at most this many characters of the corpus
    #[validate(range(min = 1))]
    pub max_ner_chars: usize,
    #[validate(nested)]
    pub word_cloud: WordCloudConfig,
}

impl Default for SummarizerConfig {
    fn default() -> Self {
        Self {
            column: DEFAULT_COLUMN.to_string(),
            top_n: DEFAULT_TOP_N,
            max_ner_chars: DEFAULT_MAX_CHARS,
            word_cloud: WordCloudConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermFrequencyEntry {
    pub word: String,
    pub frequency: usize,
    pub entity_tag: String,
}

#[derive(Debug, Clone)]
pub struct Summary {
    pub entries: Vec<TermFrequencyEntry>,
    pub word_cloud: WordCloud,
}

/// `Word,Frequency,NER` table, one row per entry in rank order
pub fn entries_to_table(entries: &[TermFrequencyEntry]) -> PipelineResult<Table> {
    let headers = OUTPUT_HEADERS.iter().map(|h| h.to_string()).collect();
    let rows = entries
        .iter()
        .map(|e| vec![e.word.clone(), e.frequency.to_string(), e.entity_tag.clone()])
        .collect();
    Table::from_rows(headers, rows)
}

pub struct LexicalSummarizer {
    recognizer: Arc<dyn EntityRecognizer>,
    config: SummarizerConfig,
}

impl LexicalSummarizer {
    pub fn new(recognizer: Arc<dyn EntityRecognizer>, config: SummarizerConfig) -> Self {
        Self { recognizer, config }
    }

    /// Summarize a raw corpus
    pub async fn summarize_corpus(&self, corpus: &str) -> PipelineResult<Summary> {
        let top_terms = term_frequencies(corpus, self.config.top_n);
        let tags = self
            .recognizer
            .entity_tags(bound_corpus(corpus, self.config.max_ner_chars))
            .await?;

        let entries = top_terms
            .into_iter()
            .map(|(word, frequency)| {
                let entity_tag = tags
                    .get(&word)
                    .cloned()
                    .unwrap_or_else(|| NO_ENTITY_TAG.to_string());
                TermFrequencyEntry {
                    word,
                    frequency,
                    entity_tag,
                }
            })
            .collect::<Vec<_>>();

        let cloud_terms = term_frequencies(corpus, self.config.word_cloud.max_words);
        let word_cloud = WordCloud::generate(&cloud_terms, self.config.word_cloud.clone());

        info!(
            "Summarized corpus: {} terms, {} tagged, {} words in cloud",
            entries.len(),
            entries.iter().filter(|e| e.entity_tag != NO_ENTITY_TAG).count(),
            word_cloud.words.len()
        );
        Ok(Summary {
            entries,
            word_cloud,
        })
    }

    /// Summarize the configured column of a table
    pub async fn summarize_table(&self, table: &Table) -> PipelineResult<Summary> {
        let values = table.column_values(&self.config.column)?;
        let corpus = build_corpus(values);
        self.summarize_corpus(&corpus).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexicon::{CapitalizedSpanRecognizer, EntitySpan};
    use crate::errors::PipelineError;
    use async_trait::async_trait;

    struct FixedRecognizer(Vec<EntitySpan>);

    #[async_trait]
    impl EntityRecognizer for FixedRecognizer {
        async fn recognize(&self, _text: &str) -> PipelineResult<Vec<EntitySpan>> {
            Ok(self.0.clone())
        }
    }

    #[tokio::test]
    async fn test_tags_join_on_exact_surface_form() {
        let recognizer = FixedRecognizer(vec![
            EntitySpan::new("cat", "ANIMAL"),
            EntitySpan::new("Mat", "PRODUCT"),
        ]);
        let summarizer = LexicalSummarizer::new(Arc::new(recognizer), SummarizerConfig::default());
        let summary = summarizer
            .summarize_corpus("the cat sat on the mat the cat ran")
            .await
            .unwrap();

        let rows: Vec<_> = summary
            .entries
            .iter()
            .map(|e| (e.word.as_str(), e.frequency, e.entity_tag.as_str()))
            .collect();
        assert_eq!(
            rows,
            vec![
                ("cat", 2, "ANIMAL"),
                ("sat", 1, "O"),
                ("mat", 1, "O"),
                ("ran", 1, "O"),
            ]
        );
    }

    #[tokio::test]
    async fn test_table_column_and_csv_shape() {
        let table = Table::from_reader(
            "translation\nDhaka traffic\nDhaka rally\n".as_bytes(),
        )
        .unwrap();
        let summarizer = LexicalSummarizer::new(
            Arc::new(CapitalizedSpanRecognizer::default()),
            SummarizerConfig::default(),
        );
        let summary = summarizer.summarize_table(&table).await.unwrap();
        let output = entries_to_table(&summary.entries).unwrap();

        assert_eq!(output.headers(), &["Word", "Frequency", "NER"]);
        assert_eq!(output.rows()[0], vec!["Dhaka", "2", "GPE"]);
        assert!(!summary.word_cloud.words.is_empty());
    }

    #[tokio::test]
    async fn test_missing_column_is_an_error() {
        let table = Table::from_reader("text\nhello\n".as_bytes()).unwrap();
        let summarizer = LexicalSummarizer::new(
            Arc::new(FixedRecognizer(Vec::new())),
            SummarizerConfig::default(),
        );
        let result = summarizer.summarize_table(&table).await;
        assert!(matches!(result, Err(PipelineError::ColumnNotFound { .. })));
    }

    #[tokio::test]
    async fn test_top_n_bounds_the_table() {
        let config = SummarizerConfig {
            top_n: 2,
            ..Default::default()
        };
        let summarizer = LexicalSummarizer::new(Arc::new(FixedRecognizer(Vec::new())), config);
        let summary = summarizer.summarize_corpus("a1 b2 c3 d4").await.unwrap();
        assert_eq!(summary.entries.len(), 2);
    }
}
