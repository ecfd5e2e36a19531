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


//! Row-by-row tweet translation into English

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use validator::Validate;

use crate::dataset::Table;
use crate::errors::PipelineResult;
use crate::llm_client::LlmClient;
use crate::prompts::{context_from, get_prompt_library, PromptTemplate};

pub const DEFAULT_TEXT_COLUMN: &str = "Content";
pub const DEFAULT_OUTPUT_COLUMN: &str = "translation";
pub const DEFAULT_DELAY: Duration = Duration::from_secs(1);
pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 10;
const PROGRESS_INTERVAL: usize = 10;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct TranslatorConfig {
    #[validate(length(min = 1))]
    pub text_column: String,
    #[validate(length(min = 1))]
    pub output_column: String,
    /// Pause between consecutive service calls
    pub delay: Duration,
    /// Write the table to `checkpoint_path` after this many rows
    #[validate(range(min = 1))]
    pub checkpoint_interval: usize,
    pub checkpoint_path: Option<PathBuf>,
    /// Skip rows that already carry a translation
    pub only_missing: bool,
}

impl Default for TranslatorConfig {
    fn default() -> Self {
        Self {
            text_column: DEFAULT_TEXT_COLUMN.to_string(),
            output_column: DEFAULT_OUTPUT_COLUMN.to_string(),
            delay: DEFAULT_DELAY,
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            checkpoint_path: None,
            only_missing: false,
        }
    }
}

impl TranslatorConfig {
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_checkpoint(mut self, path: impl Into<PathBuf>, interval: usize) -> Self {
        self.checkpoint_path = Some(path.into());
        self.checkpoint_interval = interval;
        self
    }

    pub fn with_only_missing(mut self, only_missing: bool) -> Self {
        self.only_missing = only_missing;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TranslateReport {
    pub translated: usize,
    pub failed: Vec<usize>,
    pub skipped_empty: usize,
    pub skipped_existing: usize,
}

/// Translates a text column with one completion request per row.
///
/// The client is expected to decode deterministically (temperature 0).
pub struct Translator {
    client: Arc<dyn LlmClient>,
    prompt: PromptTemplate,
    config: TranslatorConfig,
}

impl Translator {
    pub fn new(client: Arc<dyn LlmClient>, config: TranslatorConfig) -> Self {
        Self {
            client,
            prompt: get_prompt_library().translate,
            config,
        }
    }

    /// Translate one tweet, returning the reply verbatim
    pub async fn translate_text(&self, tweet: &str) -> PipelineResult<String> {
        let messages = self.prompt.render(&context_from([("tweet", tweet)]))?;
        let response = self.client.generate_response(&messages, None).await?;
        Ok(response.content)
    }

    /// Fill the output column for every row with text. A failed row is logged
    /// with its index and left empty.
    pub async fn translate_table(&self, table: &mut Table) -> PipelineResult<TranslateReport> {
        let mut report = TranslateReport::default();
        let Some(text_col) = table.column_index(&self.config.text_column) else {
            warn!(
                "Column '{}' not found; nothing to translate",
                self.config.text_column
            );
            return Ok(report);
        };
        let out_col = table.ensure_column(&self.config.output_column);
        let total = table.len();
        info!("Translating {} rows from '{}'", total, self.config.text_column);

        let mut since_checkpoint = 0;
        let mut calls = 0;
        for row in 0..total {
            if row % PROGRESS_INTERVAL == 0 {
                info!("Processing tweet {}/{}", row, total);
            }

            let tweet = table.cell(row, text_col).unwrap_or_default().to_string();
            if tweet.trim().is_empty() {
                report.skipped_empty += 1;
                continue;
            }
            if self.config.only_missing
                && !table.cell(row, out_col).unwrap_or_default().trim().is_empty()
            {
                report.skipped_existing += 1;
                continue;
            }

            if calls > 0 && !self.config.delay.is_zero() {
                tokio::time::sleep(self.config.delay).await;
            }
            calls += 1;

            match self.translate_text(&tweet).await {
                Ok(translation) => {
                    debug!("Row {} translated", row);
                    table.set_cell(row, out_col, translation);
                    report.translated += 1;
                }
                Err(e) => {
                    warn!("Error processing row {}: {}", row, e);
                    report.failed.push(row);
                }
            }

            since_checkpoint += 1;
            if since_checkpoint >= self.config.checkpoint_interval {
                self.checkpoint(table)?;
                since_checkpoint = 0;
            }
        }

        if since_checkpoint > 0 {
            self.checkpoint(table)?;
        }
        info!(
            "Translation complete: {} translated, {} failed",
            report.translated,
            report.failed.len()
        );
        Ok(report)
    }

    fn checkpoint(&self, table: &Table) -> PipelineResult<()> {
        if let Some(path) = &self.config.checkpoint_path {
            table.write_csv(path)?;
            debug!("Checkpoint written to {}", path.display());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LlmError;
    use crate::llm_client::testing::MockCompletion;
    use crate::llm_client::CompletionResponse;
    use tempfile::tempdir;

    fn config() -> TranslatorConfig {
        TranslatorConfig::default().with_delay(Duration::ZERO)
    }

    #[tokio::test]
    async fn test_prompt_carries_tweet_and_examples() {
        let mut mock = MockCompletion::new();
        mock.expect_generate_response()
            .withf(|messages, _| {
                messages.len() == 2
                    && messages[0].role == "system"
                    && messages[1].content.contains("Tweet: আমি ভাত খাই\n")
                    && messages[1].content.contains("Google I/O")
            })
            .times(1)
            .returning(|_, _| Ok(CompletionResponse::text("I eat rice")));

        let translator = Translator::new(Arc::new(mock), config());
        assert_eq!(translator.translate_text("আমি ভাত খাই").await.unwrap(), "I eat rice");
    }

    #[tokio::test]
    async fn test_failed_rows_are_left_empty() {
        let mut table =
            Table::from_reader("id,Content\n1,এক\n2,\n3,দুই\n4,three\n".as_bytes()).unwrap();

        let mut mock = MockCompletion::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_generate_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CompletionResponse::text("one")));
        mock.expect_generate_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Err(LlmError::Service {
                    status: 500,
                    message: "boom".to_string(),
                })
            });
        mock.expect_generate_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CompletionResponse::text("three")));

        let translator = Translator::new(Arc::new(mock), config());
        let report = translator.translate_table(&mut table).await.unwrap();

        assert_eq!(
            table.column_values("translation").unwrap(),
            vec!["one", "", "", "three"]
        );
        assert_eq!(report.translated, 2);
        assert_eq!(report.failed, vec![2]);
        assert_eq!(report.skipped_empty, 1);
        // source cells untouched
        assert_eq!(table.column_values("Content").unwrap()[1], "");
    }

    #[tokio::test(start_paused = true)]
    async fn test_delay_separates_service_calls_only() {
        let mut table = Table::from_reader(
            "Content,translation\nএক,\n,\nদুই,two\nতিন,\nচার,\n".as_bytes(),
        )
        .unwrap();

        let calls = Arc::new(std::sync::Mutex::new(Vec::new()));
        let recorded = calls.clone();
        let mut mock = MockCompletion::new();
        mock.expect_generate_response()
            .times(3)
            .returning(move |_, _| {
                recorded.lock().unwrap().push(tokio::time::Instant::now());
                Ok(CompletionResponse::text("x"))
            });

        let config = TranslatorConfig::default()
            .with_delay(Duration::from_secs(1))
            .with_only_missing(true);
        let translator = Translator::new(Arc::new(mock), config);
        let start = tokio::time::Instant::now();
        let report = translator.translate_table(&mut table).await.unwrap();

        assert_eq!(report.translated, 3);
        assert_eq!(report.skipped_empty, 1);
        assert_eq!(report.skipped_existing, 1);

        // no pause before the first call, one pause before each later call
        let calls = calls.lock().unwrap();
        assert_eq!(calls[0], start);
        assert_eq!(calls[1] - calls[0], Duration::from_secs(1));
        assert_eq!(calls[2] - calls[1], Duration::from_secs(1));
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_only_missing_skips_translated_rows() {
        let mut table = Table::from_reader(
            "Content,translation\nএক,one\nদুই,\n".as_bytes(),
        )
        .unwrap();

        let mut mock = MockCompletion::new();
        mock.expect_generate_response()
            .times(1)
            .returning(|_, _| Ok(CompletionResponse::text("two")));

        let translator = Translator::new(Arc::new(mock), config().with_only_missing(true));
        let report = translator.translate_table(&mut table).await.unwrap();

        assert_eq!(report.skipped_existing, 1);
        assert_eq!(table.column_values("translation").unwrap(), vec!["one", "two"]);
    }

    #[tokio::test]
    async fn test_checkpoint_is_written() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("partial.csv");
        let mut table = Table::from_reader("Content\na\nb\nc\n".as_bytes()).unwrap();

        let mut mock = MockCompletion::new();
        mock.expect_generate_response()
            .times(3)
            .returning(|_, _| Ok(CompletionResponse::text("x")));

        let translator = Translator::new(Arc::new(mock), config().with_checkpoint(&path, 2));
        translator.translate_table(&mut table).await.unwrap();

        let saved = Table::read_csv(&path).unwrap();
        assert_eq!(saved, table);
    }

    #[tokio::test]
    async fn test_missing_column_is_skipped() {
        let mut table = Table::from_reader("text\nhello\n".as_bytes()).unwrap();
        let translator = Translator::new(Arc::new(MockCompletion::new()), config());
        let report = translator.translate_table(&mut table).await.unwrap();

        assert_eq!(report, TranslateReport::default());
        assert!(!table.has_column("translation"));
    }
}
