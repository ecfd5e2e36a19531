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


//! Prompt-driven stance classification
//!
//! Each strategy renders its own template and issues exactly one completion
//! request per tweet. The trimmed reply is kept next to the parsed label.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::dataset::{Table, TEXT_COLUMN_CANDIDATES};
use crate::errors::{PipelineError, PipelineResult};
use crate::llm_client::{LlmClient, Message};
use crate::prompts::{get_prompt_library, PromptContext, PromptLibrary, PromptTemplate};
use crate::stance::StanceLabel;

pub const DEFAULT_ENTITY: &str = "Awami League";
pub const LABEL_COLUMN: &str = "stance_label";
pub const RAW_COLUMN: &str = "stance_raw";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StanceStrategy {
    ZeroShot,
    FewShot,
    FewShotContext,
    GraspChoq,
}

impl StanceStrategy {
    pub const ALL: [StanceStrategy; 4] = [
        StanceStrategy::ZeroShot,
        StanceStrategy::FewShot,
        StanceStrategy::FewShotContext,
        StanceStrategy::GraspChoq,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StanceStrategy::ZeroShot => "zero-shot",
            StanceStrategy::FewShot => "few-shot",
            StanceStrategy::FewShotContext => "few-shot-context",
            StanceStrategy::GraspChoq => "grasp-choq",
        }
    }

    fn template<'a>(&self, library: &'a PromptLibrary) -> &'a PromptTemplate {
        match self {
            StanceStrategy::ZeroShot => &library.zero_shot,
            StanceStrategy::FewShot => &library.few_shot,
            StanceStrategy::FewShotContext => &library.few_shot_context,
            StanceStrategy::GraspChoq => &library.grasp_choq,
        }
    }
}

impl fmt::Display for StanceStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StanceStrategy {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|strategy| strategy.as_str() == s)
            .ok_or_else(|| PipelineError::InvalidInput(format!("Unknown strategy: {}", s)))
    }
}

/// One tweet plus the auxiliary fields a strategy may read
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StanceInput {
    pub tweet: String,
    pub entity: Option<String>,
    pub context: Option<String>,
    pub tweet_info: Option<String>,
    pub relational_text: Option<String>,
    pub unstructured_data: Option<String>,
}

impl StanceInput {
    pub fn new(tweet: impl Into<String>) -> Self {
        Self {
            tweet: tweet.into(),
            ..Default::default()
        }
    }

    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entity = Some(entity.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_tweet_info(mut self, tweet_info: impl Into<String>) -> Self {
        self.tweet_info = Some(tweet_info.into());
        self
    }

    pub fn with_relational_text(mut self, relational_text: impl Into<String>) -> Self {
        self.relational_text = Some(relational_text.into());
        self
    }

    pub fn with_unstructured_data(mut self, unstructured_data: impl Into<String>) -> Self {
        self.unstructured_data = Some(unstructured_data.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StanceOutcome {
    pub label: StanceLabel,
    /// Trimmed reply text
    pub raw: String,
}

pub struct StanceClassifier {
    client: Arc<dyn LlmClient>,
    prompts: PromptLibrary,
    strategy: StanceStrategy,
    default_entity: String,
}

impl StanceClassifier {
    pub fn new(client: Arc<dyn LlmClient>, strategy: StanceStrategy) -> Self {
        Self {
            client,
            prompts: get_prompt_library(),
            strategy,
            default_entity: DEFAULT_ENTITY.to_string(),
        }
    }

    pub fn with_default_entity(mut self, entity: impl Into<String>) -> Self {
        self.default_entity = entity.into();
        self
    }

    pub fn strategy(&self) -> StanceStrategy {
        self.strategy
    }

    /// Fill the strategy's slots from the input. Fields the strategy does not
    /// use are ignored; absent auxiliary fields render as empty text.
    fn prompt_context(&self, input: &StanceInput) -> PromptContext {
        let template = self.strategy.template(&self.prompts);
        let entity = input.entity.as_deref().unwrap_or(&self.default_entity);
        let candidates = [
            ("tweet", input.tweet.as_str()),
            ("entity", entity),
            ("context", input.context.as_deref().unwrap_or_default()),
            ("tweet_info", input.tweet_info.as_deref().unwrap_or_default()),
            ("relational_text", input.relational_text.as_deref().unwrap_or_default()),
            ("unstructured_data", input.unstructured_data.as_deref().unwrap_or_default()),
        ];

        candidates
            .into_iter()
            .filter(|(slot, _)| template.slots.contains(slot))
            .map(|(slot, value)| (slot.to_string(), serde_json::Value::String(value.to_string())))
            .collect()
    }

    pub fn build_messages(&self, input: &StanceInput) -> PipelineResult<Vec<Message>> {
        let template = self.strategy.template(&self.prompts);
        Ok(template.render(&self.prompt_context(input))?)
    }

    /// Classify one tweet with a single completion request
    pub async fn classify(&self, input: &StanceInput) -> PipelineResult<StanceOutcome> {
        let messages = self.build_messages(input)?;
        let response = self.client.generate_response(&messages, None).await?;
        let raw = response.content.trim().to_string();
        let label = StanceLabel::parse(&raw);
        debug!("{} reply {:?} parsed as {}", self.strategy, raw, label);
        Ok(StanceOutcome { label, raw })
    }

    /// Classify every row with non-empty text, appending label and raw reply
    /// columns. Rows that fail are logged and left blank.
    pub async fn classify_table(
        &self,
        table: &mut Table,
        config: &ClassifyTableConfig,
    ) -> PipelineResult<ClassifyReport> {
        let text_col = match &config.text_column {
            Some(name) => table.require_column(name)?,
            None => {
                let name = table
                    .first_present_column(&config.fallback_text_columns())
                    .ok_or_else(|| PipelineError::ColumnNotFound {
                        column: "translation".to_string(),
                    })?;
                table.require_column(name)?
            }
        };
        let aux = AuxColumns::resolve(table, config);
        let label_col = table.ensure_column(LABEL_COLUMN);
        let raw_col = table.ensure_column(RAW_COLUMN);

        let mut report = ClassifyReport::default();
        for row in 0..table.len() {
            let tweet = table.cell(row, text_col).unwrap_or_default().trim().to_string();
            if tweet.is_empty() {
                report.skipped += 1;
                continue;
            }

            if report.attempted() > 0 && !config.delay.is_zero() {
                tokio::time::sleep(config.delay).await;
            }

            let input = aux.input_for(table, row, tweet);
            match self.classify(&input).await {
                Ok(outcome) => {
                    table.set_cell(row, label_col, outcome.label.as_str());
                    table.set_cell(row, raw_col, outcome.raw);
                    report.record(outcome.label);
                }
                Err(e) => {
                    warn!("Failed to classify row {}: {}", row, e);
                    report.failed += 1;
                }
            }

            if report.attempted() % 10 == 0 {
                info!("Classified {} rows", report.attempted());
            }
        }

        info!(
            "Classification complete: {} favor, {} against, {} unknown, {} failed",
            report.favor, report.against, report.unknown, report.failed
        );
        Ok(report)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassifyTableConfig {
    /// Text column; when unset, `translation` and then the usual tweet columns
    pub text_column: Option<String>,
    pub entity_column: Option<String>,
    pub context_column: Option<String>,
    pub tweet_info_column: Option<String>,
    pub relational_text_column: Option<String>,
    pub unstructured_data_column: Option<String>,
    pub delay: Duration,
}

impl Default for ClassifyTableConfig {
    fn default() -> Self {
        Self {
            text_column: None,
            entity_column: None,
            context_column: None,
            tweet_info_column: None,
            relational_text_column: None,
            unstructured_data_column: None,
            delay: Duration::ZERO,
        }
    }
}

impl ClassifyTableConfig {
    fn fallback_text_columns(&self) -> Vec<&'static str> {
        let mut columns = vec!["translation"];
        columns.extend_from_slice(TEXT_COLUMN_CANDIDATES);
        columns
    }
}

/// Column indices for the auxiliary fields of table rows
struct AuxColumns {
    entity: Option<usize>,
    context: Option<usize>,
    tweet_info: Option<usize>,
    relational_text: Option<usize>,
    unstructured_data: Option<usize>,
}

impl AuxColumns {
    fn resolve(table: &Table, config: &ClassifyTableConfig) -> Self {
        let lookup = |name: &Option<String>| {
            let name = name.as_deref()?;
            let index = table.column_index(name);
            if index.is_none() {
                warn!("Column '{}' not found; using empty values", name);
            }
            index
        };
        Self {
            entity: lookup(&config.entity_column),
            context: lookup(&config.context_column),
            tweet_info: lookup(&config.tweet_info_column),
            relational_text: lookup(&config.relational_text_column),
            unstructured_data: lookup(&config.unstructured_data_column),
        }
    }

    fn input_for(&self, table: &Table, row: usize, tweet: String) -> StanceInput {
        let text = |col: Option<usize>| {
            col.and_then(|c| table.cell(row, c))
                .unwrap_or_default()
                .to_string()
        };
        StanceInput {
            tweet,
            entity: self
                .entity
                .and_then(|c| table.cell(row, c))
                .filter(|e| !e.trim().is_empty())
                .map(str::to_string),
            context: Some(text(self.context)),
            tweet_info: Some(text(self.tweet_info)),
            relational_text: Some(text(self.relational_text)),
            unstructured_data: Some(text(self.unstructured_data)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClassifyReport {
    pub favor: usize,
    pub against: usize,
    pub unknown: usize,
    pub failed: usize,
    pub skipped: usize,
}

impl ClassifyReport {
    fn record(&mut self, label: StanceLabel) {
        match label {
            StanceLabel::Favor => self.favor += 1,
            StanceLabel::Against => self.against += 1,
            StanceLabel::Unknown => self.unknown += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.favor + self.against + self.unknown + self.failed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LlmError;
    use crate::llm_client::testing::MockCompletion;
    use crate::llm_client::CompletionResponse;

    fn replying(reply: &'static str) -> MockCompletion {
        let mut mock = MockCompletion::new();
        mock.expect_generate_response()
            .times(1)
            .returning(move |_, _| Ok(CompletionResponse::text(reply)));
        mock
    }

    #[tokio::test]
    async fn test_each_strategy_sends_one_request() {
        for strategy in StanceStrategy::ALL {
            let classifier = StanceClassifier::new(Arc::new(replying("  FAVOR \n")), strategy);
            let input = StanceInput::new("Great job by the government")
                .with_context("ctx")
                .with_tweet_info("info")
                .with_relational_text("rel")
                .with_unstructured_data("extra");

            let outcome = classifier.classify(&input).await.unwrap();
            assert_eq!(outcome.label, StanceLabel::Favor);
            assert_eq!(outcome.raw, "FAVOR");
            assert_eq!(outcome.raw.trim(), outcome.raw);
        }
    }

    #[test]
    fn test_zero_shot_prompt_uses_default_entity() {
        let classifier =
            StanceClassifier::new(Arc::new(MockCompletion::new()), StanceStrategy::ZeroShot);
        let messages = classifier
            .build_messages(&StanceInput::new("some tweet"))
            .unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[1].content.contains("Target Entity: Awami League"));
        assert!(messages[1].content.contains("Tweet: some tweet"));
    }

    #[test]
    fn test_absent_auxiliary_fields_render_empty() {
        for strategy in [StanceStrategy::FewShotContext, StanceStrategy::GraspChoq] {
            let classifier = StanceClassifier::new(Arc::new(MockCompletion::new()), strategy);
            let bare = classifier
                .build_messages(&StanceInput::new("tweet"))
                .unwrap();
            let explicit = classifier
                .build_messages(
                    &StanceInput::new("tweet")
                        .with_context("")
                        .with_tweet_info("")
                        .with_relational_text("")
                        .with_unstructured_data(""),
                )
                .unwrap();
            assert_eq!(bare, explicit);
        }
    }

    #[tokio::test]
    async fn test_single_grasp_choq_tweet_without_auxiliary_fields() {
        let classifier =
            StanceClassifier::new(Arc::new(replying("Answer: AGAINST")), StanceStrategy::GraspChoq);
        let outcome = classifier.classify(&StanceInput::new("tweet")).await.unwrap();
        assert_eq!(outcome.label, StanceLabel::Against);
    }

    #[tokio::test]
    async fn test_service_error_propagates() {
        let mut mock = MockCompletion::new();
        mock.expect_generate_response()
            .times(1)
            .returning(|_, _| Err(LlmError::Authentication {
                message: "bad key".to_string(),
            }));
        let classifier = StanceClassifier::new(Arc::new(mock), StanceStrategy::FewShot);

        let result = classifier.classify(&StanceInput::new("tweet")).await;
        assert!(matches!(result, Err(PipelineError::Llm(_))));
    }

    #[tokio::test]
    async fn test_table_rows_get_labels_in_order() {
        let mut table = Table::from_reader(
            "id,translation\n1,first tweet\n2,\n3,second tweet\n4,third tweet\n".as_bytes(),
        )
        .unwrap();

        let mut mock = MockCompletion::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_generate_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CompletionResponse::text("AGAINST")));
        mock.expect_generate_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(LlmError::RateLimit));
        mock.expect_generate_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(CompletionResponse::text("no idea")));

        let classifier = StanceClassifier::new(Arc::new(mock), StanceStrategy::GraspChoq);
        let report = classifier
            .classify_table(&mut table, &ClassifyTableConfig::default())
            .await
            .unwrap();

        assert_eq!(table.headers().last().map(String::as_str), Some(RAW_COLUMN));
        assert_eq!(table.column_values(LABEL_COLUMN).unwrap(), vec!["AGAINST", "", "", "UNKNOWN"]);
        assert_eq!(table.column_values(RAW_COLUMN).unwrap()[3], "no idea");
        assert_eq!(
            report,
            ClassifyReport {
                favor: 0,
                against: 1,
                unknown: 1,
                failed: 1,
                skipped: 1,
            }
        );
    }

    #[tokio::test]
    async fn test_missing_text_column_is_an_error() {
        let mut table = Table::from_reader("id\n1\n".as_bytes()).unwrap();
        let classifier =
            StanceClassifier::new(Arc::new(MockCompletion::new()), StanceStrategy::ZeroShot);
        let result = classifier
            .classify_table(&mut table, &ClassifyTableConfig::default())
            .await;
        assert!(matches!(result, Err(PipelineError::ColumnNotFound { .. })));
    }

    #[test]
    fn test_strategy_names_round_trip() {
        for strategy in StanceStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<StanceStrategy>().unwrap(), strategy);
        }
        assert!("four-shot".parse::<StanceStrategy>().is_err());
    }
}
