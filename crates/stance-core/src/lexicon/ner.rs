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


//! Named-entity recognition backends
//!
//! Two recognizers share one trait: an offline heuristic over capitalized
//! spans and one that asks the completion service for OntoNotes-tagged spans.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::errors::PipelineResult;
use crate::llm_client::{parse_json_content, LlmClient};
use crate::prompts::extract_entities::ExtractedSpans;
use crate::prompts::{context_from, get_prompt_library, PromptTemplate};
use crate::text::{is_stop_word, token_spans};

pub const DEFAULT_MAX_CHARS: usize = 2_000_000;
pub const DEFAULT_LLM_CHUNK_CHARS: usize = 8_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub text: String,
    pub label: String,
}

impl EntitySpan {
    pub fn new(text: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            label: label.into(),
        }
    }
}

#[async_trait]
pub trait EntityRecognizer: Send + Sync {
    /// Entity spans in order of appearance
    async fn recognize(&self, text: &str) -> PipelineResult<Vec<EntitySpan>>;

    /// Surface text to label. A span seen more than once keeps its last label.
    async fn entity_tags(&self, text: &str) -> PipelineResult<HashMap<String, String>> {
        Ok(self
            .recognize(text)
            .await?
            .into_iter()
            .map(|span| (span.text, span.label))
            .collect())
    }
}

/// Cut `text` to at most `max_chars` characters, warning when it does
pub fn bound_corpus(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => {
            warn!(
                "Corpus exceeds {} characters; entity recognition sees only the prefix",
                max_chars
            );
            &text[..cut]
        }
        None => text,
    }
}

const ORG_HEADS: &[&str] = &[
    "League", "Party", "Government", "Ministry", "Commission", "University", "Bank", "Council",
    "Court", "Police", "Army", "Association", "Front", "Alliance", "Parliament", "Committee",
];

/// Offline recognizer: maximal runs of capitalized words.
///
/// Known names come from the gazetteer. Otherwise all-caps acronyms and runs
/// ending in an organization head word are `ORG`, remaining multi-word runs are
/// `PERSON`. Single capitalized words at the start of a sentence are ignored.
#[derive(Debug, Clone)]
pub struct CapitalizedSpanRecognizer {
    gazetteer: HashMap<String, String>,
}

impl Default for CapitalizedSpanRecognizer {
    fn default() -> Self {
        let gazetteer = [
            ("Bangladesh", "GPE"),
            ("Dhaka", "GPE"),
            ("Chittagong", "GPE"),
            ("India", "GPE"),
            ("Pakistan", "GPE"),
            ("Bangladeshi", "NORP"),
            ("Bengali", "NORP"),
            ("Hasina", "PERSON"),
            ("Yunus", "PERSON"),
            ("Zia", "PERSON"),
            ("Mujib", "PERSON"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        Self { gazetteer }
    }
}

impl CapitalizedSpanRecognizer {
    pub fn with_gazetteer(mut self, entries: impl IntoIterator<Item = (String, String)>) -> Self {
        self.gazetteer.extend(entries);
        self
    }

    fn label_for(&self, words: &[&str], sentence_initial: bool) -> Option<String> {
        let span = words.join(" ");
        if let Some(label) = self.gazetteer.get(&span) {
            return Some(label.clone());
        }
        let last = *words.last()?;
        if words.len() == 1 {
            let acronym = last.len() >= 2 && last.chars().all(|c| c.is_ascii_uppercase());
            if acronym {
                return Some("ORG".to_string());
            }
            if sentence_initial || is_stop_word(last) || !ORG_HEADS.contains(&last) {
                return None;
            }
            return Some("ORG".to_string());
        }
        if ORG_HEADS.contains(&last) {
            Some("ORG".to_string())
        } else {
            Some("PERSON".to_string())
        }
    }

    fn flush_run(&self, run: &mut Vec<&str>, initial: bool, spans: &mut Vec<EntitySpan>) {
        // a leading stop word ("The Awami League") is not part of the name
        let initial = if initial && run.len() > 1 && is_stop_word(run[0]) {
            run.remove(0);
            false
        } else {
            initial
        };
        if let Some(label) = self.label_for(run, initial) {
            spans.push(EntitySpan::new(run.join(" "), label));
        }
        run.clear();
    }
}

fn is_capitalized(token: &str) -> bool {
    token.chars().next().is_some_and(|c| c.is_uppercase())
}

#[async_trait]
impl EntityRecognizer for CapitalizedSpanRecognizer {
    async fn recognize(&self, text: &str) -> PipelineResult<Vec<EntitySpan>> {
        let mut spans = Vec::new();
        let mut run: Vec<&str> = Vec::new();
        let mut run_initial = false;
        let mut sentence_start = true;

        for range in token_spans(text) {
            let token = &text[range];
            if is_capitalized(token) {
                if run.is_empty() {
                    run_initial = sentence_start;
                }
                run.push(token);
                sentence_start = false;
                continue;
            }
            if !run.is_empty() {
                self.flush_run(&mut run, run_initial, &mut spans);
            }
            sentence_start = matches!(token, "." | "!" | "?" | "।");
        }
        if !run.is_empty() {
            self.flush_run(&mut run, run_initial, &mut spans);
        }

        Ok(spans)
    }
}

/// Recognizer backed by the completion service, one request per chunk
pub struct LlmEntityRecognizer {
    client: Arc<dyn LlmClient>,
    prompt: PromptTemplate,
    chunk_chars: usize,
}

impl LlmEntityRecognizer {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            prompt: get_prompt_library().extract_entities,
            chunk_chars: DEFAULT_LLM_CHUNK_CHARS,
        }
    }

    pub fn with_chunk_chars(mut self, chunk_chars: usize) -> Self {
        self.chunk_chars = chunk_chars.max(1);
        self
    }

    /// Split on whitespace into pieces of roughly `chunk_chars` bytes
    fn chunks<'a>(&self, text: &'a str) -> Vec<&'a str> {
        let mut chunks = Vec::new();
        let mut start = 0;
        let mut end = 0;
        for (index, _) in text.match_indices(char::is_whitespace) {
            if index - start > self.chunk_chars && end > start {
                chunks.push(text[start..end].trim());
                start = end;
            }
            end = index;
        }
        if start < text.len() {
            chunks.push(text[start..].trim());
        }
        chunks.retain(|c| !c.is_empty());
        chunks
    }
}

#[async_trait]
impl EntityRecognizer for LlmEntityRecognizer {
    async fn recognize(&self, text: &str) -> PipelineResult<Vec<EntitySpan>> {
        let mut spans = Vec::new();
        for (index, chunk) in self.chunks(text).into_iter().enumerate() {
            let messages = self.prompt.render(&context_from([("text", chunk)]))?;
            let reply = match self.client.generate_text(&messages).await {
                Ok(reply) => reply,
                Err(e) => {
                    warn!("Entity recognition failed for chunk {}: {}", index, e);
                    continue;
                }
            };
            match parse_json_content::<ExtractedSpans>(&reply) {
                Ok(parsed) => {
                    debug!("Chunk {} yielded {} entities", index, parsed.entities.len());
                    spans.extend(
                        parsed
                            .entities
                            .into_iter()
                            .map(|e| EntitySpan::new(e.text, e.label)),
                    );
                }
                Err(e) => warn!("Unparseable entity reply for chunk {}: {}", index, e),
            }
        }
        Ok(spans)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::LlmError;
    use crate::llm_client::testing::MockCompletion;
    use crate::llm_client::CompletionResponse;

    #[tokio::test]
    async fn test_capitalized_runs() {
        let recognizer = CapitalizedSpanRecognizer::default();
        let spans = recognizer
            .recognize("Yesterday, Sheikh Hasina met BNP leaders in Dhaka. The Awami League objected.")
            .await
            .unwrap();

        assert_eq!(
            spans,
            vec![
                EntitySpan::new("Sheikh Hasina", "PERSON"),
                EntitySpan::new("BNP", "ORG"),
                EntitySpan::new("Dhaka", "GPE"),
                EntitySpan::new("Awami League", "ORG"),
            ]
        );
    }

    #[tokio::test]
    async fn test_gazetteer_and_org_heads() {
        let recognizer = CapitalizedSpanRecognizer::default()
            .with_gazetteer([("Jamuna".to_string(), "LOC".to_string())]);
        let tags = recognizer
            .entity_tags("rivers like Jamuna and the Jamuna Bank")
            .await
            .unwrap();
        assert_eq!(tags.get("Jamuna").map(String::as_str), Some("LOC"));
        assert_eq!(tags.get("Jamuna Bank").map(String::as_str), Some("ORG"));
    }

    #[test]
    fn test_bound_corpus_respects_char_boundaries() {
        assert_eq!(bound_corpus("হাসিনা", 2), "হা");
        assert_eq!(bound_corpus("short", 100), "short");
    }

    #[tokio::test]
    async fn test_llm_recognizer_parses_json_and_skips_bad_chunks() {
        let mut mock = MockCompletion::new();
        let mut seq = mockall::Sequence::new();
        mock.expect_generate_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| {
                Ok(CompletionResponse::text(
                    "```json\n{\"entities\": [{\"text\": \"Dhaka\", \"label\": \"GPE\"}]}\n```",
                ))
            });
        mock.expect_generate_response()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(LlmError::RateLimit));

        let recognizer = LlmEntityRecognizer::new(Arc::new(mock)).with_chunk_chars(20);
        let spans = recognizer
            .recognize("Dhaka is big. Chittagong too")
            .await
            .unwrap();
        assert_eq!(spans, vec![EntitySpan::new("Dhaka", "GPE")]);
    }

    #[test]
    fn test_chunks_cover_all_words() {
        let recognizer =
            LlmEntityRecognizer::new(Arc::new(MockCompletion::new())).with_chunk_chars(10);
        let text = "alpha beta gamma delta epsilon";
        let chunks = recognizer.chunks(text);
        assert!(chunks.len() > 1);
        assert_eq!(chunks.join(" "), text);
    }
}
