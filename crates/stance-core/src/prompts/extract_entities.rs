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


//! Named-entity recognition prompt

use serde::{Deserialize, Serialize};

use crate::prompts::models::PromptTemplate;

/// Entity span returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSpan {
    pub text: String,
    pub label: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedSpans {
    #[serde(default)]
    pub entities: Vec<ExtractedSpan>,
}

const SYSTEM_PROMPT: &str = "You are a named-entity recognizer. Label spans with the OntoNotes tag set: \
PERSON, NORP, FAC, ORG, GPE, LOC, PRODUCT, EVENT, WORK_OF_ART, LAW, LANGUAGE, DATE, TIME, PERCENT, MONEY, QUANTITY, ORDINAL, CARDINAL.";

const TEMPLATE: &str = r#"Extract every named entity from the text below. Copy each span exactly as it appears in the text.
Respond with JSON only: {"entities": [{"text": "...", "label": "..."}]}

TEXT:
{text}"#;

pub fn template() -> PromptTemplate {
    PromptTemplate {
        name: "extract_entities",
        version: "1",
        system: Some(SYSTEM_PROMPT),
        template: TEMPLATE,
        examples: Vec::new(),
        example_separator: "\n\n",
        slots: &["text"],
    }
}
