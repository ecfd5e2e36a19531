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


//! Zero-shot stance prompt

use crate::prompts::models::PromptTemplate;

pub const SYSTEM_PROMPT: &str = "You are an analyst of political discourse on social media. \
Answer with exactly one word: FAVOR or AGAINST.";

const TEMPLATE: &str = r#"Task: Read the tweet and determine whether it expresses a stance in FAVOR of or AGAINST the specified target entity.
Target Entity: {entity}
Tweet: {tweet}"#;

pub fn template() -> PromptTemplate {
    PromptTemplate {
        name: "zero_shot",
        version: "1",
        system: Some(SYSTEM_PROMPT),
        template: TEMPLATE,
        examples: Vec::new(),
        example_separator: "\n\n",
        slots: &["entity", "tweet"],
    }
}
