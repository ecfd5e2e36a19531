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


//! Few-shot stance prompt with retrieved context

use crate::prompts::models::{PromptTemplate, WorkedExample};
use crate::prompts::zero_shot::SYSTEM_PROMPT;

const TEMPLATE: &str = r#"Task: Analyze the following tweets and determine if the author's stance is in FAVOR of or AGAINST the specified target entity, using the tweet and context provided.
Target Entity: {entity}

Examples:
{examples}

Tweet: "{tweet}"
Context: "{context}"
Stance:"#;

pub fn template() -> PromptTemplate {
    PromptTemplate {
        name: "few_shot_context",
        version: "1",
        system: Some(SYSTEM_PROMPT),
        template: TEMPLATE,
        examples: vec![
            WorkedExample::new(vec![
                (
                    "Tweet",
                    "\"The country is moving forward under the leadership of Sheikh Hasina. #AwamiLeague\"",
                ),
                (
                    "Context",
                    "\"Sheikh Hasina is the leader of the Awami League and has been praised for infrastructure development.\"",
                ),
                ("Stance", "Favor"),
            ]),
            WorkedExample::new(vec![
                (
                    "Tweet",
                    "\"Corruption is rampant, and the government is not listening to the people. #Bangladesh\"",
                ),
                (
                    "Context",
                    "\"The Awami League has been criticized in the media for alleged corruption and authoritarian practices.\"",
                ),
                ("Stance", "Against"),
            ]),
        ],
        example_separator: "\n\n",
        slots: &["entity", "tweet", "context"],
    }
}
