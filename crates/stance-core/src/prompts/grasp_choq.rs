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


//! GRASP-ChoQ reasoning prompt
//!
//! The model is walked through question/answer chains about who is being
//! criticized and who is depicted in power before it commits to a stance.
//! Three auxiliary fields carry tweet metadata, relational background text and
//! free-form extra text.

use crate::prompts::models::{PromptTemplate, WorkedExample};

pub const SYSTEM_PROMPT: &str = "You are an analyst of Bangladeshi politics. \
Reason step by step, then finish with a final line of the form `Stance: FAVOR` or `Stance: AGAINST`.";

const TEMPLATE: &str = r#"Tweet: {tweet}
Read the tweet above. The tweet has a political stance. It may express a view either in favor of the Awami League of Bangladesh or against it.
Detect the stance of the tweet with respect to the Awami League. Use reasoning based on political references or implied affiliations.

ASK QUESTIONS TO DETECT STANCE:
{examples}

To aid your decision, general background knowledge about political figures and affiliations is provided.
TWEET_INFO: {tweet_info}
GENERAL_INFO: {relational_text}
EXTRA_INFO: {unstructured_data}"#;

pub fn template() -> PromptTemplate {
    PromptTemplate {
        name: "grasp_choq",
        version: "1",
        system: Some(SYSTEM_PROMPT),
        template: TEMPLATE,
        examples: vec![
            WorkedExample::new(vec![
                ("Q", "Who is being criticized here?"),
                (
                    "A",
                    "Muhammad Yunus. Because the tweet uses \"illegal\" to describe him. Since Yunus is opposed to Sheikh Hasina (leader of Awami League), this implies support for Awami League.",
                ),
            ]),
            WorkedExample::new(vec![
                ("Q", "Which government is depicted in power in the tweet?"),
                (
                    "A",
                    "Muhammad Yunus's government. As he is seen to follow Hasina, and is portrayed negatively, the stance favors the Awami League.",
                ),
            ]),
        ],
        example_separator: "\n",
        slots: &["tweet", "tweet_info", "relational_text", "unstructured_data"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::models::context_from;

    #[test]
    fn test_reasoning_chains_are_contiguous() {
        let text = template()
            .render_text(&context_from([
                ("tweet", "t"),
                ("tweet_info", "info"),
                ("relational_text", "rel"),
                ("unstructured_data", "extra"),
            ]))
            .unwrap();
        assert!(text.starts_with("Tweet: t\n"));
        assert!(text.contains("Awami League.\nQ: Which government"));
        assert!(text.ends_with("EXTRA_INFO: extra"));
        assert!(text.contains("GENERAL_INFO: rel\n"));
    }
}
