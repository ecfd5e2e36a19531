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


//! Tweet translation prompt

use crate::prompts::models::{PromptTemplate, WorkedExample};

pub const SYSTEM_PROMPT: &str = "You are a helpful assistant that translates tweets to English while preserving proper nouns. \
If the tweet is already in English, you output the original tweet.";

const TEMPLATE: &str = r#"Task: Translate the following tweet into English. If the tweet is already in English, output the original tweet. Do NOT translate proper nouns (e.g., names of people, organizations, specific places).

Examples:
{examples}

Tweet: {tweet}
Translated Tweet (English):"#;

/// Translate a tweet into English, leaving English tweets untouched
pub fn template() -> PromptTemplate {
    PromptTemplate {
        name: "translate",
        version: "1",
        system: Some(SYSTEM_PROMPT),
        template: TEMPLATE,
        examples: vec![
            WorkedExample::new(vec![
                (
                    "Tweet (Bangla)",
                    "প্রধানমন্ত্রী শেখ হাসিনা আজ একটি নতুন প্রকল্প উদ্বোধন করবেন।",
                ),
                (
                    "Translated Tweet (English)",
                    "Prime Minister Sheikh Hasina will inaugurate a new project today.",
                ),
            ]),
            WorkedExample::new(vec![
                ("Tweet (English)", "Just attended the Google I/O conference."),
                (
                    "Translated Tweet (English)",
                    "Just attended the Google I/O conference.",
                ),
            ]),
        ],
        example_separator: "\n\n",
        slots: &["tweet"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::models::context_from;

    #[test]
    fn test_examples_cover_translation_and_identity() {
        let prompt = template();
        assert_eq!(prompt.examples.len(), 2);
        let identity = &prompt.examples[1].fields;
        assert_eq!(identity[0].1, identity[1].1);
    }

    #[test]
    fn test_tweet_is_last_before_answer_cue() {
        let text = template()
            .render_text(&context_from([("tweet", "আমি ভাত খাই")]))
            .unwrap();
        assert!(text.ends_with("Tweet: আমি ভাত খাই\nTranslated Tweet (English):"));
        assert!(text.contains("Sheikh Hasina will inaugurate"));
    }
}
