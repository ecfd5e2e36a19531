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


//! Word tokenization
//!
//! Words (including internal hyphens and apostrophes) are one token each and
//! every punctuation mark is a token of its own, so `"Hello, world!"` yields
//! four tokens.

use std::ops::Range;

use once_cell::sync::Lazy;
use regex::Regex;

static TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\w+(?:['’\-]\w+)*|[^\w\s]").expect("token pattern is valid")
});

/// Byte ranges of every token in `text`
pub fn token_spans(text: &str) -> Vec<Range<usize>> {
    TOKEN_RE.find_iter(text).map(|m| m.range()).collect()
}

/// Tokens of `text` as borrowed slices
pub fn word_tokens(text: &str) -> Vec<&str> {
    TOKEN_RE.find_iter(text).map(|m| m.as_str()).collect()
}

/// Number of tokens in `text`
pub fn word_count(text: &str) -> usize {
    TOKEN_RE.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_punctuation_is_separate() {
        assert_eq!(word_tokens("Hello, world!"), vec!["Hello", ",", "world", "!"]);
    }

    #[test]
    fn test_hashtags_and_contractions() {
        assert_eq!(
            word_tokens("#AwamiLeague isn't pro-BNP"),
            vec!["#", "AwamiLeague", "isn't", "pro-BNP"]
        );
    }

    #[test]
    fn test_non_latin_scripts() {
        assert_eq!(word_count("শেখ হাসিনা আজ"), 3);
    }

    #[test]
    fn test_spans_index_original_text() {
        let text = "ab, cd";
        let spans = token_spans(text);
        let pieces: Vec<_> = spans.iter().map(|r| &text[r.clone()]).collect();
        assert_eq!(pieces, vec!["ab", ",", "cd"]);
    }

    #[test]
    fn test_empty_text() {
        assert_eq!(word_count("   "), 0);
        assert!(token_spans("").is_empty());
    }
}
