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


//! Lexical summary of a text corpus: term frequencies, entity tags and a
//! word cloud

pub mod frequency;
pub mod ner;
pub mod summarizer;
pub mod wordcloud;

pub use frequency::{build_corpus, term_frequencies};
pub use ner::{
    bound_corpus, CapitalizedSpanRecognizer, EntityRecognizer, EntitySpan, LlmEntityRecognizer,
};
pub use summarizer::{
    entries_to_table, LexicalSummarizer, Summary, SummarizerConfig, TermFrequencyEntry,
};
pub use wordcloud::{PlacedWord, WordCloud, WordCloudConfig};
