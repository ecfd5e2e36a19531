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


use std::collections::HashMap;

use crate::text::is_stop_word;

/// Join column values with single spaces
pub fn build_corpus<'a>(values: impl IntoIterator<Item = &'a str>) -> String {
    values.into_iter().collect::<Vec<_>>().join(" ")
}

/// Most frequent whitespace-delimited terms, stop words excluded.
///
/// Counting is case-insensitive; each term is reported in the form it first
/// appeared in. Ties keep first-occurrence order.
pub fn term_frequencies(corpus: &str, top_n: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for word in corpus.split_whitespace() {
        if is_stop_word(word) {
            continue;
        }
        let key = word.to_lowercase();
        match positions.get(&key) {
            Some(&index) => counts[index].1 += 1,
            None => {
                positions.insert(key, counts.len());
                counts.push((word.to_string(), 1));
            }
        }
    }

    // stable sort keeps first-occurrence order within equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(top_n);
    counts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cat_sat_on_the_mat() {
        let terms = term_frequencies("the cat sat on the mat the cat ran", 100);
        assert_eq!(
            terms,
            vec![
                ("cat".to_string(), 2),
                ("sat".to_string(), 1),
                ("mat".to_string(), 1),
                ("ran".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_counts_fold_case_but_keep_first_form() {
        let terms = term_frequencies("Hasina spoke. hasina HASINA The", 10);
        assert_eq!(terms[0], ("Hasina".to_string(), 3));
        // capitalized stop words are still stop words
        assert!(terms.iter().all(|(w, _)| w != "The"));
    }

    #[test]
    fn test_top_n_truncates() {
        let terms = term_frequencies("a1 b2 c3 d4 b2", 2);
        assert_eq!(terms, vec![("b2".to_string(), 2), ("a1".to_string(), 1)]);
    }

    #[test]
    fn test_build_corpus_joins_with_spaces() {
        assert_eq!(build_corpus(["one", "two three"]), "one two three");
        assert!(term_frequencies(&build_corpus(Vec::<&str>::new()), 5).is_empty());
    }
}
