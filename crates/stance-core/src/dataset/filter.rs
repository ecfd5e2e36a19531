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


//! Inclusion predicates for raw tweet tables
//!
//! Predicates run in a fixed order and each is skipped, with a warning, when
//! the column it needs is absent.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use crate::dataset::{Table, TEXT_COLUMN_CANDIDATES};
use crate::text::word_count;

pub const DEFAULT_MIN_TOKENS: usize = 5;

pub const DEFAULT_POLITICAL_KEYWORDS: &[&str] = &[
    "awami league",
    "bangladesh awami league",
    "al",
    "bnp",
    "bangladesh nationalist party",
    "jatiya party",
    "jp",
    "jamaat-e-islami",
    "jamaat",
    "jatiyo party",
    "sheikh hasina",
    "hasina",
    "khaleda zia",
    "zia",
    "pro-awami",
    "pro-bnp",
    "bal",
    "bangladesh awami",
    "nationalist",
    "#awamileague",
    "#bnp",
    "#bangladeshpolitics",
];

const TRUTHY: &[&str] = &["true", "1", "yes", "y", "t"];

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FilterConfig {
    pub image_column: String,
    pub bio_column: String,
    pub stance_column: String,
    /// Matched as lowercase substrings of the bio
    pub keywords: Vec<String>,
    #[validate(range(min = 1))]
    pub min_tokens: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            image_column: "has_image".to_string(),
            bio_column: "user_bio".to_string(),
            stance_column: "stance".to_string(),
            keywords: DEFAULT_POLITICAL_KEYWORDS
                .iter()
                .map(|k| k.to_string())
                .collect(),
            min_tokens: DEFAULT_MIN_TOKENS,
        }
    }
}

impl FilterConfig {
    pub fn with_keywords(mut self, keywords: Vec<String>) -> Self {
        self.keywords = keywords.into_iter().map(|k| k.to_lowercase()).collect();
        self
    }

    pub fn with_min_tokens(mut self, min_tokens: usize) -> Self {
        self.min_tokens = min_tokens;
        self
    }

    fn bio_matches(&self, bio: &str) -> bool {
        let bio = bio.to_lowercase();
        self.keywords
            .iter()
            .any(|k| bio.contains(k.to_lowercase().as_str()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterStep {
    ExcludeImages,
    PoliticalBio,
    LabeledStance,
    MinimumLength,
}

impl fmt::Display for FilterStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FilterStep::ExcludeImages => "exclude images",
            FilterStep::PoliticalBio => "political bio",
            FilterStep::LabeledStance => "labeled stance",
            FilterStep::MinimumLength => "minimum length",
        };
        f.write_str(name)
    }
}

/// Row counts after each applied predicate
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterReport {
    pub input_rows: usize,
    pub applied: Vec<(FilterStep, usize)>,
    pub skipped: Vec<FilterStep>,
    pub text_column: Option<String>,
}

impl FilterReport {
    pub fn output_rows(&self) -> usize {
        self.applied
            .last()
            .map(|(_, rows)| *rows)
            .unwrap_or(self.input_rows)
    }
}

impl fmt::Display for FilterReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "input rows: {}", self.input_rows)?;
        for (step, rows) in &self.applied {
            writeln!(f, "after {step}: {rows}")?;
        }
        for step in &self.skipped {
            writeln!(f, "skipped: {step}")?;
        }
        write!(f, "output rows: {}", self.output_rows())
    }
}

fn is_truthy(value: &str) -> bool {
    let value = value.trim().to_lowercase();
    TRUTHY.contains(&value.as_str())
}

/// Apply the inclusion predicates in order, returning the kept rows
pub fn filter_dataset(table: &Table, config: &FilterConfig) -> (Table, FilterReport) {
    let mut report = FilterReport {
        input_rows: table.len(),
        ..Default::default()
    };
    let mut current = table.clone();

    match current.column_index(&config.image_column) {
        Some(col) => {
            current = current.filter_rows(|row| !is_truthy(&row[col]));
            report.applied.push((FilterStep::ExcludeImages, current.len()));
        }
        None => {
            warn!("Column '{}' not found; skipping image filter", config.image_column);
            report.skipped.push(FilterStep::ExcludeImages);
        }
    }

    if let Some(col) = current.column_index(&config.bio_column) {
        current = current.filter_rows(|row| config.bio_matches(&row[col]));
        report.applied.push((FilterStep::PoliticalBio, current.len()));
    } else if let Some(col) = current.column_index(&config.stance_column) {
        warn!(
            "Column '{}' not found; keeping rows with a labeled '{}' instead",
            config.bio_column, config.stance_column
        );
        current = current.filter_rows(|row| !row[col].trim().is_empty());
        report.applied.push((FilterStep::LabeledStance, current.len()));
        report.skipped.push(FilterStep::PoliticalBio);
    } else {
        warn!(
            "Neither '{}' nor '{}' present; skipping political affiliation filter",
            config.bio_column, config.stance_column
        );
        report.skipped.push(FilterStep::PoliticalBio);
    }

    match current.first_present_column(TEXT_COLUMN_CANDIDATES) {
        Some(name) => {
            report.text_column = Some(name.to_string());
            if let Some(col) = current.column_index(name) {
                current = current.filter_rows(|row| word_count(&row[col]) >= config.min_tokens);
            }
            report.applied.push((FilterStep::MinimumLength, current.len()));
        }
        None => {
            warn!("No tweet text column found; skipping length filter");
            report.skipped.push(FilterStep::MinimumLength);
        }
    }

    info!(
        "Filtered dataset from {} to {} rows",
        report.input_rows,
        current.len()
    );
    (current, report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(csv: &str) -> Table {
        Table::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_ten_rows_image_bio_and_length() {
        // two image rows, one apolitical bio, the rest long and political
        let data = table(
            "has_image,user_bio,tweet_text\n\
             true,BNP supporter,this tweet is long enough to keep\n\
             False,BNP supporter,this tweet is long enough to keep\n\
             0,Awami League member,this tweet is long enough to keep\n\
             yes,Awami League member,this tweet is long enough to keep\n\
             ,Proud of Sheikh Hasina,this tweet is long enough to keep\n\
             no,I love cooking,this tweet is long enough to keep\n\
             f,Jamaat activist,this tweet is long enough to keep\n\
             n,Khaleda Zia fan,this tweet is long enough to keep\n\
             0,#BNP forever,this tweet is long enough to keep\n\
             0,Awami League voter,this tweet is long enough to keep\n",
        );

        let (kept, report) = filter_dataset(&data, &FilterConfig::default());

        assert_eq!(kept.len(), 7);
        assert_eq!(report.input_rows, 10);
        assert_eq!(
            report.applied,
            vec![
                (FilterStep::ExcludeImages, 8),
                (FilterStep::PoliticalBio, 7),
                (FilterStep::MinimumLength, 7),
            ]
        );
        assert!(report.skipped.is_empty());
        assert_eq!(report.text_column.as_deref(), Some("tweet_text"));
        assert_eq!(kept.cell(0, 1), Some("BNP supporter"));
    }

    #[test]
    fn test_short_tweets_are_dropped() {
        let data = table("stance,text\nfavor,too short\nagainst,\"one, two, three\"\n");
        let (kept, report) = filter_dataset(&data, &FilterConfig::default());

        // "one , two , three" is five tokens
        assert_eq!(kept.len(), 1);
        assert_eq!(kept.cell(0, 0), Some("against"));
        assert_eq!(
            report.skipped,
            vec![FilterStep::ExcludeImages, FilterStep::PoliticalBio]
        );
    }

    #[test]
    fn test_stance_fallback_drops_unlabeled_rows() {
        let data = table(
            "stance,Content\n\
             favor,a sufficiently long tweet right here\n\
             ,a sufficiently long tweet right here\n",
        );
        let (kept, report) = filter_dataset(&data, &FilterConfig::default());

        assert_eq!(kept.len(), 1);
        assert_eq!(report.applied[0], (FilterStep::LabeledStance, 1));
        assert_eq!(report.text_column.as_deref(), Some("Content"));
    }

    #[test]
    fn test_no_columns_keeps_everything() {
        let data = table("id\n1\n2\n");
        let (kept, report) = filter_dataset(&data, &FilterConfig::default());

        assert_eq!(kept, data);
        assert_eq!(report.skipped.len(), 3);
        assert_eq!(report.output_rows(), 2);
    }

    #[test]
    fn test_custom_keywords_are_lowercased() {
        let config = FilterConfig::default().with_keywords(vec!["Cricket".to_string()]);
        let data = table(
            "user_bio,tweet\n\
             cricket fan,a sufficiently long tweet right here\n\
             BNP supporter,a sufficiently long tweet right here\n",
        );
        let (kept, _) = filter_dataset(&data, &config);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept.cell(0, 0), Some("cricket fan"));
    }

    #[test]
    fn test_empty_result_is_not_an_error() {
        let data = table("has_image,text\ntrue,a sufficiently long tweet right here\n");
        let (kept, report) = filter_dataset(&data, &FilterConfig::default());
        assert!(kept.is_empty());
        assert_eq!(report.output_rows(), 0);
    }

    #[test]
    fn test_report_display() {
        let report = FilterReport {
            input_rows: 3,
            applied: vec![(FilterStep::MinimumLength, 2)],
            skipped: vec![FilterStep::ExcludeImages],
            text_column: Some("text".to_string()),
        };
        let rendered = report.to_string();
        assert!(rendered.contains("after minimum length: 2"));
        assert!(rendered.contains("skipped: exclude images"));
        assert!(rendered.ends_with("output rows: 2"));
    }
}
