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


use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

static LABEL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(favou?r|against)\b").expect("label pattern is valid")
});

/// Stance of a tweet toward the target entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StanceLabel {
    Favor,
    Against,
    Unknown,
}

impl StanceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            StanceLabel::Favor => "FAVOR",
            StanceLabel::Against => "AGAINST",
            StanceLabel::Unknown => "UNKNOWN",
        }
    }

    /// Interpret a raw model reply.
    ///
    /// The last FAVOR/AGAINST word in the reply wins, so reasoning chains that
    /// end in `Stance: AGAINST` parse as Against even when FAVOR appears in the
    /// argument. Replies with neither word are Unknown.
    pub fn parse(raw: &str) -> Self {
        match LABEL_PATTERN.find_iter(raw).last() {
            Some(m) if m.as_str().eq_ignore_ascii_case("against") => StanceLabel::Against,
            Some(_) => StanceLabel::Favor,
            None => StanceLabel::Unknown,
        }
    }
}

impl fmt::Display for StanceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Error, PartialEq)]
#[error("Unrecognized stance label: {0}")]
pub struct ParseStanceLabelError(pub String);

impl FromStr for StanceLabel {
    type Err = ParseStanceLabelError;

    /// Strict parse of a stored label
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "FAVOR" | "FAVOUR" => Ok(StanceLabel::Favor),
            "AGAINST" => Ok(StanceLabel::Against),
            "UNKNOWN" => Ok(StanceLabel::Unknown),
            _ => Err(ParseStanceLabelError(s.to_string())),
        }
    }
}
