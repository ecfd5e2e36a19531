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


use thiserror::Error;

use crate::database::DatabaseError;
use crate::prompts::PromptError;

/// Base error type for pipeline stage operations
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Column {column} not found")]
    ColumnNotFound { column: String },

    #[error("Row {row} has {found} cells, expected {expected}")]
    RaggedRow {
        row: usize,
        found: usize,
        expected: usize,
    },

    #[error("Content source error: {message}")]
    ContentSource { message: String },

    #[error("Graph extraction error: {message}")]
    Extraction { message: String },

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<sled::Error> for PipelineError {
    fn from(err: sled::Error) -> Self {
        PipelineError::Cache(err.to_string())
    }
}

/// Completion service error types
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Rate limit exceeded. Please try again later.")]
    RateLimit,

    #[error("LLM refused to generate a response: {message}")]
    Refusal { message: String },

    #[error("LLM returned an empty response: {message}")]
    EmptyResponse { message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication error: {message}")]
    Authentication { message: String },

    #[error("Service error (HTTP {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Invalid model configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Timeout error: {message}")]
    Timeout { message: String },
}

impl LlmError {
    /// Whether a retry has a reasonable chance of succeeding
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RateLimit | LlmError::Timeout { .. } => true,
            LlmError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LlmError::Service { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

/// Result type alias for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type alias for LLM operations
pub type LlmResult<T> = Result<T, LlmError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(LlmError::RateLimit.is_transient());
        assert!(LlmError::Timeout {
            message: "slow".to_string()
        }
        .is_transient());
        assert!(LlmError::Service {
            status: 503,
            message: "unavailable".to_string()
        }
        .is_transient());
        assert!(!LlmError::Service {
            status: 400,
            message: "bad request".to_string()
        }
        .is_transient());
        assert!(!LlmError::Refusal {
            message: "no".to_string()
        }
        .is_transient());
    }

    #[test]
    fn test_column_error_message() {
        let err = PipelineError::ColumnNotFound {
            column: "Content".to_string(),
        };
        assert_eq!(err.to_string(), "Column Content not found");
    }
}
