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


//! Graph store connection settings

use serde::{Deserialize, Serialize};
use validator::Validate;

pub const DEFAULT_URI: &str = "bolt://localhost:7687";
pub const DEFAULT_USER: &str = "neo4j";
pub const DEFAULT_DATABASE: &str = "neo4j";

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DatabaseConfig {
    #[validate(length(min = 1))]
    pub uri: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub database: Option<String>,
    #[validate(range(min = 1))]
    pub pool_size: Option<usize>,
}

impl DatabaseConfig {
    pub fn neo4j(uri: String, username: String, password: String) -> Self {
        Self {
            uri,
            username: Some(username),
            password: Some(password),
            database: Some(DEFAULT_DATABASE.to_string()),
            pool_size: None,
        }
    }

    pub fn with_database(mut self, database: String) -> Self {
        self.database = Some(database);
        self
    }

    pub fn with_pool_size(mut self, pool_size: usize) -> Self {
        self.pool_size = Some(pool_size);
        self
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self::neo4j(
            DEFAULT_URI.to_string(),
            DEFAULT_USER.to_string(),
            "password".to_string(),
        )
    }
}
