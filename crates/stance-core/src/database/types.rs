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


//! Graph store error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Could not connect to {uri}: {source}")]
    Connection {
        uri: String,
        #[source]
        source: neo4rs::Error,
    },

    #[error("Failed to store graph document {document}: {source}")]
    Write {
        document: String,
        #[source]
        source: neo4rs::Error,
    },

    #[error("Invalid label or relationship type {0:?}")]
    InvalidIdentifier(String),

    #[error("Neo4j error: {0}")]
    Neo4j(#[from] neo4rs::Error),
}

pub type DatabaseResult<T> = Result<T, DatabaseError>;
