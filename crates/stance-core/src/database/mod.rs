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


//! Persistent graph store for extracted knowledge

pub mod config;
pub mod neo4j;
pub mod traits;
pub mod types;

pub use config::DatabaseConfig;
pub use neo4j::Neo4jGraphStore;
pub use traits::{GraphStore, QueryParameter, Statement, StoreOptions, BASE_ENTITY_LABEL};
pub use types::{DatabaseError, DatabaseResult};
