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


//! Prompt library for LLM interactions
//!
//! Every prompt is a [`PromptTemplate`]: a named, versioned piece of data with
//! a system instruction, a template with named slots, and an ordered list of
//! worked examples. Strategies differ only in the template they render.

pub mod extract_entities;
pub mod extract_graph;
pub mod few_shot;
pub mod few_shot_context;
pub mod grasp_choq;
pub mod lib;
pub mod models;
pub mod translate;
pub mod zero_shot;

pub use lib::{get_prompt_library, PromptLibrary};
pub use models::{context_from, PromptContext, PromptError, PromptTemplate, WorkedExample};
