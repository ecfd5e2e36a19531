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


//! Prompt library implementation

use crate::prompts::{
    extract_entities, extract_graph, few_shot, few_shot_context, grasp_choq, models::PromptTemplate,
    translate, zero_shot,
};

/// All prompts used by the pipeline stages
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    pub translate: PromptTemplate,
    pub zero_shot: PromptTemplate,
    pub few_shot: PromptTemplate,
    pub few_shot_context: PromptTemplate,
    pub grasp_choq: PromptTemplate,
    pub extract_graph: PromptTemplate,
    pub extract_entities: PromptTemplate,
}

impl Default for PromptLibrary {
    fn default() -> Self {
        Self {
            translate: translate::template(),
            zero_shot: zero_shot::template(),
            few_shot: few_shot::template(),
            few_shot_context: few_shot_context::template(),
            grasp_choq: grasp_choq::template(),
            extract_graph: extract_graph::template(),
            extract_entities: extract_entities::template(),
        }
    }
}

impl PromptLibrary {
    /// Every template, for listing and inspection
    pub fn all(&self) -> Vec<&PromptTemplate> {
        vec![
            &self.translate,
            &self.zero_shot,
            &self.few_shot,
            &self.few_shot_context,
            &self.grasp_choq,
            &self.extract_graph,
            &self.extract_entities,
        ]
    }
}

/// Get the default prompt library instance
pub fn get_prompt_library() -> PromptLibrary {
    PromptLibrary::default()
}
