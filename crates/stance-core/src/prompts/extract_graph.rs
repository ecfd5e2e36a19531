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


//! Knowledge-graph extraction prompt

use serde::{Deserialize, Serialize};

use crate::prompts::models::PromptTemplate;

/// Node candidate returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub node_type: String,
}

/// Relationship candidate returned by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRelationship {
    pub source: String,
    #[serde(default)]
    pub source_type: String,
    pub target: String,
    #[serde(default)]
    pub target_type: String,
    #[serde(rename = "type")]
    pub relation_type: String,
}

/// Full extraction response
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedGraph {
    #[serde(default)]
    pub nodes: Vec<ExtractedNode>,
    #[serde(default)]
    pub relationships: Vec<ExtractedRelationship>,
}

const SYSTEM_PROMPT: &str = r#"You are a top-tier algorithm designed for extracting information in structured formats to build a knowledge graph.
Capture as much information from the text as possible without sacrificing accuracy. Do not add any information that is not explicitly mentioned in the text.
- Nodes represent entities and concepts. Node ids are human-readable names as found in the text, never integers.
- Node types are basic, general labels such as "Person", "Organization", "Location", "Event", "Concept". Use "Person" for every person, never "Mathematician" or "Politician".
- Relationship types are general and timeless, written in UPPER_SNAKE_CASE, such as "MEMBER_OF" or "LEADER_OF".
- Coreference: always refer to an entity by its most complete identifier, even when the text uses a pronoun or a shorter name.
Adhere to these rules strictly. Non-compliance will result in termination."#;

const TEMPLATE: &str = r#"Tip: Make sure to answer in the correct format and do not include any explanations.
Respond with a single JSON object of the form
{"nodes": [{"id": "...", "type": "..."}], "relationships": [{"source": "...", "source_type": "...", "target": "...", "target_type": "...", "type": "..."}]}

Use the given format to extract information from the following input: {input}"#;

pub fn template() -> PromptTemplate {
    PromptTemplate {
        name: "extract_graph",
        version: "1",
        system: Some(SYSTEM_PROMPT),
        template: TEMPLATE,
        examples: Vec::new(),
        example_separator: "\n\n",
        slots: &["input"],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompts::models::context_from;

    #[test]
    fn test_schema_braces_survive_rendering() {
        let text = template()
            .render_text(&context_from([("input", "Sheikh Hasina leads the Awami League.")]))
            .unwrap();
        assert!(text.contains(r#"{"nodes": [{"id": "...", "type": "..."}]"#));
        assert!(text.ends_with("input: Sheikh Hasina leads the Awami League."));
    }

    #[test]
    fn test_response_parsing_with_missing_fields() {
        let raw = r#"{"nodes": [{"id": "Sheikh Hasina", "type": "Person"}, {"id": "Awami League"}],
                      "relationships": [{"source": "Sheikh Hasina", "target": "Awami League", "type": "LEADER_OF"}]}"#;
        let graph: ExtractedGraph = serde_json::from_str(raw).unwrap();
        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.nodes[1].node_type, "");
        assert_eq!(graph.relationships[0].relation_type, "LEADER_OF");
    }
}
