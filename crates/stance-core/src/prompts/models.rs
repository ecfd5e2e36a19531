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


//! Core prompt models and rendering

use std::collections::HashMap;

use serde_json::Value;
use thiserror::Error;

use crate::llm_client::Message;

/// Context type for prompts: slot name to value
pub type PromptContext = HashMap<String, Value>;

/// Placeholder that expands to the rendered worked examples
pub const EXAMPLES_PLACEHOLDER: &str = "examples";

#[derive(Debug, Error, PartialEq)]
pub enum PromptError {
    #[error("Prompt {template} is missing a value for slot {slot}")]
    MissingSlot { template: String, slot: String },

    #[error("Prompt {template} has no slot named {slot}")]
    UnknownSlot { template: String, slot: String },
}

/// One worked example: ordered `label: value` lines
#[derive(Debug, Clone, PartialEq)]
pub struct WorkedExample {
    pub fields: Vec<(&'static str, &'static str)>,
}

impl WorkedExample {
    pub fn new(fields: Vec<(&'static str, &'static str)>) -> Self {
        Self { fields }
    }

    fn render(&self) -> String {
        self.fields
            .iter()
            .map(|(label, value)| format!("{}: {}", label, value))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A parametrized prompt with named slots and embedded worked examples
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    pub name: &'static str,
    pub version: &'static str,
    pub system: Option<&'static str>,
    pub template: &'static str,
    pub examples: Vec<WorkedExample>,
    /// Separator placed between rendered examples
    pub example_separator: &'static str,
    pub slots: &'static [&'static str],
}

impl PromptTemplate {
    /// Render the user prompt text, filling every slot exactly once
    pub fn render_text(&self, context: &PromptContext) -> Result<String, PromptError> {
        if let Some(unknown) = context.keys().find(|k| !self.slots.contains(&k.as_str())) {
            return Err(PromptError::UnknownSlot {
                template: self.name.to_string(),
                slot: unknown.clone(),
            });
        }

        let mut values: HashMap<&str, String> = HashMap::with_capacity(self.slots.len() + 1);
        for slot in self.slots {
            let value = context.get(*slot).ok_or_else(|| PromptError::MissingSlot {
                template: self.name.to_string(),
                slot: slot.to_string(),
            })?;
            values.insert(*slot, value_to_text(value));
        }
        values.insert(EXAMPLES_PLACEHOLDER, self.render_examples());

        Ok(substitute(self.template, &values))
    }

    /// Render the full message list (system instruction first, if any)
    pub fn render(&self, context: &PromptContext) -> Result<Vec<Message>, PromptError> {
        let user_prompt = self.render_text(context)?;
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = self.system {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(user_prompt));
        Ok(messages)
    }

    fn render_examples(&self) -> String {
        self.examples
            .iter()
            .map(WorkedExample::render)
            .collect::<Vec<_>>()
            .join(self.example_separator)
    }
}

/// Build a prompt context from `(slot, text)` pairs
pub fn context_from<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> PromptContext {
    pairs
        .into_iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect()
}

fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => serde_json::to_string_pretty(other).unwrap_or_default(),
    }
}

/// Single pass over the template; substituted values are never re-scanned
fn substitute(template: &str, values: &HashMap<&str, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) if values.contains_key(&after[..close]) => {
                out.push_str(&values[&after[..close]]);
                rest = &after[close + 1..];
            }
            _ => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    out
}
