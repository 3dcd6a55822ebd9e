// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Agent definitions (spec §3): the minimal description an Agent Executor
//! needs to drive a language model through the action loop — name,
//! description, declared inputs/output, the tools it may call, and its
//! prompt.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentInputSpec {
    pub description: String,
    #[serde(default = "default_input_type")]
    pub r#type: String,
    #[serde(default = "default_true")]
    pub required: bool,
}

fn default_input_type() -> String {
    "string".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentOutputSpec {
    pub name: String,
    pub description: String,
    /// JSON Schema describing the shape of the completion value. Rust has
    /// no runtime-dynamic class equivalent to the original's Pydantic
    /// model, so this is modeled as a schema document.
    pub schema: Value,
}

/// The minimal agent shape an [`crate::application::executor::AgentExecutor`]
/// drives (spec §3, §4.9). Grounded on `definitions.py`'s `AgentDefinition`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub inputs: HashMap<String, AgentInputSpec>,
    #[serde(default)]
    pub output: Option<AgentOutputSpec>,
    pub allowed_tools: Vec<String>,
    pub system_prompt: String,
    pub initial_query_template: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AgentDefinitionError {
    #[error("agent definition requires a non-empty name")]
    MissingName,
    #[error("agent definition requires a non-empty system prompt")]
    MissingSystemPrompt,
    #[error("missing required input: {0}")]
    MissingRequiredInput(String),
}

impl AgentDefinition {
    pub fn validate(&self) -> Result<(), AgentDefinitionError> {
        if self.name.trim().is_empty() {
            return Err(AgentDefinitionError::MissingName);
        }
        if self.system_prompt.trim().is_empty() {
            return Err(AgentDefinitionError::MissingSystemPrompt);
        }
        Ok(())
    }

    /// Naive `${key}` substitution templating over `initial_query_template`,
    /// matching `executor.py`'s `_template_query`.
    pub fn render_initial_query(&self, inputs: &HashMap<String, Value>) -> Result<String, AgentDefinitionError> {
        let mut rendered = self.initial_query_template.clone();
        for (name, spec) in &self.inputs {
            let placeholder = format!("${{{name}}}");
            if !rendered.contains(&placeholder) {
                continue;
            }
            match inputs.get(name) {
                Some(value) => {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    rendered = rendered.replace(&placeholder, &text);
                }
                None if spec.required => return Err(AgentDefinitionError::MissingRequiredInput(name.clone())),
                None => {}
            }
        }
        Ok(rendered)
    }

    pub fn is_planner(&self) -> bool {
        self.name == "planner_agent"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn def() -> AgentDefinition {
        AgentDefinition {
            name: "recon_agent".to_string(),
            description: "runs passive recon".to_string(),
            inputs: HashMap::from([(
                "target".to_string(),
                AgentInputSpec { description: "target host".to_string(), r#type: "string".to_string(), required: true },
            )]),
            output: None,
            allowed_tools: vec!["whois".to_string()],
            system_prompt: "You are a recon agent.".to_string(),
            initial_query_template: "Investigate ${target}".to_string(),
        }
    }

    #[test]
    fn renders_template_with_provided_input() {
        let d = def();
        let mut inputs = HashMap::new();
        inputs.insert("target".to_string(), Value::String("example.com".to_string()));
        assert_eq!(d.render_initial_query(&inputs).unwrap(), "Investigate example.com");
    }

    #[test]
    fn missing_required_input_errors() {
        let d = def();
        assert!(d.render_initial_query(&HashMap::new()).is_err());
    }

    #[test]
    fn planner_name_is_special_cased() {
        let mut d = def();
        d.name = "planner_agent".to_string();
        assert!(d.is_planner());
    }
}
