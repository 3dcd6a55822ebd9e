// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Sub-Agent as Tool (spec §4.10): wraps an [`AgentDefinition`] so it can be
//! registered in a parent [`ToolRegistry`] like any adapter. `execute`
//! builds a fresh [`AgentExecutor`] over a registry scoped to the
//! sub-agent's own `allowed_tools`.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::application::executor::AgentExecutor;
use crate::application::llm_client::LLMClient;
use crate::application::tool_registry::{Tool, ToolRegistry};
use crate::domain::adapter::{AdapterInfo, AdapterResult};
use crate::domain::agent::AgentDefinition;

/// Input key the planner sub-agent receives the parent's tool catalogue
/// under — the planner plans for the parent's toolset, not its own (spec
/// §4.10).
const EXECUTOR_TOOLS_INPUT: &str = "executor_tools";

pub struct SubAgentTool {
    definition: AgentDefinition,
    llm: Arc<LLMClient>,
    /// The full parent registry; scoped down at execute time to the
    /// sub-agent's `allowed_tools` so the child never sees more than it
    /// declared.
    parent_tools: ToolRegistry,
}

impl SubAgentTool {
    pub fn new(definition: AgentDefinition, llm: Arc<LLMClient>, parent_tools: ToolRegistry) -> Self {
        Self { definition, llm, parent_tools }
    }
}

#[async_trait]
impl Tool for SubAgentTool {
    fn name(&self) -> &str {
        &self.definition.name
    }

    fn description(&self) -> &str {
        &self.definition.description
    }

    async fn execute(&self, params: Value) -> AdapterResult {
        let scoped = self.parent_tools.scoped(&self.definition.allowed_tools);

        let mut inputs: HashMap<String, Value> = match params {
            Value::Object(ref map) => map.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
            _ => HashMap::new(),
        };

        if self.definition.is_planner() {
            inputs
                .entry(EXECUTOR_TOOLS_INPUT.to_string())
                .or_insert_with(|| Value::String(self.parent_tools.describe_all()));
        }

        let query = match self.definition.render_initial_query(&inputs) {
            Ok(q) => q,
            Err(e) => return AdapterResult::error(e.to_string()),
        };

        let mut executor = match AgentExecutor::new(self.definition.clone(), self.llm.clone(), scoped) {
            Ok(e) => e,
            Err(e) => return AdapterResult::error(e.to_string()),
        };

        match executor.run(query).await {
            Ok(value) => AdapterResult::success(value),
            Err(e) => AdapterResult::error(e.to_string()),
        }
    }

    fn get_info(&self) -> AdapterInfo {
        AdapterInfo {
            name: self.definition.name.clone(),
            version: "0.1.0".to_string(),
            description: self.definition.description.clone(),
            capabilities: self.definition.allowed_tools.clone(),
            requirements: vec![],
            example_usage: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{FinishReason, GenerationOptions, GenerationResponse, LLMError, LLMProvider, TokenUsage};
    use async_trait::async_trait;

    struct StubProvider(&'static str);

    #[async_trait]
    impl LLMProvider for StubProvider {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<GenerationResponse, LLMError> {
            Ok(GenerationResponse {
                text: self.0.to_string(),
                usage: TokenUsage::default(),
                provider: "stub".to_string(),
                model: "stub".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }
        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    fn planner_def() -> AgentDefinition {
        AgentDefinition {
            name: "planner_agent".to_string(),
            description: "plans the next scan steps".to_string(),
            inputs: HashMap::from([(
                EXECUTOR_TOOLS_INPUT.to_string(),
                crate::domain::agent::AgentInputSpec {
                    description: "parent tool catalogue".to_string(),
                    r#type: "string".to_string(),
                    required: true,
                },
            )]),
            output: Some(crate::domain::agent::AgentOutputSpec {
                name: "final_answer".to_string(),
                description: "the plan".to_string(),
                schema: serde_json::json!({"type": "object"}),
            }),
            allowed_tools: vec![],
            system_prompt: "You plan scans for the parent agent's toolset.".to_string(),
            initial_query_template: "Tools available to the parent: ${executor_tools}".to_string(),
        }
    }

    #[tokio::test]
    async fn planner_receives_injected_tool_catalogue() {
        let reply = r#"{"tool":"complete_task","parameters":{"final_answer":{"ok":true}},"rationale":"done"}"#;
        let llm = Arc::new(LLMClient::new(Arc::new(StubProvider(reply))));

        let mut parent_tools = ToolRegistry::new();
        struct Whois;
        #[async_trait]
        impl Tool for Whois {
            fn name(&self) -> &str {
                "whois"
            }
            fn description(&self) -> &str {
                "whois lookup"
            }
            async fn execute(&self, params: Value) -> AdapterResult {
                AdapterResult::success(params)
            }
            fn get_info(&self) -> AdapterInfo {
                AdapterInfo {
                    name: "whois".to_string(),
                    version: "0.1.0".to_string(),
                    description: "whois lookup".to_string(),
                    capabilities: vec![],
                    requirements: vec![],
                    example_usage: None,
                }
            }
        }
        parent_tools.register(Arc::new(Whois));

        let sub_agent = SubAgentTool::new(planner_def(), llm, parent_tools);
        let result = sub_agent.execute(serde_json::json!({})).await;
        assert_eq!(result.status, crate::domain::adapter::AdapterStatus::Success);
    }
}
