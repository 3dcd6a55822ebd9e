// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The Agent Executor (spec §4.9): a bounded action/observation loop
//! driving a language model through a `ToolRegistry`, one LLM call and one
//! tool dispatch per turn, until it emits `complete_task` or the turn
//! budget runs out.

use std::sync::Arc;

use serde_json::Value;

use crate::application::json_extract::extract_first_json_object;
use crate::application::llm_client::{LLMClient, LLMClientError};
use crate::application::tool_registry::ToolRegistry;
use crate::domain::agent::AgentDefinition;
use crate::domain::conversation::{ConversationHistory, ConversationMessage};
use crate::domain::events::ExecutorActivityEvent;
use crate::domain::llm::GenerationOptions;

const DEFAULT_TURN_BUDGET: u32 = 15;
const TOOL_OUTPUT_BUDGET: usize = 2000;
const COMPLETE_TASK: &str = "complete_task";

#[derive(Debug, thiserror::Error)]
pub enum ExecutorError {
    #[error("turn budget of {0} exhausted without completion")]
    TurnBudgetExhausted(u32),

    #[error("agent definition invalid: {0}")]
    AgentDefinition(#[from] crate::domain::agent::AgentDefinitionError),

    #[error(transparent)]
    Llm(#[from] LLMClientError),

    #[error("completion is missing declared output field {0:?}")]
    MissingOutputField(String),
}

/// Observes an executor run without participating in it. The default
/// no-op sink lets callers skip instrumentation entirely.
pub trait ActivitySink: Send + Sync {
    fn emit(&self, event: ExecutorActivityEvent);
}

pub struct NullActivitySink;

impl ActivitySink for NullActivitySink {
    fn emit(&self, _event: ExecutorActivityEvent) {}
}

/// The JSON shape every assistant turn must conform to (spec §6's
/// "Action protocol").
#[derive(Debug, Clone, serde::Deserialize)]
struct Action {
    #[serde(default)]
    tool: Value,
    #[serde(default)]
    parameters: Value,
    #[serde(default)]
    #[allow(dead_code)]
    rationale: String,
}

fn tool_name_is_valid(tool: &Value) -> Option<&str> {
    match tool {
        Value::String(s) if !s.is_empty() && s != "none" => Some(s.as_str()),
        _ => None,
    }
}

/// Drives one [`AgentDefinition`] through its loop. Built fresh per run —
/// conversation history is never shared across concurrent invocations
/// (spec §5).
pub struct AgentExecutor {
    definition: AgentDefinition,
    llm: Arc<LLMClient>,
    tools: ToolRegistry,
    turn_budget: u32,
    history: ConversationHistory,
    sink: Arc<dyn ActivitySink>,
}

impl AgentExecutor {
    pub fn new(definition: AgentDefinition, llm: Arc<LLMClient>, tools: ToolRegistry) -> Result<Self, ExecutorError> {
        definition.validate()?;
        Ok(Self {
            definition,
            llm,
            tools,
            turn_budget: DEFAULT_TURN_BUDGET,
            history: ConversationHistory::new(40),
            sink: Arc::new(NullActivitySink),
        })
    }

    pub fn with_turn_budget(mut self, turn_budget: u32) -> Self {
        self.turn_budget = turn_budget;
        self
    }

    pub fn with_sink(mut self, sink: Arc<dyn ActivitySink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn with_history(mut self, history: ConversationHistory) -> Self {
        self.history = history;
        self
    }

    fn system_prompt(&self) -> String {
        let catalogue = self.tools.describe_all();
        let output_field = self
            .definition
            .output
            .as_ref()
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "result".to_string());
        format!(
            "{prompt}\n\n\
             Available tools:\n{catalogue}\n\
             complete_task: signals you are done; parameters must contain the key {output_field:?}.\n\n\
             Respond with exactly one JSON object of the form \
             {{\"tool\": <name>, \"parameters\": {{...}}, \"rationale\": <why>}} and nothing else.\n\n\
             Example:\n\
             {{\"tool\": \"whois\", \"parameters\": {{\"target\": \"example.com\"}}, \"rationale\": \"gather registration data\"}}\n\
             {{\"tool\": \"complete_task\", \"parameters\": {{{output_field:?}: ...}}, \"rationale\": \"investigation complete\"}}",
            prompt = self.definition.system_prompt,
        )
    }

    /// Runs the loop to completion, returning the `complete_task`
    /// parameters object (spec §4.9).
    pub async fn run(&mut self, initial_query: String) -> Result<Value, ExecutorError> {
        if self.history.is_empty() {
            self.history.push(ConversationMessage::system(self.system_prompt()));
        }
        self.history.push(ConversationMessage::user(initial_query));

        for turn in 0..self.turn_budget {
            let reply = self.llm.generate(&self.history, &GenerationOptions::default()).await?;
            self.sink.emit(ExecutorActivityEvent::Thinking { turn, content: reply.clone() });
            self.history.push(ConversationMessage::assistant(reply.clone()));

            let parsed = extract_first_json_object(&reply).and_then(|v| serde_json::from_value::<Action>(v).ok());

            let Some(action) = parsed else {
                self.sink.emit(ExecutorActivityEvent::Warning {
                    turn,
                    message: "non-JSON or malformed action".to_string(),
                });
                self.history.push(ConversationMessage::user(
                    "Respond with valid JSON only; do not apologize. \
                     Your reply must be exactly one object: {\"tool\": <name>, \"parameters\": {...}, \"rationale\": <why>}."
                        .to_string(),
                ));
                continue;
            };

            let Some(tool_name) = tool_name_is_valid(&action.tool) else {
                self.history.push(ConversationMessage::user(format!(
                    "The \"tool\" field was missing, null, or \"none\". Valid tools: {}, complete_task.",
                    self.tools.names().join(", ")
                )));
                continue;
            };

            if tool_name == COMPLETE_TASK {
                let output_field = self
                    .definition
                    .output
                    .as_ref()
                    .map(|o| o.name.clone())
                    .unwrap_or_else(|| "result".to_string());
                match action.parameters.get(&output_field) {
                    Some(_) => {
                        self.sink.emit(ExecutorActivityEvent::Answer { turn, output: action.parameters.clone() });
                        return Ok(action.parameters.clone());
                    }
                    None => {
                        self.history.push(ConversationMessage::user(format!(
                            "complete_task is missing the required output field {output_field:?}. Try again."
                        )));
                        continue;
                    }
                }
            }

            self.sink.emit(ExecutorActivityEvent::ToolCall {
                turn,
                tool: tool_name.to_string(),
                parameters: action.parameters.clone(),
            });

            match self.tools.get(tool_name) {
                Some(tool) => {
                    let result = tool.execute(action.parameters).await;
                    let mut rendered = serde_json::to_string(&result).unwrap_or_default();
                    if rendered.len() > TOOL_OUTPUT_BUDGET {
                        rendered.truncate(TOOL_OUTPUT_BUDGET);
                        rendered.push_str("…[truncated]");
                    }
                    self.sink.emit(ExecutorActivityEvent::ToolResult {
                        turn,
                        tool: tool_name.to_string(),
                        output: rendered.clone(),
                    });
                    self.history.push(ConversationMessage::user(format!("[{tool_name}] {rendered}")));
                }
                None => {
                    self.history.push(ConversationMessage::user(format!(
                        "Unknown tool {tool_name:?}. Valid tools: {}, complete_task.",
                        self.tools.names().join(", ")
                    )));
                }
            }
        }

        Err(ExecutorError::TurnBudgetExhausted(self.turn_budget))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adapter::{AdapterInfo, AdapterResult};
    use crate::domain::llm::{FinishReason, GenerationResponse, LLMError, LLMProvider, TokenUsage};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;

    struct ScriptedProvider {
        replies: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LLMProvider for ScriptedProvider {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<GenerationResponse, LLMError> {
            let mut replies = self.replies.lock();
            let text = if replies.is_empty() { "{}".to_string() } else { replies.remove(0) };
            Ok(GenerationResponse {
                text,
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

    struct PublicIp;

    #[async_trait]
    impl crate::application::tool_registry::Tool for PublicIp {
        fn name(&self) -> &str {
            "public_ip"
        }
        fn description(&self) -> &str {
            "returns the caller's public IP"
        }
        async fn execute(&self, _params: Value) -> AdapterResult {
            AdapterResult::success(serde_json::json!({"ip": "1.2.3.4"}))
        }
        fn get_info(&self) -> AdapterInfo {
            AdapterInfo {
                name: "public_ip".to_string(),
                version: "0.1.0".to_string(),
                description: "returns the caller's public IP".to_string(),
                capabilities: vec![],
                requirements: vec![],
                example_usage: None,
            }
        }
    }

    fn recon_agent() -> AgentDefinition {
        AgentDefinition {
            name: "recon_agent".to_string(),
            description: "looks up the public ip".to_string(),
            inputs: HashMap::new(),
            output: Some(crate::domain::agent::AgentOutputSpec {
                name: "final_answer".to_string(),
                description: "the answer".to_string(),
                schema: serde_json::json!({"type": "object"}),
            }),
            allowed_tools: vec!["public_ip".to_string()],
            system_prompt: "You investigate the caller's public IP.".to_string(),
            initial_query_template: "Find the public IP.".to_string(),
        }
    }

    #[tokio::test]
    async fn happy_path_completes_in_two_turns() {
        let provider = ScriptedProvider {
            replies: Mutex::new(vec![
                r#"{"tool":"public_ip","parameters":{},"rationale":"look it up"}"#.to_string(),
                r#"{"tool":"complete_task","parameters":{"final_answer":{"answer":"1.2.3.4"}},"rationale":"done"}"#
                    .to_string(),
            ]),
        };
        let llm = Arc::new(LLMClient::new(Arc::new(provider)));
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(PublicIp));

        let mut executor = AgentExecutor::new(recon_agent(), llm, registry).unwrap();
        let result = executor.run("Find the public IP.".to_string()).await.unwrap();
        assert_eq!(result["final_answer"]["answer"], "1.2.3.4");
    }

    #[tokio::test]
    async fn non_json_reply_triggers_correction_then_succeeds() {
        let provider = ScriptedProvider {
            replies: Mutex::new(vec![
                "Sorry, I cannot help with that.".to_string(),
                r#"{"tool":"complete_task","parameters":{"final_answer":{"answer":"ok"}},"rationale":"done"}"#
                    .to_string(),
            ]),
        };
        let llm = Arc::new(LLMClient::new(Arc::new(provider)));
        let registry = ToolRegistry::new();
        let mut executor = AgentExecutor::new(recon_agent(), llm, registry).unwrap();
        let result = executor.run("Find the public IP.".to_string()).await.unwrap();
        assert_eq!(result["final_answer"]["answer"], "ok");
    }

    #[tokio::test]
    async fn exhausted_turn_budget_is_an_error() {
        let provider = ScriptedProvider { replies: Mutex::new(vec![]) };
        let llm = Arc::new(LLMClient::new(Arc::new(provider)));
        let registry = ToolRegistry::new();
        let mut executor = AgentExecutor::new(recon_agent(), llm, registry)
            .unwrap()
            .with_turn_budget(1);
        let result = executor.run("Find the public IP.".to_string()).await;
        assert!(matches!(result, Err(ExecutorError::TurnBudgetExhausted(1))));
    }
}
