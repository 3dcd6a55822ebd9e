// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The LLM Client (spec §4.8): a thin, provider-agnostic facade over an
//! [`LLMProvider`] that adds the two structured-envelope operations the rest
//! of the system needs — planning the next scan steps and summarizing
//! findings — plus an optional [`RetrievalStore`] consultation.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::json_extract::extract_first_json_object;
use crate::domain::conversation::{ConversationHistory, ConversationMessage};
use crate::domain::llm::{GenerationOptions, LLMError, LLMProvider, RetrievalStore};

#[derive(Debug, thiserror::Error)]
pub enum LLMClientError {
    #[error(transparent)]
    Provider(#[from] LLMError),

    #[error("model response was not valid JSON after extraction: {0}")]
    MalformedEnvelope(String),
}

/// One proposed scan step, as decoded from the planner's JSON envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannedStep {
    pub tool: String,
    pub target: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub rationale: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PlanEnvelope {
    #[serde(default)]
    scan_plan: Vec<PlannedStep>,
}

#[derive(Debug, Clone, Deserialize)]
struct AnalysisEnvelope {
    #[serde(default)]
    summary: String,
    #[serde(default)]
    findings: Vec<Value>,
}

/// Result of [`LLMClient::analyze_findings`]: a free-text summary plus the
/// raw finding envelopes, left undecoded here since `domain::finding`'s
/// `RawFinding` owns that shape.
#[derive(Debug, Clone)]
pub struct FindingsAnalysis {
    pub summary: String,
    pub raw_findings: Vec<Value>,
}

const PLANNER_CONTRACT: &str = "Respond with a single JSON object of the form \
{\"scan_plan\": [{\"tool\": <adapter name>, \"target\": <target>, \"parameters\": {}, \"rationale\": <why>}]} \
and nothing else. No prose before or after the object.";

const ANALYST_CONTRACT: &str = "Respond with a single JSON object of the form \
{\"summary\": <one paragraph>, \"findings\": [{\"title\": ..., \"severity\": ..., \"description\": ..., \
\"category\": ..., \"affected_resource\": ..., \"remediation\": ...}]} and nothing else.";

/// Thin wrapper the Agent Executor and Orchestrator both hold an `Arc` of.
/// Owns no mutable state of its own beyond what's passed in by callers —
/// conversation history belongs to whoever is driving a multi-turn exchange.
pub struct LLMClient {
    provider: Arc<dyn LLMProvider>,
    retrieval: Option<Arc<dyn RetrievalStore>>,
}

impl LLMClient {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self { provider, retrieval: None }
    }

    pub fn with_retrieval(mut self, retrieval: Arc<dyn RetrievalStore>) -> Self {
        self.retrieval = Some(retrieval);
        self
    }

    /// Plain passthrough generation, used by the Agent Executor's turn
    /// loop which manages its own conversation history and prompt
    /// assembly.
    pub async fn generate(
        &self,
        history: &ConversationHistory,
        options: &GenerationOptions,
    ) -> Result<String, LLMClientError> {
        let prompt = history.render();
        let response = self.provider.generate(&prompt, options).await?;
        Ok(response.text)
    }

    /// If a retrieval store is configured, queries it and renders the top
    /// results as a context block; otherwise returns an empty string so
    /// callers can unconditionally append it to a prompt (spec §4.8:
    /// "no-op if absent").
    async fn retrieval_context(&self, query: &str) -> String {
        let Some(store) = &self.retrieval else {
            return String::new();
        };
        match store.query(query, 3).await {
            Ok(docs) if !docs.is_empty() => {
                let rendered = docs
                    .iter()
                    .map(|d| format!("- ({:.2}) {}", d.score, d.content))
                    .collect::<Vec<_>>()
                    .join("\n");
                format!("\n\nRelevant prior context:\n{rendered}")
            }
            Ok(_) => String::new(),
            Err(e) => {
                tracing::warn!(error = %e, "retrieval store query failed, continuing without context");
                String::new()
            }
        }
    }

    /// Asks the model for the next batch of scan steps given everything
    /// learned so far. Returns the decoded plan, or a malformed-envelope
    /// error the caller is expected to fall back from (spec §4.11's
    /// default-plan fallback).
    pub async fn plan_next_steps(
        &self,
        target: &str,
        known_findings_summary: &str,
        lab_mode: bool,
    ) -> Result<Vec<PlannedStep>, LLMClientError> {
        let context = self.retrieval_context(target).await;
        let mode_note = if lab_mode {
            "This is a lab-mode assessment; active and exploit-class tooling is permitted."
        } else {
            "This is a production assessment; stay within passive and low-impact active tooling."
        };
        let mut history = ConversationHistory::new(8);
        history.push(ConversationMessage::system(format!(
            "You are planning the next scan steps for a penetration test. {mode_note} {PLANNER_CONTRACT}"
        )));
        history.push(ConversationMessage::user(format!(
            "Target: {target}\nFindings so far: {known_findings_summary}{context}"
        )));

        let response = self
            .provider
            .generate(&history.render(), &GenerationOptions::default())
            .await?;

        let value = extract_first_json_object(&response.text)
            .ok_or_else(|| LLMClientError::MalformedEnvelope(response.text.clone()))?;
        let envelope: PlanEnvelope = serde_json::from_value(value)
            .map_err(|e| LLMClientError::MalformedEnvelope(e.to_string()))?;
        Ok(envelope.scan_plan)
    }

    /// Asks the model to summarize a batch of raw scan results into a
    /// findings envelope. Returned `raw_findings` are left as [`Value`] for
    /// the caller to decode via `domain::finding::RawFinding`.
    pub async fn analyze_findings(
        &self,
        target: &str,
        raw_results: &[Value],
    ) -> Result<FindingsAnalysis, LLMClientError> {
        let results_text = serde_json::to_string(raw_results).unwrap_or_default();
        let mut history = ConversationHistory::new(8);
        history.push(ConversationMessage::system(format!(
            "You are analyzing scan tool output for security findings. {ANALYST_CONTRACT}"
        )));
        history.push(ConversationMessage::user(format!(
            "Target: {target}\nRaw tool output: {results_text}"
        )));

        let response = self
            .provider
            .generate(&history.render(), &GenerationOptions::default())
            .await?;

        let value = extract_first_json_object(&response.text)
            .ok_or_else(|| LLMClientError::MalformedEnvelope(response.text.clone()))?;
        let envelope: AnalysisEnvelope = serde_json::from_value(value)
            .map_err(|e| LLMClientError::MalformedEnvelope(e.to_string()))?;
        Ok(FindingsAnalysis { summary: envelope.summary, raw_findings: envelope.findings })
    }

    pub async fn health_check(&self) -> Result<(), LLMClientError> {
        self.provider.health_check().await.map_err(LLMClientError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::llm::{FinishReason, GenerationResponse, TokenUsage};
    use async_trait::async_trait;

    struct StubProvider {
        reply: String,
    }

    #[async_trait]
    impl LLMProvider for StubProvider {
        async fn generate(&self, _prompt: &str, _options: &GenerationOptions) -> Result<GenerationResponse, LLMError> {
            Ok(GenerationResponse {
                text: self.reply.clone(),
                usage: TokenUsage { prompt_tokens: 10, completion_tokens: 10, total_tokens: 20 },
                provider: "stub".to_string(),
                model: "stub-model".to_string(),
                finish_reason: FinishReason::Stop,
            })
        }
        async fn health_check(&self) -> Result<(), LLMError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn plan_next_steps_decodes_well_formed_envelope() {
        let reply = r#"{"scan_plan": [{"tool": "nmap", "target": "example.com", "parameters": {}, "rationale": "port sweep"}]}"#;
        let client = LLMClient::new(Arc::new(StubProvider { reply: reply.to_string() }));
        let plan = client.plan_next_steps("example.com", "none yet", true).await.unwrap();
        assert_eq!(plan.len(), 1);
        assert_eq!(plan[0].tool, "nmap");
    }

    #[tokio::test]
    async fn plan_next_steps_errors_on_non_json_reply() {
        let client = LLMClient::new(Arc::new(StubProvider { reply: "I refuse.".to_string() }));
        let result = client.plan_next_steps("example.com", "none yet", false).await;
        assert!(matches!(result, Err(LLMClientError::MalformedEnvelope(_))));
    }

    #[tokio::test]
    async fn analyze_findings_decodes_summary_and_findings() {
        let reply = r#"{"summary": "one issue found", "findings": [{"title": "open port", "severity": "low"}]}"#;
        let client = LLMClient::new(Arc::new(StubProvider { reply: reply.to_string() }));
        let analysis = client.analyze_findings("example.com", &[]).await.unwrap();
        assert_eq!(analysis.summary, "one issue found");
        assert_eq!(analysis.raw_findings.len(), 1);
    }
}
