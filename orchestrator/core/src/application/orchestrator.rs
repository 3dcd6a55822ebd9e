// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The Orchestrator (spec §4.11): owns the per-run [`OrchestrationContext`],
//! drives passive recon and planned active scans through the
//! [`PluginManager`]'s single gated `run_adapter`, and assembles reports.
//! The only policy-enforcement chokepoint is the Plugin Manager (spec §9
//! open question, resolved): this module never calls `validate_asset` or
//! `enforce_rate_limits` directly, nor does it pre-check a scan step's
//! target before dispatch — `add_asset`'s intake gate is the one place
//! this module asks the Plugin Manager to authorize a target up front;
//! every scan step's target/rate admission happens solely inside
//! `run_adapter` itself, under the step's real tool name.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::application::llm_client::LLMClient;
use crate::application::plugin_manager::PluginManager;
use crate::domain::asset::Asset;
use crate::domain::finding::{Finding, FindingsEnvelope};
use crate::domain::policy::{PolicyEngine, PolicyViolation};
use crate::domain::workflow::{normalize_adapter_result, OrchestrationContext, ScanResult, WorkflowState, WorkflowStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    Passive,
    Active,
    Lab,
}

impl ScanMode {
    fn as_str(self) -> &'static str {
        match self {
            ScanMode::Passive => "passive",
            ScanMode::Active => "active",
            ScanMode::Lab => "lab",
        }
    }
}

/// The default passive recon tool list (spec §2 supplement).
const DEFAULT_PASSIVE_TOOLS: &[&str] = &["whois", "dns_lookup", "ssl_check"];

/// Deterministic fallback plan keyed by mode, used when LLM planning
/// fails to parse or transport errors out (spec §4.11, scenario 6).
fn default_plan_for(mode: ScanMode, target: &str) -> Vec<WorkflowStep> {
    match mode {
        ScanMode::Passive => DEFAULT_PASSIVE_TOOLS
            .iter()
            .map(|tool| WorkflowStep::new(*tool, target))
            .collect(),
        ScanMode::Active => ["nmap", "sqlmap", "gobuster"]
            .iter()
            .map(|tool| WorkflowStep::new(*tool, target))
            .collect(),
        ScanMode::Lab => ["nmap", "sqlmap", "gobuster", "metasploit"]
            .iter()
            .map(|tool| WorkflowStep::new(*tool, target))
            .collect(),
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("asset rejected by policy engine: {0}")]
    AssetRejected(String),

    #[error("scan step {0} requires approval before execution")]
    ApprovalRequired(String),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ReportFormat {
    Json,
    Markdown,
    Html,
    Csv,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSummary {
    pub asset_count: usize,
    pub result_count: usize,
    pub finding_count: usize,
    pub violation_count: usize,
    pub duration_secs: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub format_hint: String,
    pub summary: ReportSummary,
    pub assets: Vec<Asset>,
    pub results: Vec<ScanResult>,
    pub findings: Vec<Finding>,
    pub violations: Vec<PolicyViolation>,
    pub current_rates: HashMap<String, f64>,
}

/// Owns one assessment run. Not `Clone`; callers hold it behind whatever
/// sharing mechanism their concurrency model needs (spec §5: an
/// Orchestrator instance belongs to one run).
pub struct Orchestrator {
    plugins: Arc<PluginManager>,
    policy: Arc<PolicyEngine>,
    llm: Option<Arc<LLMClient>>,
    context: OrchestrationContext,
}

impl Orchestrator {
    pub fn new(plugins: Arc<PluginManager>, policy: Arc<PolicyEngine>, llm: Option<Arc<LLMClient>>) -> Self {
        Self { plugins, policy, llm, context: OrchestrationContext::default() }
    }

    pub fn context(&self) -> &OrchestrationContext {
        &self.context
    }

    /// Validates and registers an asset. Rejects outright rather than
    /// silently dropping so callers can surface the denial (spec §4.11).
    pub fn add_asset(&mut self, asset: Asset) -> Result<(), OrchestratorError> {
        if !self.plugins.authorize_asset(&asset) {
            return Err(OrchestratorError::AssetRejected(asset.value));
        }
        self.context.assets.insert(asset.name.clone(), asset);
        Ok(())
    }

    /// Runs every configured passive tool against every registered asset.
    /// Continues past individual-step failures; always leaves the workflow
    /// in `completed` state once every asset × tool pair has been attempted
    /// (spec §4.11, scenario 5).
    pub async fn run_passive_recon(&mut self) -> Vec<ScanResult> {
        self.context.transition(WorkflowState::Running);
        let assets: Vec<Asset> = self.context.assets.values().cloned().collect();
        let mut results = Vec::new();

        for asset in &assets {
            for tool in DEFAULT_PASSIVE_TOOLS {
                let step_name = format!("{tool}:{}", asset.value);
                let params = serde_json::json!({"target": asset.value});
                let outcome = self.plugins.run_adapter(tool, params).await;

                if outcome.status == crate::domain::adapter::AdapterStatus::Failure
                    || outcome.status == crate::domain::adapter::AdapterStatus::Error
                {
                    tracing::warn!(tool = %tool, asset = %asset.value, "passive recon step failed, continuing");
                }

                if let Some(scan) = normalize_adapter_result(&step_name, &asset.value, &outcome, Vec::new()) {
                    self.context.completed_steps.push(step_name.clone());
                    self.context.scan_results.push(scan.clone());
                    results.push(scan);
                }
            }
        }

        self.context.transition(WorkflowState::Completed);
        results
    }

    /// Builds a short context summary from prior scan results, suitable
    /// for the planner's prompt.
    fn scan_results_summary(&self) -> String {
        if self.context.scan_results.is_empty() {
            return "no scan results yet".to_string();
        }
        self.context
            .scan_results
            .iter()
            .map(|r| format!("{} -> {} ({} findings)", r.step_name, r.status, r.findings.len()))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Asks the LLM for the next batch of steps; falls back to a
    /// deterministic default plan on any parse or transport failure (spec
    /// §4.11, scenario 6).
    pub async fn plan_active_scans(&self, mode: ScanMode, target: &str) -> Vec<WorkflowStep> {
        let Some(llm) = &self.llm else {
            tracing::info!(mode = mode.as_str(), "no llm client configured, using default plan");
            return default_plan_for(mode, target);
        };

        let summary = self.scan_results_summary();
        let lab_mode = matches!(mode, ScanMode::Lab);
        match llm.plan_next_steps(target, &summary, lab_mode).await {
            Ok(steps) if !steps.is_empty() => steps
                .into_iter()
                .map(|s| WorkflowStep {
                    name: format!("{}:{}", s.tool, s.target),
                    description: s.rationale.clone(),
                    tool: s.tool,
                    target: s.target,
                    parameters: s.parameters,
                    priority: 0,
                    rationale: Some(s.rationale),
                })
                .collect(),
            Ok(_) => {
                tracing::warn!(mode = mode.as_str(), "planner returned an empty plan, using default");
                default_plan_for(mode, target)
            }
            Err(e) => {
                tracing::warn!(mode = mode.as_str(), error = %e, "planner failed, using default plan");
                default_plan_for(mode, target)
            }
        }
    }

    /// Executes one planned step. `approval_required` is auto-bypassed in
    /// `lab` mode, matching the scan mode's looser posture (spec §4.11).
    pub async fn execute_scan_step(
        &mut self,
        step: WorkflowStep,
        approval_required: bool,
        mode: ScanMode,
        approved: bool,
    ) -> Result<Option<ScanResult>, OrchestratorError> {
        if approval_required && !matches!(mode, ScanMode::Lab) && !approved {
            return Err(OrchestratorError::ApprovalRequired(step.name.clone()));
        }

        let mut params = step.parameters.clone();
        if let Value::Object(map) = &mut params {
            map.entry("target").or_insert_with(|| Value::String(step.target.clone()));
        }

        let outcome = self.plugins.run_adapter(&step.tool, params).await;

        let findings = if outcome.status == crate::domain::adapter::AdapterStatus::Success {
            self.extract_findings(&step.target, &outcome.data).await
        } else {
            Vec::new()
        };

        let scan = normalize_adapter_result(&step.name, &step.target, &outcome, findings);
        if let Some(scan) = &scan {
            self.context.completed_steps.push(step.name.clone());
            self.context.scan_results.push(scan.clone());
        }
        Ok(scan)
    }

    /// Best-effort LLM finding extraction over one adapter's raw output.
    /// Failures are swallowed: a successful scan step must still
    /// materialize a `ScanResult` even if the analyst call fails.
    async fn extract_findings(&self, target: &str, raw_output: &Value) -> Vec<Finding> {
        let Some(llm) = &self.llm else {
            return Vec::new();
        };
        match llm.analyze_findings(target, std::slice::from_ref(raw_output)).await {
            Ok(analysis) => {
                let envelope: FindingsEnvelope = serde_json::from_value(serde_json::json!({"findings": analysis.raw_findings}))
                    .unwrap_or(FindingsEnvelope { findings: vec![] });
                envelope.findings.into_iter().map(|f| f.into_finding(target)).collect()
            }
            Err(e) => {
                tracing::warn!(target = %target, error = %e, "finding extraction failed, recording zero findings");
                Vec::new()
            }
        }
    }

    pub fn generate_report(&self, format: ReportFormat) -> Report {
        let findings: Vec<Finding> = self.context.scan_results.iter().flat_map(|r| r.findings.clone()).collect();
        let violations = self.policy.get_violation_report();
        let mut tool_names: Vec<&str> = self
            .context
            .scan_results
            .iter()
            .filter_map(|r| r.step_name.split(':').next())
            .collect();
        tool_names.sort();
        tool_names.dedup();
        let current_rates = self.policy.get_current_rates(&tool_names);
        let duration_secs = self
            .context
            .end_time
            .map(|end| (end - self.context.start_time).num_milliseconds() as f64 / 1000.0);

        Report {
            format_hint: format!("{format:?}").to_lowercase(),
            summary: ReportSummary {
                asset_count: self.context.assets.len(),
                result_count: self.context.scan_results.len(),
                finding_count: findings.len(),
                violation_count: violations.len(),
                duration_secs,
            },
            assets: self.context.assets.values().cloned().collect(),
            results: self.context.scan_results.clone(),
            findings,
            violations,
            current_rates,
        }
    }

    /// Idempotent: unloads cached adapters and resets in-run state. Calling
    /// twice in a row is equivalent to calling once (spec §8).
    pub fn cleanup(&mut self) {
        self.plugins.cleanup();
        self.context = OrchestrationContext::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adapter::{Adapter, AdapterError, AdapterInfo, AdapterResult};
    use crate::domain::asset::AssetKind;
    use crate::domain::policy::{PolicyConfig, RateLimiterConfig, TargetValidatorConfig};
    use async_trait::async_trait;

    struct AlwaysOk(&'static str);
    struct AlwaysFail(&'static str);

    #[async_trait]
    impl Adapter for AlwaysOk {
        fn validate_config(&self) -> Result<(), AdapterError> {
            Ok(())
        }
        fn validate_params(&self, _params: &Value) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn execute(&self, _params: Value) -> AdapterResult {
            AdapterResult::success(serde_json::json!({"ok": true}))
        }
        fn get_info(&self) -> AdapterInfo {
            AdapterInfo {
                name: self.0.to_string(),
                version: "0.1.0".to_string(),
                description: "always succeeds".to_string(),
                capabilities: vec![],
                requirements: vec![],
                example_usage: None,
            }
        }
    }

    #[async_trait]
    impl Adapter for AlwaysFail {
        fn validate_config(&self) -> Result<(), AdapterError> {
            Ok(())
        }
        fn validate_params(&self, _params: &Value) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn execute(&self, _params: Value) -> AdapterResult {
            AdapterResult::error("simulated failure")
        }
        fn get_info(&self) -> AdapterInfo {
            AdapterInfo {
                name: self.0.to_string(),
                version: "0.1.0".to_string(),
                description: "always fails".to_string(),
                capabilities: vec![],
                requirements: vec![],
                example_usage: None,
            }
        }
    }

    fn build_orchestrator() -> Orchestrator {
        let policy = Arc::new(PolicyEngine::new(
            PolicyConfig {
                rate_limiting: RateLimiterConfig { window_size_secs: 60, max_requests: 100, global_max_requests: 1000 },
                target_validation: TargetValidatorConfig {
                    authorized_networks: vec![],
                    authorized_domains: vec!["example.com".to_string()],
                    blocked_targets: vec![],
                },
                allowed_exploits: vec![],
            },
            true,
        ));
        let plugins = Arc::new(PluginManager::new(Some(policy.clone())));
        plugins.register_factory("whois", || Ok(Arc::new(AlwaysOk("whois"))));
        plugins.register_factory("dns_lookup", || Ok(Arc::new(AlwaysFail("dns_lookup"))));
        plugins.register_factory("ssl_check", || Ok(Arc::new(AlwaysOk("ssl_check"))));
        Orchestrator::new(plugins, policy, None)
    }

    #[tokio::test]
    async fn passive_recon_continues_past_individual_failure() {
        let mut orchestrator = build_orchestrator();
        orchestrator
            .add_asset(Asset::new("example.com", AssetKind::Domain, "example.com"))
            .unwrap();

        let results = orchestrator.run_passive_recon().await;
        assert_eq!(results.len(), 2);
        assert_eq!(orchestrator.context().workflow_state, WorkflowState::Completed);
    }

    #[tokio::test]
    async fn planner_falls_back_to_default_plan_without_llm_client() {
        let orchestrator = build_orchestrator();
        let plan = orchestrator.plan_active_scans(ScanMode::Active, "example.com").await;
        let tools: Vec<&str> = plan.iter().map(|s| s.tool.as_str()).collect();
        assert_eq!(tools, vec!["nmap", "sqlmap", "gobuster"]);
    }

    #[tokio::test]
    async fn planner_lab_default_plan_includes_metasploit() {
        let orchestrator = build_orchestrator();
        let plan = orchestrator.plan_active_scans(ScanMode::Lab, "example.com").await;
        let tools: Vec<&str> = plan.iter().map(|s| s.tool.as_str()).collect();
        assert_eq!(tools, vec!["nmap", "sqlmap", "gobuster", "metasploit"]);
    }

    #[tokio::test]
    async fn execute_scan_step_denial_is_attributed_to_the_real_tool_once() {
        let mut orchestrator = build_orchestrator();
        let step = WorkflowStep::new("whois", "unauthorized-target.example.org");
        let outcome = orchestrator.execute_scan_step(step, false, ScanMode::Active, false).await.unwrap();
        assert!(outcome.is_none());

        let violations = orchestrator.policy.get_violation_report();
        assert_eq!(violations.len(), 1);
        assert!(violations[0].details.contains("whois"));
        assert!(!violations[0].details.contains("asset_intake"));
    }

    #[test]
    fn cleanup_is_idempotent() {
        let mut orchestrator = build_orchestrator();
        orchestrator.cleanup();
        orchestrator.cleanup();
        assert!(orchestrator.context().assets.is_empty());
    }
}
