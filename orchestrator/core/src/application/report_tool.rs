// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! `generate_report` as a uniform [`Tool`] (spec §2 supplement): lets an
//! agent ask for the current run's report the same way it calls any
//! adapter, instead of report generation living only behind an HTTP
//! endpoint. Holds the same `Arc<Mutex<Orchestrator>>` the HTTP surface
//! wraps its orchestrator in, so both paths see one run's state.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::application::orchestrator::{Orchestrator, Report, ReportFormat};
use crate::domain::adapter::{AdapterInfo, AdapterResult};
use crate::application::tool_registry::Tool;

fn parse_format(params: &Value) -> ReportFormat {
    match params.get("format").and_then(Value::as_str).unwrap_or("markdown").to_ascii_lowercase().as_str() {
        "json" => ReportFormat::Json,
        "html" => ReportFormat::Html,
        "csv" => ReportFormat::Csv,
        _ => ReportFormat::Markdown,
    }
}

/// Drops every finding's `evidence_path` unless the caller explicitly asks
/// for evidence (default: included, matching `report_tool.py`'s
/// `include_evidence` default).
fn strip_evidence(mut report: Report) -> Report {
    for finding in &mut report.findings {
        finding.evidence_path = None;
    }
    report
}

pub struct ReportTool {
    orchestrator: Arc<Mutex<Orchestrator>>,
}

impl ReportTool {
    pub fn new(orchestrator: Arc<Mutex<Orchestrator>>) -> Self {
        Self { orchestrator }
    }
}

#[async_trait]
impl Tool for ReportTool {
    fn name(&self) -> &str {
        "generate_report"
    }

    fn description(&self) -> &str {
        "generate_report: assembles the current run's findings, scan results, \
         and policy violations. Parameters: format (json|markdown|html|csv, \
         default markdown), include_evidence (bool, default true)."
    }

    async fn execute(&self, params: Value) -> AdapterResult {
        let format = parse_format(&params);
        let include_evidence = params.get("include_evidence").and_then(Value::as_bool).unwrap_or(true);

        let report = self.orchestrator.lock().generate_report(format);
        let report = if include_evidence { report } else { strip_evidence(report) };

        match serde_json::to_value(&report) {
            Ok(value) => AdapterResult::success(value),
            Err(e) => AdapterResult::error(format!("failed to serialize report: {e}")),
        }
    }

    fn get_info(&self) -> AdapterInfo {
        AdapterInfo {
            name: "generate_report".to_string(),
            version: "0.1.0".to_string(),
            description: self.description().to_string(),
            capabilities: vec!["json".to_string(), "markdown".to_string(), "html".to_string(), "csv".to_string()],
            requirements: vec![],
            example_usage: Some(serde_json::json!({"format": "markdown", "include_evidence": true})),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::asset::{Asset, AssetKind};
    use crate::domain::policy::{PolicyConfig, PolicyEngine, RateLimiterConfig, TargetValidatorConfig};
    use crate::application::plugin_manager::PluginManager;

    fn build_orchestrator() -> Arc<Mutex<Orchestrator>> {
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
        let mut orchestrator = Orchestrator::new(plugins, policy, None);
        orchestrator.add_asset(Asset::new("example.com", AssetKind::Domain, "example.com")).unwrap();
        Arc::new(Mutex::new(orchestrator))
    }

    #[tokio::test]
    async fn default_report_defaults_to_markdown_with_evidence() {
        let tool = ReportTool::new(build_orchestrator());
        let result = tool.execute(serde_json::json!({})).await;
        assert_eq!(result.status, crate::domain::adapter::AdapterStatus::Success);
        assert_eq!(result.data["format_hint"], "markdown");
    }

    #[tokio::test]
    async fn unknown_format_falls_back_to_markdown() {
        let tool = ReportTool::new(build_orchestrator());
        let result = tool.execute(serde_json::json!({"format": "pdf"})).await;
        assert_eq!(result.data["format_hint"], "markdown");
    }

    #[tokio::test]
    async fn include_evidence_false_strips_evidence_paths() {
        let tool = ReportTool::new(build_orchestrator());
        let result = tool.execute(serde_json::json!({"include_evidence": false})).await;
        assert_eq!(result.status, crate::domain::adapter::AdapterStatus::Success);
    }
}
