// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Thin REST client over the orchestrator daemon's HTTP surface
//! (`aegis_orchestrator_core::presentation::api`). Used by the CLI's daemon
//! mode and by anything else that wants to drive a running daemon without
//! linking the orchestrator crate directly.

use anyhow::{anyhow, Result};
use reqwest::Client;
use serde_json::Value;

use aegis_orchestrator_core::application::orchestrator::{Report, ScanResult};
use aegis_orchestrator_core::domain::workflow::WorkflowStep;

use crate::types::{AddAssetRequest, ExecuteStepRequest, PlanRequest};

/// Client for a running AEGIS orchestrator daemon.
#[derive(Debug, Clone)]
pub struct AegisClient {
    base_url: String,
    client: Client,
    api_key: Option<String>,
}

impl AegisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into(), client: Client::new(), api_key: None }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    fn request(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_key {
            Some(key) => req.header("Authorization", format!("Bearer {key}")),
            None => req,
        }
    }

    /// Registers an asset with the daemon's policy engine (`POST /assets`).
    pub async fn add_asset(&self, name: &str, kind: &str, value: &str) -> Result<()> {
        let url = format!("{}/assets", self.base_url);
        let body = AddAssetRequest { name: name.to_string(), kind: kind.to_string(), value: value.to_string() };
        let response = self.request(self.client.post(&url).json(&body)).send().await?;
        if !response.status().is_success() {
            let err: Value = response.json().await.unwrap_or_default();
            return Err(anyhow!("add_asset failed: {err}"));
        }
        Ok(())
    }

    /// Runs passive recon over all registered assets (`POST /recon/passive`).
    pub async fn run_passive_recon(&self) -> Result<Vec<ScanResult>> {
        let url = format!("{}/recon/passive", self.base_url);
        let response = self.request(self.client.post(&url)).send().await?;
        Ok(response.json().await?)
    }

    /// Requests a scan plan for `target` under `mode` (`POST /scans/plan`).
    pub async fn plan_active_scans(&self, mode: &str, target: &str) -> Result<Vec<WorkflowStep>> {
        let url = format!("{}/scans/plan", self.base_url);
        let body = PlanRequest { mode: mode.to_string(), target: target.to_string() };
        let response = self.request(self.client.post(&url).json(&body)).send().await?;
        if !response.status().is_success() {
            let err: Value = response.json().await.unwrap_or_default();
            return Err(anyhow!("plan_active_scans failed: {err}"));
        }
        Ok(response.json().await?)
    }

    /// Executes one planned step (`POST /scans/steps/:tool`). `tool` must
    /// match `step.tool` — the daemon routes on it but also reads the body.
    /// Returns `None` if the policy engine rejected the step's target.
    pub async fn execute_scan_step(
        &self,
        step: WorkflowStep,
        mode: &str,
        approval_required: bool,
        approved: bool,
    ) -> Result<Option<ScanResult>> {
        let url = format!("{}/scans/steps/{}", self.base_url, step.tool);
        let body = ExecuteStepRequest { step, mode: mode.to_string(), approval_required, approved };
        let response = self.request(self.client.post(&url).json(&body)).send().await?;
        if !response.status().is_success() {
            let err: Value = response.json().await.unwrap_or_default();
            return Err(anyhow!("execute_scan_step failed: {err}"));
        }
        Ok(response.json().await?)
    }

    /// Fetches the assembled report in the requested format
    /// (`GET /reports/:format`, one of `json`, `markdown`, `html`, `csv`).
    pub async fn generate_report(&self, format: &str) -> Result<Report> {
        let url = format!("{}/reports/{format}", self.base_url);
        let response = self.request(self.client.get(&url)).send().await?;
        if !response.status().is_success() {
            let err: Value = response.json().await.unwrap_or_default();
            return Err(anyhow!("generate_report failed: {err}"));
        }
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_api_key_sets_bearer_token() {
        let client = AegisClient::new("http://localhost:8000").with_api_key("secret");
        assert_eq!(client.api_key.as_deref(), Some("secret"));
    }
}
