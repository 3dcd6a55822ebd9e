// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The Plugin Manager (spec §4.6): discovery, lazy load, contract
//! validation, and the single gated `run_adapter` chokepoint every tool
//! call in the system flows through.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use crate::domain::adapter::{Adapter, AdapterError, AdapterResult, AdapterStatus};
use crate::domain::asset::Asset;
use crate::domain::policy::{PolicyAsset, PolicyEngine};

#[derive(Debug, thiserror::Error)]
pub enum PluginManagerError {
    #[error("no adapter registered under name: {0}")]
    NotFound(String),
    #[error("adapter configuration invalid: {0}")]
    Configuration(#[from] AdapterError),
}

/// A discovered but not-yet-instantiated adapter. Mirrors the source's
/// "enumerate the adapters directory" discovery step: in Rust there is no
/// dynamic class loading, so discovery is modeled as a registration of
/// named factories supplied by the embedding application at startup.
type AdapterFactory = Box<dyn Fn() -> Result<Arc<dyn Adapter>, AdapterError> + Send + Sync>;

struct PluginManagerState {
    factories: HashMap<String, AdapterFactory>,
    loaded: HashMap<String, Arc<dyn Adapter>>,
    failed: HashMap<String, String>,
}

/// Owns every loaded adapter instance exclusively (spec §3 "Lifecycle &
/// ownership"). Guarded by an `RwLock` per spec §5: the adapter cache is
/// mutable and must be protected against concurrent load/unload.
pub struct PluginManager {
    state: RwLock<PluginManagerState>,
    policy: Option<Arc<PolicyEngine>>,
}

impl PluginManager {
    pub fn new(policy: Option<Arc<PolicyEngine>>) -> Self {
        Self {
            state: RwLock::new(PluginManagerState {
                factories: HashMap::new(),
                loaded: HashMap::new(),
                failed: HashMap::new(),
            }),
            policy,
        }
    }

    /// Registers a discoverable adapter under `name`. Configuration
    /// validation and instantiation are deferred to first use
    /// (`load_if_needed`).
    pub fn register_factory(
        &self,
        name: impl Into<String>,
        factory: impl Fn() -> Result<Arc<dyn Adapter>, AdapterError> + Send + Sync + 'static,
    ) {
        self.state.write().factories.insert(name.into(), Box::new(factory));
    }

    /// Names discoverable right now: everything with a registered factory,
    /// minus anything that failed configuration validation and was excluded
    /// (spec §7: a configuration error is fatal to the affected adapter; the
    /// orchestrator continues with the rest).
    pub fn discovered_names(&self) -> Vec<String> {
        let state = self.state.read();
        let mut names: Vec<String> = state
            .factories
            .keys()
            .filter(|n| !state.failed.contains_key(*n))
            .cloned()
            .collect();
        names.sort();
        names
    }

    fn load_if_needed(&self, name: &str) -> Result<Arc<dyn Adapter>, PluginManagerError> {
        if let Some(adapter) = self.state.read().loaded.get(name).cloned() {
            return Ok(adapter);
        }
        let mut state = self.state.write();
        if let Some(adapter) = state.loaded.get(name).cloned() {
            return Ok(adapter);
        }
        if let Some(reason) = state.failed.get(name) {
            return Err(PluginManagerError::Configuration(AdapterError::Configuration(reason.clone())));
        }
        let factory = state
            .factories
            .get(name)
            .ok_or_else(|| PluginManagerError::NotFound(name.to_string()))?;
        let adapter = factory();
        match adapter {
            Ok(adapter) => match adapter.validate_config() {
                Ok(()) => {
                    tracing::info!(adapter = %name, "loaded adapter");
                    state.loaded.insert(name.to_string(), adapter.clone());
                    Ok(adapter)
                }
                Err(e) => {
                    tracing::warn!(adapter = %name, error = %e, "adapter excluded: configuration invalid");
                    state.failed.insert(name.to_string(), e.to_string());
                    Err(PluginManagerError::Configuration(e))
                }
            },
            Err(e) => {
                state.failed.insert(name.to_string(), e.to_string());
                Err(PluginManagerError::Configuration(e))
            }
        }
    }

    /// Validates that a loaded adapter satisfies the contract: `get_info`
    /// returns a populated name (spec §4.6 "Validate").
    pub fn validate_adapter(&self, name: &str) -> Result<(), PluginManagerError> {
        let adapter = self.load_if_needed(name)?;
        if adapter.get_info().name.trim().is_empty() {
            return Err(PluginManagerError::Configuration(AdapterError::Configuration(
                "get_info() must return a non-empty name".to_string(),
            )));
        }
        Ok(())
    }

    /// Tries a handful of conventional parameter keys for the invocation's
    /// target, as the source's `run_adapter` does before consulting the
    /// policy engine (spec §4.6).
    fn extract_target(params: &Value) -> Option<String> {
        for key in ["target", "domain", "host", "url"] {
            if let Some(v) = params.get(key).and_then(Value::as_str) {
                if !v.is_empty() {
                    return Some(v.to_string());
                }
            }
        }
        None
    }

    /// The single chokepoint every tool call flows through (spec §4.6,
    /// §9). No other component independently pre-checks target
    /// authorization or rate limits (spec's resolved open question in
    /// `SPEC_FULL.md`).
    pub async fn run_adapter(&self, name: &str, params: Value) -> AdapterResult {
        if let Some(policy) = &self.policy {
            if let Some(target) = Self::extract_target(&params) {
                let asset = PolicyAsset { target: target.clone(), tool_name: name.to_string() };
                if !policy.validate_asset(&asset) {
                    return AdapterResult::blocked("unauthorized target");
                }
            }
            if !policy.enforce_rate_limits(name) {
                return AdapterResult::blocked("rate limit exceeded");
            }
        }

        let adapter = match self.load_if_needed(name) {
            Ok(a) => a,
            Err(e) => return AdapterResult::error(e.to_string()),
        };

        if let Err(e) = adapter.validate_params(&params) {
            return AdapterResult::error(e.to_string());
        }

        adapter.execute(params).await
    }

    /// Validates an [`Asset`] through the policy engine before it becomes a
    /// tracked authorized target, matching `Orchestrator::add_asset`'s use
    /// of the same gate (spec §4.11). Exposed here because both the
    /// Orchestrator and direct adapter invocation share one policy engine
    /// instance.
    pub fn authorize_asset(&self, asset: &Asset) -> bool {
        match &self.policy {
            Some(policy) => policy.validate_asset(&PolicyAsset {
                target: asset.value.clone(),
                tool_name: "asset_intake".to_string(),
            }),
            None => true,
        }
    }

    /// Unloads every cached adapter instance and clears failure records.
    /// Idempotent (spec §8 "idempotent cleanup"): calling twice in a row is
    /// equivalent to calling once.
    pub fn cleanup(&self) {
        let mut state = self.state.write();
        state.loaded.clear();
        state.failed.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::adapter::AdapterInfo;
    use crate::domain::policy::{PolicyConfig, RateLimiterConfig, TargetValidatorConfig};
    use async_trait::async_trait;

    struct StubAdapter {
        name: &'static str,
    }

    #[async_trait]
    impl Adapter for StubAdapter {
        fn validate_config(&self) -> Result<(), AdapterError> {
            Ok(())
        }
        fn validate_params(&self, _params: &Value) -> Result<(), AdapterError> {
            Ok(())
        }
        async fn execute(&self, params: Value) -> AdapterResult {
            AdapterResult::success(params)
        }
        fn get_info(&self) -> AdapterInfo {
            AdapterInfo {
                name: self.name.to_string(),
                version: "0.1.0".to_string(),
                description: "stub".to_string(),
                capabilities: vec![],
                requirements: vec![],
                example_usage: None,
            }
        }
    }

    fn manager_with_policy() -> PluginManager {
        let policy = Arc::new(PolicyEngine::new(
            PolicyConfig {
                rate_limiting: RateLimiterConfig { window_size_secs: 60, max_requests: 10, global_max_requests: 100 },
                target_validation: TargetValidatorConfig {
                    authorized_networks: vec!["192.168.1.0/24".to_string()],
                    authorized_domains: vec!["example.com".to_string()],
                    blocked_targets: vec![],
                },
                allowed_exploits: vec![],
            },
            false,
        ));
        let manager = PluginManager::new(Some(policy));
        manager.register_factory("whois", || Ok(Arc::new(StubAdapter { name: "whois" })));
        manager
    }

    #[tokio::test]
    async fn unauthorized_target_blocks_before_execute() {
        let manager = manager_with_policy();
        let result = manager
            .run_adapter("whois", serde_json::json!({"target": "10.0.0.1"}))
            .await;
        assert_eq!(result.status, AdapterStatus::Error);
        assert!(result.is_blocked());
    }

    #[tokio::test]
    async fn authorized_target_reaches_adapter() {
        let manager = manager_with_policy();
        let result = manager
            .run_adapter("whois", serde_json::json!({"target": "example.com"}))
            .await;
        assert_eq!(result.status, AdapterStatus::Success);
    }

    #[tokio::test]
    async fn unknown_adapter_returns_error_result_not_panic() {
        let manager = manager_with_policy();
        let result = manager.run_adapter("nonexistent", serde_json::json!({})).await;
        assert_eq!(result.status, AdapterStatus::Error);
    }

    #[tokio::test]
    async fn successful_call_consumes_exactly_one_rate_limit_slot() {
        let policy = Arc::new(PolicyEngine::new(
            PolicyConfig {
                rate_limiting: RateLimiterConfig { window_size_secs: 60, max_requests: 2, global_max_requests: 100 },
                target_validation: TargetValidatorConfig {
                    authorized_networks: vec![],
                    authorized_domains: vec!["example.com".to_string()],
                    blocked_targets: vec![],
                },
                allowed_exploits: vec![],
            },
            false,
        ));
        let manager = PluginManager::new(Some(policy));
        manager.register_factory("whois", || Ok(Arc::new(StubAdapter { name: "whois" })));

        let first = manager.run_adapter("whois", serde_json::json!({"target": "example.com"})).await;
        let second = manager.run_adapter("whois", serde_json::json!({"target": "example.com"})).await;
        assert_eq!(first.status, AdapterStatus::Success);
        assert_eq!(second.status, AdapterStatus::Success);
    }

    #[tokio::test]
    async fn cleanup_is_idempotent() {
        let manager = manager_with_policy();
        let _ = manager.run_adapter("whois", serde_json::json!({"target": "example.com"})).await;
        manager.cleanup();
        manager.cleanup();
        assert!(manager.state.read().loaded.is_empty());
    }
}
