// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! YAML/JSON (de)serialization helpers for the two manifest shapes a
//! third-party developer authors against: an [`AgentDefinition`] (what the
//! Agent Executor drives) and an [`AdapterInfo`] describing a tool adapter.
//! Both types already derive `serde::{Serialize, Deserialize}` in
//! `aegis-orchestrator-core`; this module only adds the file/string
//! round-trip conventions the CLI and other tooling expect.

pub use aegis_orchestrator_core::domain::adapter::AdapterInfo;
pub use aegis_orchestrator_core::domain::agent::AgentDefinition;

/// Load an [`AgentDefinition`] from a YAML file on disk.
pub fn load_agent_manifest(path: impl AsRef<std::path::Path>) -> anyhow::Result<AgentDefinition> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Serialize an [`AgentDefinition`] to a YAML file on disk.
pub fn save_agent_manifest(definition: &AgentDefinition, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(definition)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

/// Parse an [`AgentDefinition`] from a YAML string.
pub fn agent_manifest_from_str(yaml: &str) -> anyhow::Result<AgentDefinition> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load an [`AdapterInfo`] manifest from a YAML file on disk.
pub fn load_adapter_manifest(path: impl AsRef<std::path::Path>) -> anyhow::Result<AdapterInfo> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Serialize an [`AdapterInfo`] manifest to a YAML file on disk.
pub fn save_adapter_manifest(info: &AdapterInfo, path: impl AsRef<std::path::Path>) -> anyhow::Result<()> {
    let yaml = serde_yaml::to_string(info)?;
    std::fs::write(path, yaml)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn agent_manifest_round_trips_through_yaml() {
        let definition = AgentDefinition {
            name: "planner_agent".to_string(),
            description: "Plans the next scan steps".to_string(),
            inputs: HashMap::new(),
            output: None,
            allowed_tools: vec!["nmap".to_string()],
            system_prompt: "You are a planner.".to_string(),
            initial_query_template: "Plan scans for ${target}".to_string(),
        };

        let yaml = serde_yaml::to_string(&definition).unwrap();
        let parsed = agent_manifest_from_str(&yaml).unwrap();
        assert_eq!(parsed.name, "planner_agent");
        assert_eq!(parsed.allowed_tools, vec!["nmap".to_string()]);
    }

    #[test]
    fn adapter_manifest_round_trips_through_yaml() {
        let info = AdapterInfo {
            name: "whois".to_string(),
            version: "1.0.0".to_string(),
            description: "WHOIS lookups".to_string(),
            capabilities: vec!["passive".to_string()],
            requirements: vec![],
            example_usage: None,
        };

        let yaml = serde_yaml::to_string(&info).unwrap();
        let parsed: AdapterInfo = serde_yaml::from_str(&yaml).unwrap();
        assert_eq!(parsed.name, "whois");
        assert_eq!(parsed.capabilities, vec!["passive".to_string()]);
    }
}
