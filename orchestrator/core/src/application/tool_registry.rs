// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The Tool Registry (spec §4.7): a name-keyed map over anything satisfying
//! the minimal tool shape. Adapters, sub-agents, and the report tool are all
//! registered through the same shape so they are indistinguishable at the
//! call site (spec §9 design notes).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::adapter::{AdapterInfo, AdapterResult};

/// The minimal shape the Agent Executor dispatches against: `{name,
/// description, execute(params), get_info()}`. Adapters are wrapped to
/// satisfy this; sub-agents and the report tool implement it directly.
#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    async fn execute(&self, params: Value) -> AdapterResult;
    fn get_info(&self) -> AdapterInfo;
}

/// Name → tool map. Cloning a registry is cheap (`Arc` handles are shared);
/// [`ToolRegistry::scoped`] builds the subset a sub-agent is allowed to see
/// without disturbing the parent.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: HashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: HashMap::new() }
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    /// Builds a fresh registry containing only the tools named in
    /// `allowed`, as the Sub-Agent Tool does when scoping a child executor
    /// (spec §4.10).
    pub fn scoped(&self, allowed: &[String]) -> Self {
        let tools = allowed
            .iter()
            .filter_map(|name| self.tools.get(name).map(|t| (name.clone(), t.clone())))
            .collect();
        Self { tools }
    }

    /// A `name: description` catalogue, one per line, used both for the
    /// executor's system-prompt tool enumeration and for the planner
    /// sub-agent's injected `executor_tools` input (spec §4.9, §4.10).
    pub fn describe_all(&self) -> String {
        let mut names = self.names();
        names.sort();
        names
            .into_iter()
            .map(|name| {
                let tool = &self.tools[&name];
                format!("{}: {}", tool.name(), tool.description())
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            "echoes its input"
        }
        async fn execute(&self, params: Value) -> AdapterResult {
            AdapterResult::success(params)
        }
        fn get_info(&self) -> AdapterInfo {
            AdapterInfo {
                name: self.0.to_string(),
                version: "0.1.0".to_string(),
                description: "echoes its input".to_string(),
                capabilities: vec![],
                requirements: vec![],
                example_usage: None,
            }
        }
    }

    #[test]
    fn scoped_registry_drops_tools_outside_allowlist() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("public_ip")));
        registry.register(Arc::new(Echo("nmap")));

        let scoped = registry.scoped(&["public_ip".to_string()]);
        assert!(scoped.contains("public_ip"));
        assert!(!scoped.contains("nmap"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn describe_all_lists_every_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("whois")));
        let catalogue = registry.describe_all();
        assert!(catalogue.contains("whois: echoes its input"));
    }
}
