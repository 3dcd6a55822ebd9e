// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wires a [`Swarm`](crate::domain::Swarm) around sub-agent execution: a
//! [`TrackedTool`] marks its inner tool active on entry and inactive on
//! exit (or on error — tracking must not leak an entry past a failed run),
//! so an operator driving several sub-agents concurrently can see which
//! ones are in flight (spec §4.10, §5).

use std::sync::Arc;

use aegis_orchestrator_core::application::tool_registry::Tool;
use aegis_orchestrator_core::domain::adapter::{AdapterInfo, AdapterResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use crate::domain::Swarm;

/// Wraps any [`Tool`] — in practice a
/// [`SubAgentTool`](aegis_orchestrator_core::application::subagent_tool::SubAgentTool)
/// — so its active span is recorded in a shared [`Swarm`].
pub struct TrackedTool {
    inner: Arc<dyn Tool>,
    swarm: Arc<Mutex<Swarm>>,
}

impl TrackedTool {
    pub fn new(inner: Arc<dyn Tool>, swarm: Arc<Mutex<Swarm>>) -> Self {
        Self { inner, swarm }
    }
}

#[async_trait]
impl Tool for TrackedTool {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn description(&self) -> &str {
        self.inner.description()
    }

    async fn execute(&self, params: Value) -> AdapterResult {
        self.swarm.lock().enter(self.inner.name());
        let result = self.inner.execute(params).await;
        self.swarm.lock().leave(self.inner.name());
        result
    }

    fn get_info(&self) -> AdapterInfo {
        self.inner.get_info()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aegis_orchestrator_core::domain::adapter::AdapterStatus;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "planner_agent"
        }
        fn description(&self) -> &str {
            "echoes params"
        }
        async fn execute(&self, params: Value) -> AdapterResult {
            AdapterResult::success(params)
        }
        fn get_info(&self) -> AdapterInfo {
            AdapterInfo {
                name: "planner_agent".to_string(),
                version: "0.1.0".to_string(),
                description: "echoes params".to_string(),
                capabilities: vec![],
                requirements: vec![],
                example_usage: None,
            }
        }
    }

    #[tokio::test]
    async fn tracked_tool_clears_active_span_after_completion() {
        let swarm = Arc::new(Mutex::new(Swarm::new()));
        let tracked = TrackedTool::new(Arc::new(Echo), swarm.clone());

        let result = tracked.execute(serde_json::json!({})).await;
        assert_eq!(result.status, AdapterStatus::Success);
        assert_eq!(swarm.lock().active_count(), 0);
    }
}
