// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Tracks which sub-agents are concurrently active within one assessment
//! run (spec §4.10, §5: tool calls may be multiplexed across a worker pool
//! "provided the Executor observes each result in issue order"; a `Swarm`
//! is the bookkeeping that lets an operator see that multiplexing happen).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Unique identifier for a [`Swarm`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SwarmId(pub Uuid);

impl SwarmId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SwarmId {
    fn default() -> Self {
        Self::new()
    }
}

/// One sub-agent invocation currently in flight, keyed by the sub-agent's
/// tool name (an [`AgentDefinition`](aegis_orchestrator_core::domain::agent::AgentDefinition)
/// name is unique within a registry — spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveAgent {
    pub name: String,
    pub entered_at: DateTime<Utc>,
}

/// Membership set for one assessment run's concurrently-active sub-agents.
/// Not a scheduler or a message bus — the Agent Executor still drives each
/// agent's own sequential loop (spec §5: "single logical coordinator
/// thread per agent invocation"); a `Swarm` only records who is running
/// right now, for observability and for cascade-cancellation bookkeeping.
///
/// # Invariants
/// - An agent name appears at most once among the active set at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Swarm {
    pub id: SwarmId,
    active: HashMap<String, ActiveAgent>,
    pub created_at: DateTime<Utc>,
}

impl Swarm {
    pub fn new() -> Self {
        Self { id: SwarmId::new(), active: HashMap::new(), created_at: Utc::now() }
    }

    /// Records `name` as active. Returns `false` without changing state if
    /// it was already active — a sub-agent does not re-enter itself
    /// concurrently under the same name.
    pub fn enter(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.active.contains_key(&name) {
            return false;
        }
        self.active.insert(name.clone(), ActiveAgent { name, entered_at: Utc::now() });
        true
    }

    /// Removes `name` from the active set. Returns `false` if it was not
    /// tracked as active (already left, or never entered).
    pub fn leave(&mut self, name: &str) -> bool {
        self.active.remove(name).is_some()
    }

    pub fn is_active(&self, name: &str) -> bool {
        self.active.contains_key(name)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    pub fn active_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.active.keys().cloned().collect();
        names.sort();
        names
    }
}

impl Default for Swarm {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enter_then_leave_clears_active_set() {
        let mut swarm = Swarm::new();
        assert!(swarm.enter("planner_agent"));
        assert_eq!(swarm.active_count(), 1);
        assert!(swarm.leave("planner_agent"));
        assert_eq!(swarm.active_count(), 0);
    }

    #[test]
    fn re_entering_the_same_name_is_rejected() {
        let mut swarm = Swarm::new();
        assert!(swarm.enter("planner_agent"));
        assert!(!swarm.enter("planner_agent"));
        assert_eq!(swarm.active_count(), 1);
    }

    #[test]
    fn leaving_an_untracked_name_is_a_no_op() {
        let mut swarm = Swarm::new();
        assert!(!swarm.leave("nonexistent"));
    }
}
