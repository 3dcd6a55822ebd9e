// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Activity events emitted by the Agent Executor's optional observer sink
//! (spec §4.9) and by the Policy Engine for auditing.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Emitted once per meaningful step inside the Executor loop so callers can
/// observe a run without participating in it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ExecutorActivityEvent {
    Thinking { turn: u32, content: String },
    ToolCall { turn: u32, tool: String, parameters: serde_json::Value },
    ToolResult { turn: u32, tool: String, output: String },
    Warning { turn: u32, message: String },
    Answer { turn: u32, output: serde_json::Value },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum PolicyEvent {
    PolicyViolationAttempted {
        violation_type: String,
        details: String,
        attempted_at: DateTime<Utc>,
    },
    PolicyViolationBlocked {
        violation_type: String,
        details: String,
        blocked_at: DateTime<Utc>,
    },
}
