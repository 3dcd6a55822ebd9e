// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

pub mod executor;
pub mod json_extract;
pub mod llm_client;
pub mod orchestrator;
pub mod plugin_manager;
pub mod report_tool;
pub mod subagent_tool;
pub mod tool_registry;
