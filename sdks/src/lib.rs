// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! AEGIS Rust SDK: a thin REST client over a running orchestrator daemon
//! plus manifest load/save helpers, for anything driving the daemon
//! without linking `aegis-orchestrator-core` directly.

pub mod client;
pub mod manifest;
pub mod types;

pub use client::AegisClient;
pub use manifest::AgentManifest;
pub use types::*;
