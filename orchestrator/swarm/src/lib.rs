// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # `aegis-orchestrator-swarm` — concurrent sub-agent tracking
//!
//! A small add-on crate over `aegis-orchestrator-core`: it does not
//! implement the Sub-Agent Tool itself (that lives in
//! `aegis_orchestrator_core::application::subagent_tool`, spec §4.10) but
//! wraps it so several sub-agents running concurrently under one
//! assessment can be observed as a group.
//!
//! | Module | Layer | Contents |
//! |--------|-------|----------|
//! | [`domain`] | Domain | `Swarm`, `SwarmId`, `ActiveAgent` |
//! | [`application`] | Application | [`application::TrackedTool`] |

pub mod domain;
pub mod application;

pub use domain::*;
