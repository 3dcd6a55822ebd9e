// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Pure domain types for tracking concurrently active sub-agents.
//!
//! | Module | Key Types |
//! |--------|-----------|
//! | [`swarm`] | `Swarm`, `SwarmId`, `ActiveAgent` |

pub mod swarm;

pub use swarm::*;
