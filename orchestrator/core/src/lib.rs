// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! # aegis-core
//!
//! The central orchestration crate for AEGIS. This crate is the coordination
//! substrate for an agent-driven penetration-testing orchestrator: it ties
//! together policy enforcement, tool adapters, the LLM-driven executor loop,
//! and phased scan orchestration.
//!
//! ## Components
//!
//! | Component | Domain/application files | Responsibility |
//! |---|---|---|
//! | **Policy Engine** | [`domain::policy`] | Target authorization, rate limiting, exploit gating, violation accounting |
//! | **Adapter contract** | [`domain::adapter`] | Uniform interface every tool wrapper implements |
//! | **Runners** | [`domain::runner`], [`infrastructure::process_runner`], [`infrastructure::container_runner`] | Sanitized, timeout-bounded external execution |
//! | **Command adapter** | [`infrastructure::command_adapter`] | Declarative `Adapter` binding a named tool to a `Runner` invocation |
//! | **Plugin Manager** | [`application::plugin_manager`] | Discovery, load, validate, the single gated `run_adapter` chokepoint |
//! | **Tool Registry** | [`application::tool_registry`] | Name → tool map shared by adapters, sub-agents, the report tool |
//! | **LLM Client** | [`domain::llm`], [`application::llm_client`] | Chat-completion abstraction, conversation memory, planning/analysis envelopes |
//! | **Agent Executor** | [`application::executor`] | The bounded JSON action/observation loop |
//! | **Sub-Agent Tool** | [`application::subagent_tool`] | Wraps an agent definition as a tool with a scoped registry |
//! | **Orchestrator** | [`application::orchestrator`] | Assets, phased scans, result normalization, reporting |
//!
//! ## Layer Structure
//!
//! ```text
//! presentation/   ← HTTP API (axum) for the CLI daemon
//!     ↓
//! application/    ← Use-cases: plugin manager, executor, orchestrator
//!     ↓
//! domain/         ← Aggregates, value objects, policy and adapter contracts
//!     ↓
//! infrastructure/ ← Process/container runners, LLM provider adapters, in-memory store
//! ```

pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod presentation;

pub use domain::*;
