// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Concrete [`LLMProvider`](crate::domain::llm::LLMProvider) implementations,
//! one per vendor wire format, plus the [`ProviderRegistry`] that resolves
//! model aliases and applies retry/fallback across them.

pub mod openai;
pub mod ollama;
pub mod anthropic;
pub mod registry;

pub use registry::ProviderRegistry;
