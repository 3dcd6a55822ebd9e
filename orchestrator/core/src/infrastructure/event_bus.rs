// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Event Bus - Pub/Sub for Executor activity and policy events
//
// Provides in-memory event streaming using tokio broadcast channels so a
// CLI or HTTP observer can watch an Agent Executor run without
// participating in it (spec §4.9 "activity hooks").
//
// In-memory only; events are lost on restart. No persistence layer is in
// scope for this crate.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

use crate::domain::events::{ExecutorActivityEvent, PolicyEvent};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    Executor(ExecutorActivityEvent),
    Policy(PolicyEvent),
}

/// Event bus for publishing and subscribing to domain events.
#[derive(Clone)]
pub struct EventBus {
    sender: Arc<broadcast::Sender<DomainEvent>>,
}

impl EventBus {
    /// Capacity determines how many events can be buffered before dropping
    /// old ones. Default: 1000 events.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender: Arc::new(sender) }
    }

    pub fn with_default_capacity() -> Self {
        Self::new(1000)
    }

    pub fn publish_executor_event(&self, event: ExecutorActivityEvent) {
        self.publish(DomainEvent::Executor(event));
    }

    pub fn publish_policy_event(&self, event: PolicyEvent) {
        self.publish(DomainEvent::Policy(event));
    }

    fn publish(&self, event: DomainEvent) {
        // No subscribers is a normal, not an error, state.
        let _ = self.sender.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::with_default_capacity()
    }
}
