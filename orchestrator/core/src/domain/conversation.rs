// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Conversation messages and the bounded history buffer the LLM Client and
//! Agent Executor share (spec §3, §4.8).

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }
    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
    pub fn assistant(content: impl Into<String>) -> Self {
        Self { role: Role::Assistant, content: content.into() }
    }
}

/// A bounded ring of recent messages with explicit oldest-first eviction of
/// non-system messages (spec §1's "supplemented features": the original has
/// no explicit cap, this crate fixes one).
#[derive(Debug, Clone)]
pub struct ConversationHistory {
    max_len: usize,
    messages: VecDeque<ConversationMessage>,
}

impl ConversationHistory {
    pub fn new(max_len: usize) -> Self {
        Self { max_len, messages: VecDeque::new() }
    }

    pub fn push(&mut self, message: ConversationMessage) {
        self.messages.push_back(message);
        while self.messages.len() > self.max_len {
            // Never evict the very first message if it's the system prompt.
            if self.messages.len() > 1 && self.messages[0].role == Role::System {
                self.messages.remove(1);
            } else {
                self.messages.pop_front();
            }
        }
    }

    pub fn extend(&mut self, messages: impl IntoIterator<Item = ConversationMessage>) {
        for m in messages {
            self.push(m);
        }
    }

    pub fn as_slice(&self) -> Vec<ConversationMessage> {
        self.messages.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// A flattened rendering suitable for providers without native
    /// multi-message chat support.
    pub fn render(&self) -> String {
        self.messages
            .iter()
            .map(|m| format!("[{:?}] {}", m.role, m.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_oldest_non_system_message_when_full() {
        let mut history = ConversationHistory::new(2);
        history.push(ConversationMessage::system("sys"));
        history.push(ConversationMessage::user("one"));
        history.push(ConversationMessage::user("two"));
        let msgs = history.as_slice();
        assert_eq!(msgs.len(), 2);
        assert_eq!(msgs[0].role, Role::System);
        assert_eq!(msgs[1].content, "two");
    }
}
