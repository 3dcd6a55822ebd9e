// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Authorized scan targets.

use serde::{Deserialize, Serialize};

/// The kind of target an [`Asset`] refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    Host,
    Domain,
    Vm,
}

/// An authorized target. Unique by `name`, immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    pub name: String,
    pub kind: AssetKind,
    pub value: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Asset {
    pub fn new(name: impl Into<String>, kind: AssetKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Build an ephemeral asset for a single adapter invocation, as the
    /// orchestrator does before `execute_scan_step` calls into the policy
    /// engine.
    pub fn ephemeral(target: impl Into<String>) -> Self {
        let value = target.into();
        let kind = if value.parse::<std::net::IpAddr>().is_ok() {
            AssetKind::Host
        } else {
            AssetKind::Domain
        };
        Self::new(value.clone(), kind, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ephemeral_ip_is_host_kind() {
        let a = Asset::ephemeral("10.0.0.1");
        assert_eq!(a.kind, AssetKind::Host);
    }

    #[test]
    fn ephemeral_name_is_domain_kind() {
        let a = Asset::ephemeral("example.com");
        assert_eq!(a.kind, AssetKind::Domain);
    }
}
