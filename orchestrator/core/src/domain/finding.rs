// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Normalized security observations derived from adapter output.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingSeverity {
    Info,
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Finding {
    pub title: String,
    pub severity: FindingSeverity,
    pub description: String,
    pub asset_ref: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub remediation: Option<String>,
    #[serde(default)]
    pub evidence_path: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl Finding {
    pub fn new(
        title: impl Into<String>,
        severity: FindingSeverity,
        description: impl Into<String>,
        asset_ref: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            severity,
            description: description.into(),
            asset_ref: asset_ref.into(),
            category: None,
            remediation: None,
            evidence_path: None,
            created_at: chrono::Utc::now(),
        }
    }
}

/// Shape of a single entry inside the LLM's `{"findings": [...]}` envelope
/// (spec §6). Distinct from [`Finding`] because the LLM doesn't know the
/// record's creation timestamp or its own asset binding ahead of time.
#[derive(Debug, Clone, Deserialize)]
pub struct RawFinding {
    pub title: String,
    #[serde(default)]
    pub severity: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub affected_resource: Option<String>,
    #[serde(default)]
    pub remediation: Option<String>,
}

impl RawFinding {
    pub fn into_finding(self, default_asset_ref: &str) -> Finding {
        let severity = self
            .severity
            .as_deref()
            .map(|s| match s.to_ascii_lowercase().as_str() {
                "critical" => FindingSeverity::Critical,
                "high" => FindingSeverity::High,
                "medium" => FindingSeverity::Medium,
                "low" => FindingSeverity::Low,
                _ => FindingSeverity::Info,
            })
            .unwrap_or(FindingSeverity::Info);
        Finding {
            title: self.title,
            severity,
            description: self.description,
            asset_ref: self
                .affected_resource
                .unwrap_or_else(|| default_asset_ref.to_string()),
            category: self.category,
            remediation: self.remediation,
            evidence_path: None,
            created_at: chrono::Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FindingsEnvelope {
    #[serde(default)]
    pub findings: Vec<RawFinding>,
}
