// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! The persistent store collaborator (spec §6): a narrow interface over a
//! simple relational store. Evidence persistence, findings normalization
//! storage, and reporting detail beyond this interface are out of scope —
//! this module only defines the boundary the Orchestrator talks to.

use async_trait::async_trait;

use crate::domain::asset::Asset;
use crate::domain::finding::Finding;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("entity not found: {0}")]
    NotFound(String),

    #[error("already exists: {0}")]
    AlreadyExists(String),

    #[error("storage error: {0}")]
    Storage(String),
}

/// The persistent store the Orchestrator depends on for assets and
/// findings (spec §6). Schema: assets, findings, audit_log.
#[async_trait]
pub trait PersistentStore: Send + Sync {
    async fn add_asset(&self, asset: Asset) -> Result<(), RepositoryError>;
    async fn get_asset_by_name(&self, name: &str) -> Result<Option<Asset>, RepositoryError>;
    async fn get_asset(&self, name: &str) -> Result<Asset, RepositoryError> {
        self.get_asset_by_name(name)
            .await?
            .ok_or_else(|| RepositoryError::NotFound(name.to_string()))
    }
    async fn save_findings(&self, findings: Vec<Finding>) -> Result<(), RepositoryError>;
    async fn list_findings(&self) -> Result<Vec<Finding>, RepositoryError>;
}
