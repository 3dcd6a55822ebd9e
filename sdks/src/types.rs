// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Wire DTOs for the daemon's REST surface (`aegis_orchestrator_core::presentation::api`).
//! These mirror the request bodies the handlers deserialize; callers build
//! one of these rather than hand-assembling JSON.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAssetRequest {
    pub name: String,
    pub kind: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlanRequest {
    pub mode: String,
    pub target: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteStepRequest {
    pub step: aegis_orchestrator_core::domain::workflow::WorkflowStep,
    pub mode: String,
    pub approval_required: bool,
    #[serde(default)]
    pub approved: bool,
}
