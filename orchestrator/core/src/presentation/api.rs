// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! REST surface over one [`Orchestrator`] run, mounted by the CLI daemon
//! (spec §1 ambient stack: "an optional long-running daemon exposing the
//! orchestrator over HTTP"). Every handler delegates straight into
//! `application::orchestrator` — this module owns no policy or scan logic
//! of its own.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::sse::{Event, Sse};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{http::StatusCode, Json, Router};
use futures::stream::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::application::orchestrator::{Orchestrator, OrchestratorError, ReportFormat, ScanMode};
use crate::domain::asset::{Asset, AssetKind};
use crate::domain::workflow::WorkflowStep;
use crate::infrastructure::event_bus::EventBus;

pub struct AppState {
    pub orchestrator: Arc<Mutex<Orchestrator>>,
    pub events: EventBus,
}

pub fn app(orchestrator: Arc<Mutex<Orchestrator>>, events: EventBus) -> Router {
    let state = Arc::new(AppState { orchestrator, events });

    Router::new()
        .route("/assets", post(add_asset))
        .route("/recon/passive", post(run_passive_recon))
        .route("/scans/plan", post(plan_active_scans))
        .route("/scans/steps/:tool", post(execute_scan_step))
        .route("/reports/:format", get(generate_report))
        .route("/events", get(stream_events))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct AddAssetRequest {
    name: String,
    kind: String,
    value: String,
}

fn parse_kind(raw: &str) -> Option<AssetKind> {
    match raw {
        "host" => Some(AssetKind::Host),
        "domain" => Some(AssetKind::Domain),
        "vm" => Some(AssetKind::Vm),
        _ => None,
    }
}

async fn add_asset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AddAssetRequest>,
) -> impl IntoResponse {
    let Some(kind) = parse_kind(&request.kind) else {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": "unknown asset kind"})))
            .into_response();
    };

    let asset = Asset::new(request.name, kind, request.value);
    let mut orchestrator = state.orchestrator.lock().await;
    match orchestrator.add_asset(asset) {
        Ok(()) => (StatusCode::CREATED, Json(serde_json::json!({"status": "added"}))).into_response(),
        Err(OrchestratorError::AssetRejected(target)) => (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({"error": format!("asset rejected by policy engine: {target}")})),
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": e.to_string()}))).into_response(),
    }
}

async fn run_passive_recon(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let mut orchestrator = state.orchestrator.lock().await;
    let results = orchestrator.run_passive_recon().await;
    Json(results)
}

#[derive(Debug, Deserialize)]
struct PlanRequest {
    mode: String,
    target: String,
}

fn parse_mode(raw: &str) -> Option<ScanMode> {
    match raw {
        "passive" => Some(ScanMode::Passive),
        "active" => Some(ScanMode::Active),
        "lab" => Some(ScanMode::Lab),
        _ => None,
    }
}

async fn plan_active_scans(
    State(state): State<Arc<AppState>>,
    Json(request): Json<PlanRequest>,
) -> impl IntoResponse {
    let Some(mode) = parse_mode(&request.mode) else {
        return (StatusCode::BAD_REQUEST, Json(serde_json::json!({"error": "unknown scan mode"})))
            .into_response();
    };

    let orchestrator = state.orchestrator.lock().await;
    let plan = orchestrator.plan_active_scans(mode, &request.target).await;
    Json(plan).into_response()
}

#[derive(Debug, Deserialize)]
struct ExecuteStepRequest {
    step: WorkflowStep,
    mode: String,
    approval_required: bool,
    #[serde(default)]
    approved: bool,
}

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

async fn execute_scan_step(
    State(state): State<Arc<AppState>>,
    Path(_tool): Path<String>,
    Json(request): Json<ExecuteStepRequest>,
) -> impl IntoResponse {
    let Some(mode) = parse_mode(&request.mode) else {
        return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: "unknown scan mode".into() }))
            .into_response();
    };

    let mut orchestrator = state.orchestrator.lock().await;
    match orchestrator
        .execute_scan_step(request.step, request.approval_required, mode, request.approved)
        .await
    {
        Ok(result) => Json(result).into_response(),
        Err(OrchestratorError::ApprovalRequired(step)) => (
            StatusCode::CONFLICT,
            Json(ErrorResponse { error: format!("step {step} requires approval before execution") }),
        )
            .into_response(),
        Err(e) => (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: e.to_string() })).into_response(),
    }
}

async fn generate_report(State(state): State<Arc<AppState>>, Path(format): Path<String>) -> impl IntoResponse {
    let format = match format.as_str() {
        "json" => ReportFormat::Json,
        "markdown" | "md" => ReportFormat::Markdown,
        "html" => ReportFormat::Html,
        "csv" => ReportFormat::Csv,
        _ => {
            return (StatusCode::BAD_REQUEST, Json(ErrorResponse { error: "unknown report format".into() }))
                .into_response()
        }
    };

    let orchestrator = state.orchestrator.lock().await;
    Json(orchestrator.generate_report(format)).into_response()
}

/// Streams [`EventBus`] activity as server-sent events, so an operator can
/// watch a long-running recon/scan pass without polling.
async fn stream_events(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, BroadcastStreamRecvError>>> {
    let receiver = state.events.subscribe();
    let stream = BroadcastStream::new(receiver).map(|event| {
        event.map(|domain_event| {
            Event::default().json_data(domain_event).unwrap_or_else(|_| Event::default().data("serialization error"))
        })
    });
    Sse::new(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_kind_accepts_known_values() {
        assert_eq!(parse_kind("host"), Some(AssetKind::Host));
        assert_eq!(parse_kind("domain"), Some(AssetKind::Domain));
        assert_eq!(parse_kind("vm"), Some(AssetKind::Vm));
        assert_eq!(parse_kind("nonsense"), None);
    }

    #[test]
    fn parse_mode_accepts_known_values() {
        assert!(matches!(parse_mode("passive"), Some(ScanMode::Passive)));
        assert!(matches!(parse_mode("active"), Some(ScanMode::Active)));
        assert!(matches!(parse_mode("lab"), Some(ScanMode::Lab)));
        assert!(parse_mode("nonsense").is_none());
    }
}
