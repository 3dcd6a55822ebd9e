// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! Daemon HTTP server implementation: mounts
//! `aegis_orchestrator_core::presentation::api` behind the CLI's PID-file
//! lifecycle management.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tokio::sync::Mutex as AsyncMutex;
use tracing::info;

use aegis_orchestrator_core::infrastructure::event_bus::EventBus;
use aegis_orchestrator_core::presentation::api;

use crate::config::AegisConfig;
use crate::embedded::build_orchestrator;

use super::{remove_pid_file, write_pid_file};

struct PidFileGuard;

impl Drop for PidFileGuard {
    fn drop(&mut self) {
        let _ = remove_pid_file();
    }
}

pub async fn start_daemon(config_path: Option<PathBuf>, host: String, port: u16) -> Result<()> {
    let pid = std::process::id();
    write_pid_file(pid)?;
    let _guard = PidFileGuard;

    info!(pid, "AEGIS daemon starting");

    let config = AegisConfig::load_or_default(config_path).context("failed to load configuration")?;
    if config.llm.providers.is_empty() {
        tracing::warn!("starting with no LLM providers configured; active-scan planning will use the default plan");
    }

    let orchestrator = build_orchestrator(&config).context("failed to build orchestrator")?;
    let events = EventBus::with_default_capacity();
    let app = api::app(Arc::new(AsyncMutex::new(orchestrator)), events);
    let app = app.route("/health", axum::routing::get(health));

    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr).await.with_context(|| format!("failed to bind {addr}"))?;
    info!(addr = %addr, "daemon listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("daemon server error")?;

    info!("daemon stopped");
    Ok(())
}

async fn health() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({"status": "ok", "pid": std::process::id()}))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        let _ = tokio::signal::ctrl_c().await;
    };

    #[cfg(unix)]
    let terminate = async {
        let mut sig = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        sig.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
