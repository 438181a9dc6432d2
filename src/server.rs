//! HTTP interface for pause/resume control and outcome reporting.
//!
//! The endpoints never fail on a store outage: they only read the shared
//! gate and ledger, so an unreachable database shows up as missing or
//! errored outcomes, not as an HTTP error.

use crate::ledger::ResultLedger;
use crate::state::ActivityGate;
use axum::extract::State;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Shared handles handed to every request handler.
#[derive(Clone)]
pub struct AppState {
    pub gate: Arc<ActivityGate>,
    pub ledger: Arc<ResultLedger>,
}

/// Build the router serving the toggle/status/records endpoints and the
/// dashboard.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(dashboard))
        .route("/toggle-api", post(toggle))
        .route("/status", get(status))
        .route("/registros", get(records))
        .with_state(state)
}

/// Serve the HTTP interface until `cancel` fires.
pub async fn serve(
    bind_addr: &str,
    state: AppState,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    info!("HTTP interface listening on {}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { cancel.cancelled().await })
        .await?;

    Ok(())
}

async fn toggle(State(state): State<AppState>) -> Json<serde_json::Value> {
    let active = state.gate.toggle();
    info!("Replication toggled, active_state={active}");
    Json(json!({ "active_state": active }))
}

async fn status(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "active_state": state.gate.is_active() }))
}

async fn records(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({ "records": state.ledger.snapshot() }))
}

async fn dashboard(State(state): State<AppState>) -> Html<String> {
    let active = state.gate.is_active();
    let outcomes = state.ledger.snapshot();

    let mut rows = String::new();
    for outcome in &outcomes {
        let (status, detail) = match &outcome.error {
            Some(detail) => ("error", escape(detail)),
            None => ("success", String::new()),
        };
        rows.push_str(&format!(
            "<tr><td>{}</td><td class=\"{status}\">{status}</td><td>{detail}</td></tr>\n",
            outcome.nrocentral
        ));
    }

    Html(format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<title>Ventas Sync</title>\n<style>\n\
         body {{ font-family: sans-serif; margin: 2em; }}\n\
         table {{ border-collapse: collapse; }}\n\
         td, th {{ border: 1px solid #ccc; padding: 4px 12px; }}\n\
         .success {{ color: green; }}\n\
         .error {{ color: red; }}\n\
         </style>\n</head>\n<body>\n\
         <h1>Ventas Sync</h1>\n\
         <p>Replication is <strong>{}</strong> ({} outcomes recorded)</p>\n\
         <table>\n<tr><th>nrocentral</th><th>status</th><th>detail</th></tr>\n{rows}</table>\n\
         </body>\n</html>\n",
        if active { "active" } else { "paused" },
        outcomes.len()
    ))
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
