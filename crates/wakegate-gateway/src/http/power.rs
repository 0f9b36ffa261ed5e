//! Manual power endpoints — POST /api/boot and POST /api/shutdown.
//!
//! These mirror what the schedule does automatically, minus the retries: a
//! human pressing the button can just press it again.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;

/// POST /api/boot — send a Wake-on-LAN packet to the managed host.
///
/// An already-online host is not an error; the response just says nothing
/// was done.
pub async fn boot_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    if state.host.is_online().await {
        return Ok(Json(json!({
            "success": false,
            "message": "host is already online",
        })));
    }

    match state.host.wake().await {
        Ok(()) => {
            info!("manual boot requested, wake packet sent");
            Ok(Json(json!({
                "success": true,
                "message": "wake packet sent",
            })))
        }
        Err(e) => {
            warn!(error = %e, "manual boot failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"success": false, "error": e.to_string()})),
            ))
        }
    }
}

/// POST /api/shutdown — shut the host down over SSH with the configured
/// password.
///
/// Refused with 500 when no password is configured; an already-offline host
/// returns success=false without an attempt.
pub async fn shutdown_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(password) = state.config.host.password.clone() else {
        return Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "success": false,
                "error": "no shutdown password configured",
            })),
        ));
    };

    if !state.host.is_online().await {
        return Ok(Json(json!({
            "success": false,
            "error": "host is already offline",
        })));
    }

    match state.host.shutdown(&password).await {
        Ok(()) => {
            info!("manual shutdown initiated");
            Ok(Json(json!({
                "success": true,
                "message": "shutdown initiated",
            })))
        }
        Err(e) => {
            warn!(error = %e, "manual shutdown failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "success": false,
                    "error": format!("failed to shut down host: {e}"),
                })),
            ))
        }
    }
}
