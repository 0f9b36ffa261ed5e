//! Schedule read/replace endpoints — GET and POST /api/schedule.

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

use crate::app::AppState;
use wakegate_host::HostControl;
use wakegate_schedule::ScheduleConfig;

/// GET /api/schedule — the current configuration document.
pub async fn get_schedule(State(state): State<Arc<AppState>>) -> Json<ScheduleConfig> {
    Json(state.manager.current())
}

/// POST /api/schedule — full-document replacement.
///
/// Validation only applies to enabled documents; a rejected document leaves
/// the current one untouched. Returns the now-current config on success.
pub async fn put_schedule(
    State(state): State<Arc<AppState>>,
    Json(new): Json<ScheduleConfig>,
) -> Result<Json<ScheduleConfig>, (StatusCode, Json<Value>)> {
    match state.manager.replace(new) {
        Ok(current) => {
            if current.enabled && current.auto_shutdown {
                if let Some(password) = state.config.host.password.as_deref() {
                    test_ssh_access(state.host.as_ref(), &state.config.host.name, password).await;
                }
            }
            Ok(Json(current))
        }
        Err(e) if e.is_rejection() => {
            warn!(error = %e, "schedule update rejected");
            Err((StatusCode::BAD_REQUEST, Json(json!({"error": e.to_string()}))))
        }
        Err(e) => {
            warn!(error = %e, "schedule update failed");
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            ))
        }
    }
}

/// Warn-only probe run when an accepted document enables auto-shutdown:
/// confirms the configured SSH password actually works before the schedule
/// relies on it. A failure never rejects the document.
async fn test_ssh_access(host: &dyn HostControl, name: &str, password: &str) {
    if !host.is_online().await {
        info!(host = %name, "host is offline, skipping SSH access test");
        return;
    }
    match host.check_access(password).await {
        Ok(()) => info!(host = %name, "SSH access test successful"),
        Err(e) => warn!(
            host = %name,
            error = %e,
            "SSH access test failed, auto-shutdown may not work"
        ),
    }
}
