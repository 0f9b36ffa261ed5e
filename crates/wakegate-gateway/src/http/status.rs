use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use crate::app::AppState;

/// GET /api/status — host reachability snapshot plus the current schedule.
pub async fn status_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    let online = state.host.is_online().await;
    Json(json!({
        "host": state.config.host.name,
        "online": online,
        "schedule": state.manager.current(),
    }))
}
