use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use wakegate_core::config::WakegateConfig;
use wakegate_host::HostControl;
use wakegate_schedule::ScheduleManager;

/// Central shared state — passed as Arc<AppState> to all Axum handlers.
pub struct AppState {
    pub config: WakegateConfig,
    pub manager: Arc<ScheduleManager>,
    pub host: Arc<dyn HostControl>,
}

impl AppState {
    pub fn new(
        config: WakegateConfig,
        manager: Arc<ScheduleManager>,
        host: Arc<dyn HostControl>,
    ) -> Self {
        Self {
            config,
            manager,
            host,
        }
    }
}

/// Assemble the full Axum router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(crate::http::health::health_handler))
        .route("/api/status", get(crate::http::status::status_handler))
        .route(
            "/api/schedule",
            get(crate::http::schedule::get_schedule).post(crate::http::schedule::put_schedule),
        )
        .route("/api/boot", post(crate::http::power::boot_handler))
        .route("/api/shutdown", post(crate::http::power::shutdown_handler))
        .with_state(state)
        .layer(tower_http::cors::CorsLayer::permissive())
        .layer(tower_http::trace::TraceLayer::new_for_http())
}
