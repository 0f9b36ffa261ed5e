use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tracing::info;

use wakegate_host::{check_required_tools, CommandHostControl, HostControl};
use wakegate_schedule::{ScheduleManager, SchedulePoller, ScheduleStore};

mod app;
mod http;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "wakegate=info,tower_http=debug".into()),
        )
        .init();

    // load config: explicit path via WAKEGATE_CONFIG > ./wakegate.toml
    let config_path = std::env::var("WAKEGATE_CONFIG").ok();
    let config = wakegate_core::config::WakegateConfig::load(config_path.as_deref())
        .unwrap_or_else(|e| {
            tracing::warn!("Config load failed ({}), using defaults", e);
            wakegate_core::config::WakegateConfig::default()
        });

    info!(
        host = %config.host.name,
        mac = %config.host.mac,
        password_set = config.host.password.is_some(),
        "managing host"
    );
    check_required_tools();

    let host: Arc<dyn HostControl> = Arc::new(CommandHostControl::new(
        config.host.name.clone(),
        config.host.user.clone(),
        config.host.mac.clone(),
    ));

    let store = ScheduleStore::new(&config.schedule.path);
    let manager = Arc::new(ScheduleManager::new(
        store,
        config.schedule.grace,
        config.host.password.is_some(),
    ));

    // Repair stale or invalid schedule state before the first tick.
    manager.verify_and_repair(Local::now(), host.as_ref()).await;

    // spawn the schedule poller loop in background
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let poller = SchedulePoller::new(
        Arc::clone(&manager),
        Arc::clone(&host),
        Duration::from_secs(config.schedule.interval),
        config.host.password.clone(),
    );
    let poller_task = tokio::spawn(async move { poller.run(shutdown_rx).await });

    let bind = config.gateway.bind.clone();
    let port = config.gateway.port;
    let state = Arc::new(app::AppState::new(config, manager, host));
    let router = app::build_router(state);

    let addr: SocketAddr = format!("{}:{}", bind, port).parse()?;
    info!("Wakegate gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(flip_on_shutdown(
            tokio::signal::ctrl_c(),
            shutdown_tx.clone(),
        ))
        .await?;

    // The signal future already flipped the channel; sending again is a
    // no-op and covers the serve-error exit path.
    let _ = shutdown_tx.send(true);
    let _ = poller_task.await;
    info!("shutdown complete");
    Ok(())
}

/// Resolves once `signal` fires, flipping the poller's shutdown channel so
/// the HTTP server and the tick loop stop together. If the signal handler
/// cannot be registered the server keeps running until the process is
/// killed.
async fn flip_on_shutdown<S>(signal: S, shutdown_tx: tokio::sync::watch::Sender<bool>)
where
    S: std::future::Future<Output = std::io::Result<()>>,
{
    match signal.await {
        Ok(()) => info!("ctrl-c received, shutting down"),
        Err(e) => {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    }
    let _ = shutdown_tx.send(true);
}
