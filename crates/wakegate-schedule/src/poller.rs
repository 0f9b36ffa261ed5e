//! Background loop driving the evaluator against the real clock.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use tokio::sync::watch;
use tracing::{error, info, warn};

use wakegate_host::{with_retries, HostControl, RetryPolicy};

use crate::manager::ScheduleManager;
use crate::types::Action;

const MAX_ATTEMPTS: u32 = 3;
/// Delay between failed boot attempts.
const BOOT_BACKOFF: Duration = Duration::from_secs(1);
/// How long to wait after a wake packet before probing whether it worked.
const BOOT_PROBE_DELAY: Duration = Duration::from_secs(3);
/// Delay between failed shutdown attempts.
const SHUTDOWN_BACKOFF: Duration = Duration::from_secs(3);

/// Perpetual tick loop: evaluate, act with bounded retries, persist.
///
/// The first tick fires immediately so a process restart near a trigger
/// minute is evaluated right away instead of waiting a full period.
pub struct SchedulePoller {
    manager: Arc<ScheduleManager>,
    host: Arc<dyn HostControl>,
    interval: Duration,
    password: Option<String>,
}

impl SchedulePoller {
    pub fn new(
        manager: Arc<ScheduleManager>,
        host: Arc<dyn HostControl>,
        interval: Duration,
        password: Option<String>,
    ) -> Self {
        Self {
            manager,
            host,
            interval,
            password,
        }
    }

    /// Run until `shutdown` broadcasts `true`.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_secs = self.interval.as_secs(), "schedule poller started");

        let mut ticker = tokio::time::interval(self.interval);
        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick().await,
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        info!("schedule poller shutting down");
                        break;
                    }
                }
            }
        }
    }

    /// One tick. Every failure path in here logs and returns instead of
    /// propagating, so a single bad evaluation or flaky command can never
    /// terminate the loop.
    async fn tick(&self) {
        let host_online = self.host.is_online().await;
        let now = Local::now();

        match self.manager.evaluate_tick(now, host_online) {
            Action::None => {}
            Action::Boot => self.boot_with_retries().await,
            Action::Shutdown => self.shutdown_with_retries().await,
        }
    }

    /// A boot attempt only counts once the host answers a probe — the wake
    /// packet itself is fire-and-forget.
    async fn boot_with_retries(&self) {
        info!("start time reached, initiating boot sequence");
        let host = Arc::clone(&self.host);
        let booted = with_retries(
            RetryPolicy::new(MAX_ATTEMPTS, BOOT_BACKOFF),
            "boot",
            move |attempt| {
                let host = Arc::clone(&host);
                async move {
                    if let Err(e) = host.wake().await {
                        warn!(attempt, error = %e, "wake command failed");
                    }
                    tokio::time::sleep(BOOT_PROBE_DELAY).await;
                    host.is_online().await
                }
            },
        )
        .await;

        if booted {
            info!("host booted by schedule");
        } else {
            error!("host did not come online after boot attempts");
        }
    }

    async fn shutdown_with_retries(&self) {
        // The evaluator only emits Shutdown when a credential is configured;
        // this guard covers the remaining construction mistakes.
        let Some(password) = self.password.clone() else {
            error!("shutdown requested but no password is configured");
            return;
        };

        info!("end time reached, attempting auto-shutdown");
        let host = Arc::clone(&self.host);
        let ok = with_retries(
            RetryPolicy::new(MAX_ATTEMPTS, SHUTDOWN_BACKOFF),
            "shutdown",
            move |attempt| {
                let host = Arc::clone(&host);
                let password = password.clone();
                async move {
                    match host.shutdown(&password).await {
                        Ok(()) => true,
                        Err(e) => {
                            warn!(attempt, error = %e, "shutdown command failed");
                            false
                        }
                    }
                }
            },
        )
        .await;

        if ok {
            info!("auto-shutdown initiated");
        } else {
            error!("all auto-shutdown attempts failed");
        }
    }
}
