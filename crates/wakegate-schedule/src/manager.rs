//! Single-writer owner of the in-memory schedule configuration.
//!
//! Both writers — the background poller and the HTTP replacement interface —
//! go through this struct's mutex, which removes the lost-update race a pair
//! of free-running read-modify-write paths would have. Readers always get a
//! cloned snapshot.

use chrono::{DateTime, Local};
use std::str::FromStr;
use std::sync::Mutex;
use tracing::{error, info, warn};

use wakegate_host::HostControl;

use crate::error::{Result, ScheduleError};
use crate::evaluator;
use crate::store::ScheduleStore;
use crate::types::{Action, Frequency, ScheduleConfig};

pub struct ScheduleManager {
    store: ScheduleStore,
    config: Mutex<ScheduleConfig>,
    grace_minutes: u32,
    /// Whether a shutdown password is configured; gates auto-shutdown both
    /// in the evaluator and when accepting a replacement document.
    credential_set: bool,
}

impl ScheduleManager {
    /// Load the persisted document (or defaults) and take ownership of it.
    ///
    /// A corrupt document is logged and replaced by defaults in memory —
    /// startup never fails on bad schedule data.
    pub fn new(store: ScheduleStore, grace_minutes: u32, credential_set: bool) -> Self {
        let config = store.load().unwrap_or_else(|e| {
            warn!(error = %e, "schedule load failed, starting with defaults");
            ScheduleConfig::default()
        });
        info!(
            enabled = config.enabled,
            start = %config.start_time,
            end = %config.end_time,
            frequency = %config.frequency,
            auto_shutdown = config.auto_shutdown,
            "schedule configuration loaded"
        );
        Self {
            store,
            config: Mutex::new(config),
            grace_minutes,
            credential_set,
        }
    }

    /// Snapshot of the current configuration.
    pub fn current(&self) -> ScheduleConfig {
        self.config.lock().unwrap().clone()
    }

    pub fn credential_set(&self) -> bool {
        self.credential_set
    }

    /// Full-document replacement from the configuration-update interface.
    ///
    /// When the new document is enabled, its times and frequency must be
    /// valid and auto-shutdown requires a configured password; invalid
    /// documents are rejected without touching the current state. Accepted
    /// documents are persisted before the in-memory copy is swapped.
    pub fn replace(&self, new: ScheduleConfig) -> Result<ScheduleConfig> {
        if new.enabled {
            if new.start().is_none() {
                return Err(ScheduleError::InvalidTime {
                    field: "startTime",
                    value: new.start_time.clone(),
                });
            }
            if new.end().is_none() {
                return Err(ScheduleError::InvalidTime {
                    field: "endTime",
                    value: new.end_time.clone(),
                });
            }
            Frequency::from_str(&new.frequency)
                .map_err(|_| ScheduleError::InvalidFrequency(new.frequency.clone()))?;
            if new.auto_shutdown && !self.credential_set {
                return Err(ScheduleError::CredentialMissing);
            }
        }

        let mut guard = self.config.lock().unwrap();
        self.store.save(&new)?;
        *guard = new;
        info!(
            enabled = guard.enabled,
            start = %guard.start_time,
            end = %guard.end_time,
            frequency = %guard.frequency,
            "schedule configuration replaced"
        );
        Ok(guard.clone())
    }

    /// One evaluation step: run the decision function against the owned
    /// config and persist it when the evaluation mutated it.
    ///
    /// A persist failure is logged and swallowed — the in-memory copy stays
    /// authoritative for the running process even if the on-disk document is
    /// now stale.
    pub fn evaluate_tick(&self, now: DateTime<Local>, host_online: bool) -> Action {
        let mut guard = self.config.lock().unwrap();
        let before = guard.clone();
        let action = evaluator::decide(
            &mut guard,
            now,
            host_online,
            self.credential_set,
            self.grace_minutes,
        );
        if *guard != before {
            if let Err(e) = self.store.save(&guard) {
                error!(error = %e, "failed to persist schedule state");
            }
        }
        action
    }

    /// Startup verification pass.
    ///
    /// Re-validates times and frequency on an enabled schedule, coercing to
    /// safe values and persisting the repair. Then, if the startup moment
    /// already matches the boot minute, fires the boot immediately so a
    /// restart at exactly `startTime` does not wait a full cycle.
    pub async fn verify_and_repair(&self, now: DateTime<Local>, host: &dyn HostControl) {
        {
            let mut guard = self.config.lock().unwrap();
            if !guard.enabled {
                return;
            }

            let mut repaired = false;
            if guard.start().is_none() || guard.end().is_none() {
                warn!(
                    start = %guard.start_time,
                    end = %guard.end_time,
                    "invalid time format in schedule configuration, disabling schedule"
                );
                guard.enabled = false;
                repaired = true;
            }
            if Frequency::from_str(&guard.frequency).is_err() {
                warn!(
                    frequency = %guard.frequency,
                    "invalid frequency in schedule configuration, setting to daily"
                );
                guard.frequency = Frequency::Daily.to_string();
                repaired = true;
            }
            if repaired {
                if let Err(e) = self.store.save(&guard) {
                    error!(error = %e, "failed to persist repaired schedule");
                }
            }
            if !guard.enabled {
                return;
            }
        }

        // Startup moment may itself be the boot minute.
        let online = host.is_online().await;
        if let Action::Boot = self.evaluate_tick(now, online) {
            info!("startup time matches start time exactly, attempting boot");
            if let Err(e) = host.wake().await {
                warn!(error = %e, "startup boot failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::FakeHost;
    use chrono::TimeZone;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn local(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 10, h, m, 0).unwrap()
    }

    fn manager_with(config: ScheduleConfig, credential_set: bool) -> (ScheduleManager, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let store = ScheduleStore::new(dir.path().join("schedule.json"));
        store.save(&config).unwrap();
        (ScheduleManager::new(store, 0, credential_set), dir)
    }

    fn enabled_config() -> ScheduleConfig {
        ScheduleConfig {
            enabled: true,
            start_time: "02:00".to_string(),
            end_time: "06:00".to_string(),
            frequency: "daily".to_string(),
            auto_shutdown: true,
            ..Default::default()
        }
    }

    #[test]
    fn replace_rejects_bad_start_time() {
        let (manager, _dir) = manager_with(ScheduleConfig::default(), true);
        let bad = ScheduleConfig {
            start_time: "2am".to_string(),
            ..enabled_config()
        };
        let err = manager.replace(bad).unwrap_err();
        assert!(matches!(err, ScheduleError::InvalidTime { field: "startTime", .. }));
        assert!(err.is_rejection());
    }

    #[test]
    fn replace_rejects_unknown_frequency() {
        let (manager, _dir) = manager_with(ScheduleConfig::default(), true);
        let bad = ScheduleConfig {
            frequency: "hourly".to_string(),
            ..enabled_config()
        };
        assert!(matches!(
            manager.replace(bad).unwrap_err(),
            ScheduleError::InvalidFrequency(_)
        ));
    }

    #[test]
    fn replace_rejects_auto_shutdown_without_password() {
        let (manager, _dir) = manager_with(ScheduleConfig::default(), false);
        assert!(matches!(
            manager.replace(enabled_config()).unwrap_err(),
            ScheduleError::CredentialMissing
        ));
    }

    #[test]
    fn replace_accepts_disabled_config_without_validation() {
        // A disabled document may carry garbage times; validation only
        // applies when the schedule is switched on.
        let (manager, _dir) = manager_with(ScheduleConfig::default(), false);
        let sloppy = ScheduleConfig {
            enabled: false,
            start_time: "whenever".to_string(),
            ..Default::default()
        };
        let accepted = manager.replace(sloppy.clone()).unwrap();
        assert_eq!(accepted, sloppy);
        assert_eq!(manager.current(), sloppy);
    }

    #[test]
    fn replace_persists_the_new_document() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        let manager = ScheduleManager::new(ScheduleStore::new(&path), 0, true);

        manager.replace(enabled_config()).unwrap();

        let on_disk = ScheduleStore::new(&path).load().unwrap();
        assert_eq!(on_disk, enabled_config());
    }

    #[test]
    fn evaluate_tick_persists_mutations() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("schedule.json");
        let store = ScheduleStore::new(&path);
        store.save(&enabled_config()).unwrap();
        let manager = ScheduleManager::new(store, 0, true);

        assert_eq!(manager.evaluate_tick(local(2, 0), false), Action::Boot);

        let on_disk = ScheduleStore::new(&path).load().unwrap();
        assert!(on_disk.started_by_schedule);
        assert!(!on_disk.last_run.is_empty());
    }

    #[test]
    fn evaluate_tick_does_not_rewrite_unchanged_config() {
        let (manager, dir) = manager_with(enabled_config(), true);
        let path = dir.path().join("schedule.json");
        let before = std::fs::metadata(&path).unwrap().modified().unwrap();

        // Mid-window tick mutates nothing.
        assert_eq!(manager.evaluate_tick(local(4, 0), false), Action::None);

        let after = std::fs::metadata(&path).unwrap().modified().unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn verify_disables_schedule_with_bad_times() {
        let bad = ScheduleConfig {
            start_time: "99:99".to_string(),
            ..enabled_config()
        };
        let (manager, _dir) = manager_with(bad, true);
        let host = FakeHost::offline();

        manager.verify_and_repair(local(12, 0), &host).await;

        assert!(!manager.current().enabled);
        assert_eq!(host.wakes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn verify_coerces_unknown_frequency_to_daily() {
        let odd = ScheduleConfig {
            frequency: "fortnightly".to_string(),
            ..enabled_config()
        };
        let (manager, _dir) = manager_with(odd, true);
        let host = FakeHost::offline();

        manager.verify_and_repair(local(12, 0), &host).await;

        assert_eq!(manager.current().frequency, "daily");
    }

    #[tokio::test]
    async fn verify_boots_when_startup_hits_the_start_minute() {
        let (manager, _dir) = manager_with(enabled_config(), true);
        let host = FakeHost::offline();

        manager.verify_and_repair(local(2, 0), &host).await;

        assert_eq!(host.wakes.load(Ordering::SeqCst), 1);
        assert!(manager.current().started_by_schedule);
    }

    #[test]
    fn concurrent_replace_and_ticks_keep_disk_and_memory_in_sync() {
        let (manager, dir) = manager_with(enabled_config(), true);
        let manager = std::sync::Arc::new(manager);

        let mut handles = Vec::new();
        for worker in 0..4u32 {
            let manager = std::sync::Arc::clone(&manager);
            handles.push(std::thread::spawn(move || {
                for round in 0..25u32 {
                    if worker % 2 == 0 {
                        let replacement = ScheduleConfig {
                            start_time: format!("{:02}:00", round % 24),
                            ..enabled_config()
                        };
                        manager.replace(replacement).unwrap();
                    } else {
                        manager.evaluate_tick(local(2, 0), false);
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        // Whatever interleaving happened, the persisted document matches the
        // in-memory one once everything quiesces.
        let on_disk = ScheduleStore::new(dir.path().join("schedule.json"))
            .load()
            .unwrap();
        assert_eq!(on_disk, manager.current());
    }

    #[tokio::test]
    async fn verify_is_a_no_op_for_disabled_schedules() {
        let (manager, _dir) = manager_with(ScheduleConfig::default(), true);
        let host = FakeHost::offline();

        manager.verify_and_repair(local(2, 0), &host).await;

        assert_eq!(host.wakes.load(Ordering::SeqCst), 0);
        assert_eq!(manager.current(), ScheduleConfig::default());
    }
}
