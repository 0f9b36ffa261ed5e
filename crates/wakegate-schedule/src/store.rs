//! Durable single-document store for the schedule configuration.

use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::error::Result;
use crate::types::ScheduleConfig;

/// One JSON file, full-document load and save.
///
/// Saves go through a temp file plus rename so a crash mid-write never
/// leaves a half-written document behind.
pub struct ScheduleStore {
    path: PathBuf,
}

impl ScheduleStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Read the persisted document; when absent, write and return defaults.
    pub fn load(&self) -> Result<ScheduleConfig> {
        if !self.path.exists() {
            let config = ScheduleConfig::default();
            self.save(&config)?;
            info!(path = %self.path.display(), "no schedule document found, created default");
            return Ok(config);
        }

        let raw = fs::read_to_string(&self.path)?;
        let config: ScheduleConfig = serde_json::from_str(&raw)?;
        debug!(
            path = %self.path.display(),
            enabled = config.enabled,
            start = %config.start_time,
            end = %config.end_time,
            frequency = %config.frequency,
            "schedule document loaded"
        );
        Ok(config)
    }

    /// Overwrite the document atomically (write temp file, then rename).
    pub fn save(&self, config: &ScheduleConfig) -> Result<()> {
        let data = serde_json::to_string_pretty(config)?;

        let mut tmp = self.path.as_os_str().to_owned();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, data)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
