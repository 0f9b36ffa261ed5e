use chrono::{DateTime, Local, NaiveTime};
use serde::{Deserialize, Serialize};

/// Wall-clock format of `startTime`/`endTime` (24-hour, minute granularity).
pub const TIME_FORMAT: &str = "%H:%M";

/// What a single evaluation decided must happen now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    None,
    Boot,
    Shutdown,
}

/// How often a completed cycle becomes eligible to run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Frequency {
    #[default]
    Daily,
    Every2Days,
    Weekly,
    Monthly,
}

impl std::fmt::Display for Frequency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Frequency::Daily => "daily",
            Frequency::Every2Days => "every2days",
            Frequency::Weekly => "weekly",
            Frequency::Monthly => "monthly",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Frequency {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "every2days" => Ok(Frequency::Every2Days),
            "weekly" => Ok(Frequency::Weekly),
            "monthly" => Ok(Frequency::Monthly),
            other => Err(format!("unknown frequency: {other}")),
        }
    }
}

/// The single persisted entity: one JSON document, full-document reads and
/// writes, exactly one in-memory copy per process (owned by the manager).
///
/// `frequency` and `lastRun` are kept as raw strings so a hand-edited or
/// stale document never fails to load; the typed accessors below apply the
/// permissive coercion rules (unknown frequency acts as daily, unparsable
/// lastRun as never-ran).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScheduleConfig {
    /// Master switch; when false the evaluator is a no-op.
    pub enabled: bool,
    /// Minute at which a boot should fire ("HH:MM", local wall clock).
    pub start_time: String,
    /// Minute at which an auto-shutdown should fire.
    pub end_time: String,
    /// "daily", "every2days", "weekly" or "monthly".
    pub frequency: String,
    /// RFC3339 instant the current cycle started; "" means eligible.
    pub last_run: String,
    /// Whether reaching endTime should trigger a shutdown.
    pub auto_shutdown: bool,
    /// True only when the current "on" state was caused by this scheduler.
    /// Gates auto-shutdown so manually booted machines are never auto-killed.
    pub started_by_schedule: bool,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            start_time: String::new(),
            end_time: String::new(),
            frequency: Frequency::Daily.to_string(),
            last_run: String::new(),
            auto_shutdown: false,
            started_by_schedule: false,
        }
    }
}

impl ScheduleConfig {
    /// Parsed `startTime`, `None` when empty or malformed.
    pub fn start(&self) -> Option<NaiveTime> {
        parse_hhmm(&self.start_time)
    }

    /// Parsed `endTime`, `None` when empty or malformed.
    pub fn end(&self) -> Option<NaiveTime> {
        parse_hhmm(&self.end_time)
    }

    /// Frequency with the unknown-value coercion applied (unknown ⇒ daily).
    pub fn freq(&self) -> Frequency {
        self.frequency.parse().unwrap_or_default()
    }

    /// Parsed `lastRun`; unparsable values are treated as never-ran.
    pub fn last_run_at(&self) -> Option<DateTime<Local>> {
        DateTime::parse_from_rfc3339(&self.last_run)
            .ok()
            .map(|dt| dt.with_timezone(&Local))
    }

    /// Record that the scheduler just started a cycle.
    pub fn mark_started(&mut self, now: DateTime<Local>) {
        self.started_by_schedule = true;
        self.last_run = now.to_rfc3339();
    }

    /// Close the current cycle so the next window is eligible again.
    pub fn clear_cycle(&mut self) {
        self.last_run.clear();
        self.started_by_schedule = false;
    }
}

pub(crate) fn parse_hhmm(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s, TIME_FORMAT).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn wire_field_names_are_camel_case() {
        let json = serde_json::to_string(&ScheduleConfig::default()).unwrap();
        for field in [
            "enabled",
            "startTime",
            "endTime",
            "frequency",
            "lastRun",
            "autoShutdown",
            "startedBySchedule",
        ] {
            assert!(json.contains(field), "missing wire field {field}");
        }
    }

    #[test]
    fn parses_original_document_shape() {
        let config: ScheduleConfig = serde_json::from_str(
            r#"{
                "enabled": true,
                "startTime": "02:00",
                "endTime": "06:00",
                "frequency": "weekly",
                "lastRun": "",
                "autoShutdown": true,
                "startedBySchedule": false
            }"#,
        )
        .unwrap();
        assert!(config.enabled);
        assert_eq!(config.freq(), Frequency::Weekly);
        assert_eq!(config.start().unwrap().hour(), 2);
        assert!(config.last_run_at().is_none());
    }

    #[test]
    fn unknown_frequency_coerces_to_daily() {
        let config = ScheduleConfig {
            frequency: "fortnightly".to_string(),
            ..Default::default()
        };
        assert_eq!(config.freq(), Frequency::Daily);
    }

    #[test]
    fn unparsable_last_run_acts_as_never_ran() {
        let config = ScheduleConfig {
            last_run: "not-a-timestamp".to_string(),
            ..Default::default()
        };
        assert!(config.last_run_at().is_none());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let config: ScheduleConfig = serde_json::from_str(r#"{"enabled": false}"#).unwrap();
        assert_eq!(config, ScheduleConfig::default());
    }

    #[test]
    fn frequency_round_trips_through_display_and_from_str() {
        for freq in [
            Frequency::Daily,
            Frequency::Every2Days,
            Frequency::Weekly,
            Frequency::Monthly,
        ] {
            assert_eq!(freq.to_string().parse::<Frequency>().unwrap(), freq);
        }
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn invalid_times_parse_to_none() {
        for bad in ["", "24:00", "12:60", "noon", "02:00:00"] {
            assert!(parse_hhmm(bad).is_none(), "{bad:?} should not parse");
        }
        assert!(parse_hhmm("00:00").is_some());
        assert!(parse_hhmm("23:59").is_some());
    }
}
