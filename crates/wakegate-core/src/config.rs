use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_BIND: &str = "0.0.0.0";
/// Poll period of the schedule loop, in seconds.
pub const DEFAULT_POLL_SECS: u64 = 5;

/// Top-level config (wakegate.toml + WAKEGATE_* env overrides).
///
/// Every field has a default so the daemon starts with no config file at all;
/// the defaults are only useful for local smoke testing, so operators are
/// expected to set at least `host.name` and `host.mac`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WakegateConfig {
    #[serde(default)]
    pub host: HostConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub schedule: ScheduleSettings,
}

/// The single managed host: reachability name, SSH identity and MAC address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Hostname or IP used for ping probes and SSH.
    #[serde(default = "default_host_name")]
    pub name: String,
    /// SSH user for the remote shutdown command.
    #[serde(default = "default_user")]
    pub user: String,
    /// MAC address the Wake-on-LAN packet is addressed to.
    #[serde(default = "default_mac")]
    pub mac: String,
    /// SSH password for the remote shutdown. Never put this in the TOML file;
    /// set WAKEGATE_HOST_PASSWORD instead. Auto-shutdown stays disabled while
    /// it is unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            name: default_host_name(),
            user: default_user(),
            mac: default_mac(),
            password: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            port: DEFAULT_PORT,
        }
    }
}

/// Tunables of the schedule engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Path of the persisted schedule document (single JSON object).
    #[serde(default = "default_schedule_path")]
    pub path: String,
    /// Tick period of the poller in seconds.
    #[serde(default = "default_poll_secs")]
    pub interval: u64,
    /// Trigger tolerance in minutes. 0 means a trigger fires only when the
    /// wall clock equals startTime/endTime to the exact minute; N widens the
    /// match to N minutes after the configured time.
    #[serde(default)]
    pub grace: u32,
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            path: default_schedule_path(),
            interval: DEFAULT_POLL_SECS,
            grace: 0,
        }
    }
}

fn default_host_name() -> String {
    "server".to_string()
}
fn default_user() -> String {
    "root".to_string()
}
fn default_mac() -> String {
    "aa:aa:aa:aa:aa:aa".to_string()
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_schedule_path() -> String {
    "schedule.json".to_string()
}
fn default_poll_secs() -> u64 {
    DEFAULT_POLL_SECS
}

impl WakegateConfig {
    /// Load config from a TOML file with WAKEGATE_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ./wakegate.toml
    ///
    /// A missing file is not an error — defaults plus env overrides apply.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or("wakegate.toml");

        let config: WakegateConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("WAKEGATE_").split("_"))
            .extract()
            .map_err(|e| crate::error::WakegateError::Config(e.to_string()))?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = WakegateConfig::default();
        assert_eq!(config.host.name, "server");
        assert_eq!(config.host.user, "root");
        assert_eq!(config.host.mac, "aa:aa:aa:aa:aa:aa");
        assert!(config.host.password.is_none());
        assert_eq!(config.gateway.port, DEFAULT_PORT);
        assert_eq!(config.schedule.interval, DEFAULT_POLL_SECS);
        assert_eq!(config.schedule.grace, 0);
        assert_eq!(config.schedule.path, "schedule.json");
    }

    #[test]
    fn partial_toml_keeps_defaults_for_the_rest() {
        let config: WakegateConfig = Figment::new()
            .merge(figment::providers::Toml::string(
                r#"
                [host]
                name = "nas"
                mac = "00:11:22:33:44:55"

                [schedule]
                grace = 2
                "#,
            ))
            .extract()
            .unwrap();
        assert_eq!(config.host.name, "nas");
        assert_eq!(config.host.user, "root");
        assert_eq!(config.schedule.grace, 2);
        assert_eq!(config.schedule.interval, DEFAULT_POLL_SECS);
    }
}
