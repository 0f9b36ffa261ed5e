//! Subprocess-backed implementation of the host power primitives.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::error::{HostError, Result};

/// Wake-on-LAN tools tried in order; the first one on PATH wins.
const WOL_TOOLS: &[&str] = &["wakeonlan", "etherwake", "wol"];

/// Boundary the schedule engine sees: reachability probe, boot, and
/// authenticated power-off. All three are black boxes with success/failure
/// as the only observable outcome.
#[async_trait]
pub trait HostControl: Send + Sync {
    /// Blocking reachability probe (one ping).
    async fn is_online(&self) -> bool;

    /// Send the Wake-on-LAN magic packet. Success means the packet was sent,
    /// not that the host came up — callers re-probe afterwards.
    async fn wake(&self) -> Result<()>;

    /// Run the remote shutdown command with the given SSH password.
    async fn shutdown(&self, password: &str) -> Result<()>;

    /// Probe that the SSH credential actually works by running a harmless
    /// remote command. Callers treat a failure as a warning, never a
    /// rejection.
    async fn check_access(&self, password: &str) -> Result<()>;
}

/// [`HostControl`] backed by the system's `ping`, WOL and SSH utilities.
pub struct CommandHostControl {
    host: String,
    user: String,
    mac: String,
}

impl CommandHostControl {
    pub fn new(host: impl Into<String>, user: impl Into<String>, mac: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            user: user.into(),
            mac: mac.into(),
        }
    }

    fn ssh_target(&self) -> String {
        format!("{}@{}", self.user, self.host)
    }
}

#[async_trait]
impl HostControl for CommandHostControl {
    async fn is_online(&self) -> bool {
        // macOS takes the ping deadline in milliseconds, Linux in seconds.
        let wait = if cfg!(target_os = "macos") { "1000" } else { "1" };
        let probe = Command::new("ping")
            .args(["-c", "1", "-W", wait, &self.host])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match probe {
            Ok(status) => {
                let online = status.success();
                debug!(host = %self.host, online, "ping probe");
                online
            }
            Err(e) => {
                warn!(host = %self.host, error = %e, "ping could not be spawned");
                false
            }
        }
    }

    async fn wake(&self) -> Result<()> {
        let tool = detect_wol_tool().ok_or(HostError::WolToolMissing)?;
        info!(host = %self.host, mac = %self.mac, %tool, "sending Wake-on-LAN packet");
        run(tool, &[&self.mac]).await
    }

    async fn shutdown(&self, password: &str) -> Result<()> {
        info!(host = %self.host, "sending shutdown command");

        let target = self.ssh_target();
        // sshpass handles the SSH password prompt; the trailing stdin write
        // feeds `sudo -S` on the remote side.
        if which::which("sshpass").is_ok() {
            let mut args: Vec<&str> = vec!["-p", password, "ssh"];
            args.extend_from_slice(SSH_OPTIONS);
            args.extend([target.as_str(), "sudo", "-S", "shutdown", "-h", "now"]);
            match run_with_stdin("sshpass", &args, password).await {
                Ok(()) => return Ok(()),
                Err(e) => warn!(error = %e, "sshpass shutdown failed, falling back to plain ssh"),
            }
        }

        // Plain ssh only works when key auth is set up for the sudo prompt;
        // the password still goes to `sudo -S` via stdin.
        let mut args: Vec<&str> = Vec::new();
        args.extend_from_slice(SSH_OPTIONS);
        args.extend([target.as_str(), "sudo", "-S", "shutdown", "-h", "now"]);
        run_with_stdin("ssh", &args, password).await
    }

    async fn check_access(&self, password: &str) -> Result<()> {
        debug!(host = %self.host, "testing SSH access");
        let target = self.ssh_target();
        if which::which("sshpass").is_ok() {
            let mut args: Vec<&str> = vec!["-p", password, "ssh"];
            args.extend_from_slice(SSH_OPTIONS);
            args.extend([target.as_str(), "echo", "ok"]);
            return run("sshpass", &args).await;
        }
        // Without sshpass the probe can only exercise key auth.
        let mut args: Vec<&str> = Vec::new();
        args.extend_from_slice(SSH_OPTIONS);
        args.extend([target.as_str(), "echo", "ok"]);
        run("ssh", &args).await
    }
}

const SSH_OPTIONS: &[&str] = &[
    "-o",
    "StrictHostKeyChecking=no",
    "-o",
    "UserKnownHostsFile=/dev/null",
    "-o",
    "LogLevel=ERROR",
    "-o",
    "ConnectTimeout=10",
];

/// First installed Wake-on-LAN tool, or `None` when nothing is on PATH.
fn detect_wol_tool() -> Option<&'static str> {
    WOL_TOOLS.iter().copied().find(|t| which::which(t).is_ok())
}

/// Log a startup warning for each required external tool that is missing.
/// Never fatal — the corresponding operation will fail at call time instead.
pub fn check_required_tools() {
    match detect_wol_tool() {
        Some(tool) => info!(%tool, "Wake-on-LAN tool found"),
        None => warn!("no Wake-on-LAN tool found on PATH — install wakeonlan, etherwake, or wol"),
    }
    if which::which("ping").is_err() {
        warn!("ping not found on PATH — online checks will fail");
    }
    if which::which("sshpass").is_err() {
        warn!("sshpass not found on PATH — remote shutdown will rely on SSH key auth");
    }
}

/// Run `tool` with `args`, mapping a non-zero exit status to `CommandFailed`.
async fn run(tool: &str, args: &[&str]) -> Result<()> {
    let output = Command::new(tool)
        .args(args)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| HostError::Spawn {
            tool: tool.to_string(),
            source: e,
        })?;
    check_output(tool, &output)
}

/// Like [`run`], but writes `input` plus a newline to the child's stdin.
async fn run_with_stdin(tool: &str, args: &[&str], input: &str) -> Result<()> {
    let mut child = Command::new(tool)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| HostError::Spawn {
            tool: tool.to_string(),
            source: e,
        })?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        // Closing stdin lets the remote `sudo -S` read EOF after the password.
    }

    let output = child.wait_with_output().await?;
    check_output(tool, &output)
}

fn check_output(tool: &str, output: &std::process::Output) -> Result<()> {
    if output.status.success() {
        return Ok(());
    }
    Err(HostError::CommandFailed {
        tool: tool.to_string(),
        code: output.status.code().unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
    })
}
