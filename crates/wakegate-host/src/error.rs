use thiserror::Error;

/// Errors from the host power primitives.
#[derive(Debug, Error)]
pub enum HostError {
    /// The tool binary could not be spawned at all.
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: std::io::Error,
    },

    /// The tool ran but exited non-zero.
    #[error("{tool} exited with status {code}: {stderr}")]
    CommandFailed {
        tool: String,
        code: i32,
        stderr: String,
    },

    /// No Wake-on-LAN tool is installed.
    #[error("no Wake-on-LAN tool found on PATH (install wakeonlan, etherwake, or wol)")]
    WolToolMissing,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, HostError>;
