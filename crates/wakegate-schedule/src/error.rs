use thiserror::Error;

/// Errors from the schedule engine and its store.
#[derive(Debug, Error)]
pub enum ScheduleError {
    /// Reading or writing the persisted schedule document failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// A time field does not parse as 24-hour `HH:MM`.
    #[error("Invalid {field} '{value}': use 24-hour format (HH:MM)")]
    InvalidTime { field: &'static str, value: String },

    #[error("Invalid frequency '{0}': use 'daily', 'every2days', 'weekly', or 'monthly'")]
    InvalidFrequency(String),

    /// Auto-shutdown was requested while no shutdown password is configured.
    #[error("shutdown password not configured — set WAKEGATE_HOST_PASSWORD before enabling auto-shutdown")]
    CredentialMissing,
}

impl ScheduleError {
    /// True for errors caused by the submitted document rather than the
    /// system — the HTTP layer maps these to 400.
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            ScheduleError::InvalidTime { .. }
                | ScheduleError::InvalidFrequency(_)
                | ScheduleError::CredentialMissing
        )
    }
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
