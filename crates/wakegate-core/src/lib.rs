//! `wakegate-core` — shared configuration and error types.
//!
//! Every other crate in the workspace depends on this one for the
//! [`config::WakegateConfig`] loaded from `wakegate.toml` plus `WAKEGATE_*`
//! environment overrides.

pub mod config;
pub mod error;

pub use config::WakegateConfig;
pub use error::{Result, WakegateError};
