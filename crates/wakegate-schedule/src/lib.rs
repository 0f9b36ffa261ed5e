//! `wakegate-schedule` — the schedule engine.
//!
//! # Overview
//!
//! One host, one binary power state, one recurring window. The persisted
//! [`ScheduleConfig`] names a boot minute (`startTime`) and a shutdown minute
//! (`endTime`); [`evaluator::decide`] is the pure function that maps
//! `(config, now, online)` to an [`Action`], and the [`poller::SchedulePoller`]
//! drives it every few seconds, retrying failed boot/shutdown commands with a
//! bounded budget.
//!
//! All reads and writes of the config go through the single-writer
//! [`manager::ScheduleManager`], which also persists every state change to the
//! JSON document held by [`store::ScheduleStore`].

pub mod evaluator;
pub mod manager;
pub mod poller;
pub mod store;
pub mod types;

mod error;

pub use error::{Result, ScheduleError};
pub use manager::ScheduleManager;
pub use poller::SchedulePoller;
pub use store::ScheduleStore;
pub use types::{Action, Frequency, ScheduleConfig};

#[cfg(test)]
pub(crate) mod test_support;
