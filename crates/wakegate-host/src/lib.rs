//! `wakegate-host` — power primitives for the managed host.
//!
//! Three operations, each a single subprocess invocation with only
//! success/failure as the observable outcome:
//!
//! | Operation      | Tool chain                              |
//! |----------------|-----------------------------------------|
//! | `is_online`    | `ping` (one probe, 1 s deadline)        |
//! | `wake`         | `wakeonlan` → `etherwake` → `wol`       |
//! | `shutdown`     | `sshpass`+`ssh` → `ssh` (password stdin)|
//! | `check_access` | `sshpass`+`ssh` remote `echo`           |
//!
//! Callers depend on the [`HostControl`] trait so tests can substitute an
//! in-memory fake. [`retry::with_retries`] is the shared bounded-retry
//! combinator for boot and shutdown attempts.

pub mod control;
pub mod error;
pub mod retry;

pub use control::{check_required_tools, CommandHostControl, HostControl};
pub use error::{HostError, Result};
pub use retry::{with_retries, RetryPolicy};
