//! In-memory fake of the host primitives for manager and poller tests.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use async_trait::async_trait;
use wakegate_host::{HostControl, HostError};

/// Scriptable [`HostControl`]: online state is a flag, wake/shutdown count
/// their invocations and can be told to fail.
pub struct FakeHost {
    pub online: AtomicBool,
    /// When true, a wake call flips `online` on (a host that boots cleanly).
    pub wake_brings_online: AtomicBool,
    pub fail_shutdowns: AtomicU32,
    pub wakes: AtomicU32,
    pub shutdowns: AtomicU32,
}

impl FakeHost {
    pub fn offline() -> Self {
        Self {
            online: AtomicBool::new(false),
            wake_brings_online: AtomicBool::new(true),
            fail_shutdowns: AtomicU32::new(0),
            wakes: AtomicU32::new(0),
            shutdowns: AtomicU32::new(0),
        }
    }

    pub fn online() -> Self {
        let host = Self::offline();
        host.online.store(true, Ordering::SeqCst);
        host
    }
}

#[async_trait]
impl HostControl for FakeHost {
    async fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }

    async fn wake(&self) -> wakegate_host::Result<()> {
        self.wakes.fetch_add(1, Ordering::SeqCst);
        if self.wake_brings_online.load(Ordering::SeqCst) {
            self.online.store(true, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn shutdown(&self, _password: &str) -> wakegate_host::Result<()> {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        if self.fail_shutdowns.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| {
            n.checked_sub(1)
        }).is_ok()
        {
            return Err(HostError::CommandFailed {
                tool: "ssh".to_string(),
                code: 255,
                stderr: "connection refused".to_string(),
            });
        }
        self.online.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn check_access(&self, _password: &str) -> wakegate_host::Result<()> {
        Ok(())
    }
}
