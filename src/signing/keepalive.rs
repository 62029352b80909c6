//! Session keep-alive hook.
//!
//! Some hosts lose their wallet transport while a signing prompt is open
//! (mobile browsers suspending background tabs). The host can register a
//! hook that is started before each remote signing call and stopped after it.

use std::sync::Arc;

/// Host-provided keep-alive behaviour.
pub trait SessionKeepAlive: Send + Sync {
    fn start(&self);
    fn stop(&self);
}

/// Runs `start` on creation and `stop` on drop, including on error paths.
pub(crate) struct KeepAliveGuard {
    hook: Arc<dyn SessionKeepAlive>,
}

impl KeepAliveGuard {
    pub(crate) fn start(hook: Arc<dyn SessionKeepAlive>) -> Self {
        hook.start();
        Self { hook }
    }
}

impl Drop for KeepAliveGuard {
    fn drop(&mut self) {
        self.hook.stop();
    }
}
