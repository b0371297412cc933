use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;

/// One slot for a delayed action. Scheduling into an occupied slot cancels
/// whatever was waiting there, so at most one action is ever pending.
#[derive(Debug, Default)]
pub struct DelaySlot {
    handle: Option<JoinHandle<()>>,
}

impl DelaySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `action` after `delay` unless the slot is rescheduled or
    /// cancelled first. Must be called from within a tokio runtime.
    pub fn schedule<F>(&mut self, delay: Duration, action: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        self.handle = Some(tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            action.await;
        }));
    }

    pub fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn is_pending(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for DelaySlot {
    fn drop(&mut self) {
        self.cancel();
    }
}
