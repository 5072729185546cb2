//! Console stop flag.
//!
//! Triggering flips a watch flag once. Every [`ShutdownSignal`] resolves after
//! the flip, including signals taken after it happened, so a console that
//! starts late still stops.

use std::sync::Arc;
use tokio::sync::watch;

/// Owner side of the stop flag. Clones share the flag.
#[derive(Debug, Clone)]
pub struct Shutdown {
    stopped: Arc<watch::Sender<bool>>,
}

/// Waiter side, handed to `console::serve`.
#[derive(Debug)]
pub struct ShutdownSignal(watch::Receiver<bool>);

impl Shutdown {
    pub fn new() -> Self {
        let (stopped, _) = watch::channel(false);
        Self {
            stopped: Arc::new(stopped),
        }
    }

    pub fn signal(&self) -> ShutdownSignal {
        ShutdownSignal(self.stopped.subscribe())
    }

    /// Idempotent; only the first call logs.
    pub fn trigger(&self) {
        if !self.stopped.send_replace(true) {
            tracing::info!("Console stop requested");
        }
    }

    pub fn is_triggered(&self) -> bool {
        *self.stopped.borrow()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

impl ShutdownSignal {
    /// Resolve once the flag is set. Dropping every [`Shutdown`] counts as
    /// a trigger.
    pub async fn fired(mut self) {
        let _ = self.0.wait_for(|stopped| *stopped).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_signal_waits_for_trigger() {
        let shutdown = Shutdown::new();
        let pending = timeout(Duration::from_millis(20), shutdown.signal().fired()).await;
        assert!(pending.is_err());

        let signal = shutdown.signal();
        shutdown.trigger();
        assert!(timeout(Duration::from_millis(100), signal.fired()).await.is_ok());
    }

    #[tokio::test]
    async fn test_late_signal_sees_earlier_trigger() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
        assert!(shutdown.is_triggered());

        let late = shutdown.clone().signal();
        assert!(timeout(Duration::from_millis(100), late.fired()).await.is_ok());
    }

    #[tokio::test]
    async fn test_dropped_owner_releases_waiters() {
        let shutdown = Shutdown::new();
        let signal = shutdown.signal();
        drop(shutdown);
        assert!(timeout(Duration::from_millis(100), signal.fired()).await.is_ok());
    }
}
