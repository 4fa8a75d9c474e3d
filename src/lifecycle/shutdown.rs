//! Shutdown coordination for the guard.

use std::sync::Arc;
use tokio::sync::broadcast;

use crate::guard::ProxyGuard;

/// Coordinator for graceful shutdown.
///
/// Long-running tasks subscribe to a broadcast channel; `trigger` wakes all
/// of them at once.
pub struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// Final step once listeners have drained.
pub fn finish(guard: &Arc<ProxyGuard>) {
    guard.shutdown();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GuardConfig;

    #[tokio::test]
    async fn test_trigger_wakes_subscribers() {
        let shutdown = Shutdown::new();
        let mut a = shutdown.subscribe();
        let mut b = shutdown.subscribe();
        assert_eq!(shutdown.receiver_count(), 2);

        shutdown.trigger();
        assert!(a.recv().await.is_ok());
        assert!(b.recv().await.is_ok());
    }

    #[test]
    fn test_finish_shuts_guard_down() {
        let guard = Arc::new(ProxyGuard::new(GuardConfig::default()));
        finish(&guard);
        assert!(guard.is_shut_down());
        finish(&guard);
        assert!(guard.is_shut_down());
    }
}
