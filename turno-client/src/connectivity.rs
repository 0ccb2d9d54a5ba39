//! Connectivity signal
//!
//! A boolean reachability notification. The platform layer feeds it
//! (OS reachability callbacks, ping probes); the sync engine and the
//! submission pipeline consume it to decide between an immediate online
//! attempt and a direct enqueue.

use tokio::sync::watch;

/// Shared reachability flag; cloning shares the channel
#[derive(Clone)]
pub struct Connectivity {
    tx: watch::Sender<bool>,
}

impl Connectivity {
    pub fn new(initially_online: bool) -> Self {
        let (tx, _) = watch::channel(initially_online);
        Self { tx }
    }

    /// Record a reachability change; subscribers are only woken when the
    /// value actually changes
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current != online {
                *current = online;
                true
            } else {
                false
            }
        });
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Subscribe to reachability changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_changes() {
        let conn = Connectivity::new(false);
        let mut rx = conn.subscribe();
        assert!(!conn.is_online());

        conn.set_online(true);
        rx.changed().await.unwrap();
        assert!(*rx.borrow_and_update());

        // No wakeup when the value does not change
        conn.set_online(true);
        assert!(!rx.has_changed().unwrap());
    }
}
