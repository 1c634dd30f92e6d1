// ============================
// crates/backend-lib/src/notifier.rs
// ============================
//! Best-effort broadcaster of the aggregate login count.
//!
//! Every push-channel connection subscribes here and receives a
//! [`LoginCount`] after each successful login. Sends never block: a listener
//! whose buffer is full misses the update, and a listener whose receiver is
//! gone is pruned.
use dashmap::DashMap;
use logincount_common::LoginCount;
use metrics::{counter, gauge};
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, trace};
use uuid::Uuid;

use crate::auth::LoginObserver;
use crate::metrics::{PUSH_ACTIVE, PUSH_DELIVERED, PUSH_DROPPED};

/// Per-listener buffer of pending updates
const LISTENER_BUFFER: usize = 16;

/// A live subscription; dropping the receiver closes it
pub struct Subscription {
    pub id: Uuid,
    pub rx: mpsc::Receiver<LoginCount>,
}

/// Set of connected listeners
#[derive(Debug, Default)]
pub struct Notifier {
    listeners: DashMap<Uuid, mpsc::Sender<LoginCount>>,
}

impl Notifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener
    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel(LISTENER_BUFFER);
        let id = Uuid::new_v4();
        self.listeners.insert(id, tx);
        gauge!(PUSH_ACTIVE).set(self.listeners.len() as f64);
        debug!(%id, "push listener subscribed");
        Subscription { id, rx }
    }

    /// Remove a listener, if still registered
    pub fn unsubscribe(&self, id: Uuid) {
        if self.listeners.remove(&id).is_some() {
            gauge!(PUSH_ACTIVE).set(self.listeners.len() as f64);
            debug!(%id, "push listener unsubscribed");
        }
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Send the count to every open listener and return how many got it
    pub fn broadcast(&self, count: i64) -> usize {
        let message = LoginCount::new(count);
        let mut delivered = 0usize;

        self.listeners.retain(|id, tx| match tx.try_send(message) {
            Ok(()) => {
                delivered += 1;
                true
            },
            Err(TrySendError::Full(_)) => {
                trace!(%id, "push listener lagging, update skipped");
                counter!(PUSH_DROPPED).increment(1);
                true
            },
            Err(TrySendError::Closed(_)) => {
                trace!(%id, "push listener closed, pruning");
                false
            },
        });

        counter!(PUSH_DELIVERED).increment(delivered as u64);
        gauge!(PUSH_ACTIVE).set(self.listeners.len() as f64);
        debug!(count, delivered, "login count broadcast");
        delivered
    }
}

impl LoginObserver for Notifier {
    fn on_login(&self, total_sign_ins: i64) {
        self.broadcast(total_sign_ins);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_broadcast_reaches_every_listener() {
        let notifier = Notifier::new();
        let mut a = notifier.subscribe();
        let mut b = notifier.subscribe();

        assert_eq!(notifier.broadcast(5), 2);

        assert_eq!(a.rx.recv().await, Some(LoginCount::new(5)));
        assert_eq!(b.rx.recv().await, Some(LoginCount::new(5)));
    }

    #[tokio::test]
    async fn test_closed_listener_is_pruned() {
        let notifier = Notifier::new();
        let mut open = notifier.subscribe();
        let closed = notifier.subscribe();
        drop(closed.rx);

        assert_eq!(notifier.broadcast(1), 1);
        assert_eq!(notifier.listener_count(), 1);
        assert_eq!(open.rx.recv().await, Some(LoginCount::new(1)));
    }

    #[tokio::test]
    async fn test_lagging_listener_is_skipped_not_removed() {
        let notifier = Notifier::new();
        let mut slow = notifier.subscribe();

        for n in 0..LISTENER_BUFFER as i64 {
            assert_eq!(notifier.broadcast(n), 1);
        }
        // buffer full: this one is dropped for the slow listener
        assert_eq!(notifier.broadcast(99), 0);
        assert_eq!(notifier.listener_count(), 1);

        assert_eq!(slow.rx.recv().await, Some(LoginCount::new(0)));
    }

    #[test]
    fn test_unsubscribe_and_empty_broadcast() {
        let notifier = Notifier::new();
        let sub = notifier.subscribe();
        notifier.unsubscribe(sub.id);
        assert_eq!(notifier.listener_count(), 0);
        assert_eq!(notifier.broadcast(3), 0);
    }

    #[tokio::test]
    async fn test_observer_forwards_to_broadcast() {
        let notifier = Notifier::new();
        let mut sub = notifier.subscribe();
        let observer: &dyn LoginObserver = &notifier;
        observer.on_login(12);
        assert_eq!(sub.rx.recv().await, Some(LoginCount::new(12)));
    }
}
