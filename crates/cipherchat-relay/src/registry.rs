//! Connection registry
//!
//! Process-wide mapping from user identifier to at most one live channel
//! handle. A later connect for the same user supersedes the earlier one
//! (last-connect-wins), and a late unregister from a superseded connection
//! must not evict the newer handle, so handles carry a connection identity.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::debug;
use uuid::Uuid;

use cipherchat_core::OutboundFrame;

/// Sending side of one user's live channel
#[derive(Clone, Debug)]
pub struct ChannelHandle {
    conn_id: Uuid,
    tx: UnboundedSender<OutboundFrame>,
}

impl ChannelHandle {
    /// Create a handle and the receiving half its transport drains
    pub fn new() -> (Self, UnboundedReceiver<OutboundFrame>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                conn_id: Uuid::new_v4(),
                tx,
            },
            rx,
        )
    }

    /// Connection identity, stable across clones of this handle
    pub fn conn_id(&self) -> Uuid {
        self.conn_id
    }

    /// Push a frame; returns false if the channel has closed
    pub fn send(&self, frame: OutboundFrame) -> bool {
        self.tx.send(frame).is_ok()
    }

    /// Whether two handles belong to the same connection
    pub fn same_connection(&self, other: &ChannelHandle) -> bool {
        self.conn_id == other.conn_id
    }
}

/// Process-wide registry of live channels, one per user
#[derive(Clone, Default)]
pub struct ConnectionRegistry {
    inner: Arc<RwLock<HashMap<i64, ChannelHandle>>>,
}

impl ConnectionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a live channel for a user.
    ///
    /// Last-connect-wins: any previously registered handle is discarded
    /// under the write lock, so lookups never observe two handles for the
    /// same user.
    pub fn register(&self, user_id: i64, handle: ChannelHandle) {
        let superseded = self.inner.write().insert(user_id, handle);
        if let Some(old) = superseded {
            debug!(user_id, old_conn = %old.conn_id(), "superseded live channel");
        }
    }

    /// Current handle for a user, if any; non-blocking
    pub fn lookup(&self, user_id: i64) -> Option<ChannelHandle> {
        self.inner.read().get(&user_id).cloned()
    }

    /// Remove the mapping only if it still belongs to this connection.
    ///
    /// Returns true when a handle was removed. A stale unregister from a
    /// superseded connection is a no-op.
    pub fn unregister(&self, user_id: i64, handle: &ChannelHandle) -> bool {
        let mut inner = self.inner.write();
        match inner.get(&user_id) {
            Some(current) if current.same_connection(handle) => {
                inner.remove(&user_id);
                true
            }
            _ => false,
        }
    }

    /// Number of live channels
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    /// Whether no channels are registered
    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_frame() -> OutboundFrame {
        OutboundFrame::error("ping")
    }

    #[tokio::test]
    async fn register_then_lookup_returns_handle() {
        let registry = ConnectionRegistry::new();
        let (handle, mut rx) = ChannelHandle::new();

        registry.register(7, handle);
        assert_eq!(registry.len(), 1);

        let found = registry.lookup(7).expect("handle registered");
        assert!(found.send(error_frame()));
        assert!(rx.recv().await.is_some());
    }

    #[tokio::test]
    async fn lookup_unknown_user_is_none() {
        let registry = ConnectionRegistry::new();
        assert!(registry.lookup(1).is_none());
    }

    #[tokio::test]
    async fn second_register_supersedes_first() {
        let registry = ConnectionRegistry::new();
        let (first, mut first_rx) = ChannelHandle::new();
        let (second, mut second_rx) = ChannelHandle::new();

        registry.register(7, first.clone());
        registry.register(7, second.clone());
        assert_eq!(registry.len(), 1);

        let current = registry.lookup(7).expect("handle registered");
        assert!(current.same_connection(&second));

        current.send(error_frame());
        assert!(second_rx.recv().await.is_some());
        assert!(first_rx.try_recv().is_err());

        // The superseded connection's own cleanup must not evict the winner.
        assert!(!registry.unregister(7, &first));
        assert!(registry.lookup(7).is_some());
    }

    #[tokio::test]
    async fn unregister_removes_only_matching_handle() {
        let registry = ConnectionRegistry::new();
        let (handle, _rx) = ChannelHandle::new();

        registry.register(7, handle.clone());
        assert!(registry.unregister(7, &handle));
        assert!(registry.is_empty());
        assert!(!registry.unregister(7, &handle));
    }

    #[tokio::test]
    async fn concurrent_registers_leave_one_handle() {
        let registry = ConnectionRegistry::new();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            tasks.push(tokio::spawn(async move {
                let (handle, _rx) = ChannelHandle::new();
                registry.register(7, handle);
            }));
        }
        for task in tasks {
            task.await.expect("task completed");
        }

        assert_eq!(registry.len(), 1);
    }
}
