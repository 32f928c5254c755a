//! Server-side session registry.
//!
//! Each accepted connection gets an opaque [`SessionId`]. The registry slot
//! and the session task jointly own the connection: the registry holds the
//! peer address, the outbound queue, and the session's cancellation token,
//! while the task owns the socket. The task removes its own entry when its
//! connection closes; nothing else mutates membership.

use crate::error::TransportError;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Opaque identifier for one accepted connection.
pub type SessionId = u64;

/// Per-session bookkeeping held by the registry.
#[derive(Debug)]
struct SessionEntry {
    peer_addr: SocketAddr,
    outbound: mpsc::UnboundedSender<Vec<u8>>,
    cancel: CancellationToken,
}

/// Live-session table shared between the server task and its handle.
pub struct SessionRegistry {
    sessions: RwLock<HashMap<SessionId, SessionEntry>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Registers a new session and returns its id.
    pub(crate) fn insert(
        &self,
        peer_addr: SocketAddr,
        outbound: mpsc::UnboundedSender<Vec<u8>>,
        cancel: CancellationToken,
    ) -> SessionId {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.sessions.write().insert(
            id,
            SessionEntry {
                peer_addr,
                outbound,
                cancel,
            },
        );
        id
    }

    /// Removes a session. Idempotent: returns false if already gone.
    pub(crate) fn remove(&self, id: SessionId) -> bool {
        self.sessions.write().remove(&id).is_some()
    }

    /// Number of live sessions.
    #[must_use]
    pub fn count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Remote endpoint of a session, if it is still live.
    #[must_use]
    pub fn peer_addr(&self, id: SessionId) -> Option<SocketAddr> {
        self.sessions.read().get(&id).map(|entry| entry.peer_addr)
    }

    /// Display label for a session: the remote endpoint, or `"unknown"` once
    /// the session is gone. Never fails.
    #[must_use]
    pub fn peer_label(&self, id: SessionId) -> String {
        self.peer_addr(id)
            .map_or_else(|| "unknown".to_string(), |addr| addr.to_string())
    }

    /// Enqueues `bytes` for one session.
    ///
    /// # Errors
    /// Returns [`TransportError::UnknownSession`] if the id is not live, or
    /// [`TransportError::ConnectionClosed`] if its task is already draining.
    pub fn send_to(&self, id: SessionId, bytes: Vec<u8>) -> Result<(), TransportError> {
        let sessions = self.sessions.read();
        let entry = sessions.get(&id).ok_or(TransportError::UnknownSession(id))?;
        entry
            .outbound
            .send(bytes)
            .map_err(|_| TransportError::ConnectionClosed)
    }

    /// Enqueues `bytes` for every live session and returns the delivery
    /// count. A session whose queue is gone is skipped; it never aborts the
    /// rest of the broadcast.
    pub fn broadcast(&self, bytes: &[u8]) -> usize {
        let sessions = self.sessions.read();
        let mut delivered = 0;
        for (id, entry) in sessions.iter() {
            if entry.outbound.send(bytes.to_vec()).is_ok() {
                delivered += 1;
            } else {
                tracing::warn!(session = id, "broadcast skipped closing session");
            }
        }
        delivered
    }

    /// Requests that one session close. Idempotent; a no-op for ids that are
    /// already gone.
    pub fn close(&self, id: SessionId) {
        if let Some(entry) = self.sessions.read().get(&id) {
            entry.cancel.cancel();
        }
    }

    /// Requests that every live session close.
    pub(crate) fn close_all(&self) {
        for entry in self.sessions.read().values() {
            entry.cancel.cancel();
        }
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:5502".parse().unwrap()
    }

    fn register(registry: &SessionRegistry) -> (SessionId, mpsc::UnboundedReceiver<Vec<u8>>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = registry.insert(addr(), tx, CancellationToken::new());
        (id, rx)
    }

    #[test]
    fn test_insert_allocates_distinct_ids() {
        let registry = SessionRegistry::new();
        let (first, _rx1) = register(&registry);
        let (second, _rx2) = register(&registry);
        assert_ne!(first, second);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let registry = SessionRegistry::new();
        let (id, _rx) = register(&registry);
        assert!(registry.remove(id));
        assert!(!registry.remove(id));
        assert_eq!(registry.count(), 0);
    }

    #[test]
    fn test_peer_label_after_close() {
        let registry = SessionRegistry::new();
        let (id, _rx) = register(&registry);
        assert_eq!(registry.peer_label(id), "127.0.0.1:5502");
        registry.remove(id);
        assert_eq!(registry.peer_label(id), "unknown");
    }

    #[test]
    fn test_send_to_unknown_session() {
        let registry = SessionRegistry::new();
        assert!(matches!(
            registry.send_to(7, vec![1]),
            Err(TransportError::UnknownSession(7))
        ));
    }

    #[test]
    fn test_broadcast_counts_live_sessions_only() {
        let registry = SessionRegistry::new();
        let (_a, mut rx_a) = register(&registry);
        let (_b, rx_b) = register(&registry);
        drop(rx_b); // closing session: queue receiver gone

        assert_eq!(registry.broadcast(&[9, 9]), 1);
        assert_eq!(rx_a.try_recv().unwrap(), vec![9, 9]);
    }

    #[test]
    fn test_close_cancels_token() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let id = registry.insert(addr(), tx, token.clone());

        registry.close(id);
        registry.close(id);
        assert!(token.is_cancelled());
    }
}
