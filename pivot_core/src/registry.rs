//! Live session inventory.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::sync::Notify;

/// Session identity, unique within one registry.
pub type SessionId = u64;

/// What is known about a live session.
#[derive(Debug, Clone)]
pub struct SessionInfo {
    pub id: SessionId,
    /// Inbound peer.
    pub peer: SocketAddr,
    /// Next hop as named by the directive.
    pub hop: String,
    /// Resolved next hop.
    pub remote: SocketAddr,
    pub since: Instant,
}

struct Entry {
    info: SessionInfo,
    close: Arc<Notify>,
}

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    shut: AtomicBool,
    sessions: Mutex<HashMap<SessionId, Entry>>,
}

/// Shared collection of live sessions.
///
/// Cloning is cheap, every clone refers to the same collection.
/// Entries are added by [`Registry::register`] and removed when the
/// returned [`SessionGuard`] drops, so each one is removed exactly once.
#[derive(Clone, Default)]
pub struct Registry {
    inner: Arc<Inner>,
}

/// Registration of one session.
///
/// Dropping it removes the entry.
pub struct SessionGuard {
    id: SessionId,
    close: Arc<Notify>,
    registry: Registry,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn sessions(&self) -> MutexGuard<'_, HashMap<SessionId, Entry>> {
        // entries stay consistent even if a holder panicked
        self.inner.sessions.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a session.
    ///
    /// After [`Registry::shutdown`] the returned guard is already closed.
    pub fn register(&self, peer: SocketAddr, hop: String, remote: SocketAddr) -> SessionGuard {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let close = Arc::new(Notify::new());

        let info = SessionInfo {
            id,
            peer,
            hop,
            remote,
            since: Instant::now(),
        };

        let mut sessions = self.sessions();
        if self.inner.shut.load(Ordering::Acquire) {
            close.notify_one();
        }
        let prev = sessions.insert(
            id,
            Entry {
                info,
                close: close.clone(),
            },
        );
        debug_assert!(prev.is_none(), "session id reused");
        drop(sessions);

        SessionGuard {
            id,
            close,
            registry: self.clone(),
        }
    }

    fn remove(&self, id: SessionId) {
        let removed = self.sessions().remove(&id);
        debug_assert!(removed.is_some(), "session removed twice");
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions().is_empty()
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions().contains_key(&id)
    }

    /// Copy of every live session, in no particular order.
    pub fn snapshot(&self) -> Vec<SessionInfo> {
        self.sessions().values().map(|e| e.info.clone()).collect()
    }

    /// Ask one session to close both of its connections.
    ///
    /// Returns `false` if no such session is live. The entry goes away
    /// once the session has torn down.
    pub fn close(&self, id: SessionId) -> bool {
        match self.sessions().get(&id) {
            Some(entry) => {
                entry.close.notify_one();
                true
            }
            None => false,
        }
    }

    /// Ask every live session to close, returns how many were asked.
    pub fn close_all(&self) -> usize {
        let sessions = self.sessions();
        for entry in sessions.values() {
            entry.close.notify_one();
        }
        sessions.len()
    }

    /// Close every live session and every session registered from now on.
    ///
    /// Returns how many live sessions were asked to close.
    pub fn shutdown(&self) -> usize {
        let sessions = self.sessions();
        self.inner.shut.store(true, Ordering::Release);
        for entry in sessions.values() {
            entry.close.notify_one();
        }
        sessions.len()
    }

    pub fn is_shutdown(&self) -> bool {
        self.inner.shut.load(Ordering::Acquire)
    }
}

impl SessionGuard {
    #[inline]
    pub const fn id(&self) -> SessionId {
        self.id
    }

    /// Resolves once [`Registry::close`] or [`Registry::close_all`]
    /// picked this session, including before this was first polled.
    pub async fn closed(&self) {
        self.close.notified().await
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}

impl Display for SessionInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "#{} {} => {} as {}, {}s",
            self.id,
            self.peer,
            self.hop,
            self.remote,
            self.since.elapsed().as_secs()
        )
    }
}
