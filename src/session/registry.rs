//! Module `registry`
//!
//! Provides a centralized registry of live client sessions keyed by remote
//! address; the single source of truth for "who is connected". Supports
//! concurrent readers and writers from session tasks and the control
//! thread without external locking by callers.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use log::warn;

use crate::error::SessionError;
use crate::session::state::SessionHandle;

struct Entry {
    seq: u64,
    session: Arc<SessionHandle>,
}

struct Inner {
    sessions: HashMap<SocketAddr, Entry>,
    next_seq: u64,
}

/// Registry that maps client addresses to their session handles.
///
/// All mutation goes through `register`/`unregister`; `list` and `handles`
/// return point-in-time snapshots so no caller ever iterates the live map.
/// The interior lock is never held across an await point.
pub struct SessionRegistry {
    inner: Mutex<Inner>,
    max_sessions: usize,
}

impl SessionRegistry {
    pub fn new(max_sessions: usize) -> Self {
        Self {
            inner: Mutex::new(Inner {
                sessions: HashMap::new(),
                next_seq: 0,
            }),
            max_sessions,
        }
    }

    /// Inserts the session under its identity.
    ///
    /// The capacity check and the insert happen under one lock. An
    /// identity collision (reconnect race) displaces the previous entry
    /// and returns its handle so the caller can close it; a displaced
    /// session does not count against capacity.
    pub fn register(
        &self,
        session: Arc<SessionHandle>,
    ) -> Result<Option<Arc<SessionHandle>>, SessionError> {
        let identity = session.identity();
        let mut inner = self.inner.lock().unwrap();

        if !inner.sessions.contains_key(&identity) && inner.sessions.len() >= self.max_sessions {
            warn!(
                "Rejecting {}: {} clients already connected",
                identity, self.max_sessions
            );
            return Err(SessionError::TooManyClients(self.max_sessions));
        }

        let seq = inner.next_seq;
        inner.next_seq += 1;
        let replaced = inner.sessions.insert(identity, Entry { seq, session });
        Ok(replaced.map(|e| e.session))
    }

    /// Removes the session if it still owns its registry slot.
    ///
    /// Idempotent; matched by identity and handle pointer, so a displaced
    /// stale session can never remove its replacement.
    pub fn unregister(&self, session: &Arc<SessionHandle>) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(entry) = inner.sessions.get(&session.identity()) {
            if Arc::ptr_eq(&entry.session, session) {
                inner.sessions.remove(&session.identity());
            }
        }
    }

    /// Returns the session registered under the given identity, if any.
    pub fn lookup(&self, identity: &SocketAddr) -> Option<Arc<SessionHandle>> {
        let inner = self.inner.lock().unwrap();
        inner.sessions.get(identity).map(|e| Arc::clone(&e.session))
    }

    /// Snapshot of connected identities in registration order.
    pub fn list(&self) -> Vec<SocketAddr> {
        let inner = self.inner.lock().unwrap();
        let mut entries: Vec<(u64, SocketAddr)> = inner
            .sessions
            .iter()
            .map(|(addr, entry)| (entry.seq, *addr))
            .collect();
        entries.sort_unstable_by_key(|(seq, _)| *seq);
        entries.into_iter().map(|(_, addr)| addr).collect()
    }

    /// Snapshot of all session handles.
    pub fn handles(&self) -> Vec<Arc<SessionHandle>> {
        let inner = self.inner.lock().unwrap();
        inner
            .sessions
            .values()
            .map(|e| Arc::clone(&e.session))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops all bookkeeping. Sessions own their sockets; this does not
    /// close anything.
    pub fn clear(&self) {
        self.inner.lock().unwrap().sessions.clear();
    }
}
