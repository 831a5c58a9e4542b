//! Module `state`
//!
//! Defines the per-session state machine and the `SessionHandle` shared
//! between a session's I/O task and the control plane. External actors
//! only ever request closure through the handle; actual socket teardown
//! happens on the session's own task.

use std::net::SocketAddr;
use std::sync::Mutex;
use std::time::Instant;

use log::debug;
use tokio::sync::Notify;

/// Lifecycle of one client session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Connecting,
    Authenticating,
    Active,
    Closing,
    Closed,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SessionState::Connecting => "connecting",
            SessionState::Authenticating => "authenticating",
            SessionState::Active => "active",
            SessionState::Closing => "closing",
            SessionState::Closed => "closed",
        };
        write!(f, "{}", name)
    }
}

/// Handle to one connected client.
///
/// The registry holds these for enumeration and termination requests; the
/// session's engine owns the connection itself and performs all state
/// transitions except the closure request.
pub struct SessionHandle {
    identity: SocketAddr,
    connected_at: Instant,
    state: Mutex<SessionState>,
    shutdown: Notify,
}

impl SessionHandle {
    pub fn new(identity: SocketAddr) -> Self {
        Self {
            identity,
            connected_at: Instant::now(),
            state: Mutex::new(SessionState::Connecting),
            shutdown: Notify::new(),
        }
    }

    /// Remote address of the client; the registry key.
    pub fn identity(&self) -> SocketAddr {
        self.identity
    }

    pub fn connected_at(&self) -> Instant {
        self.connected_at
    }

    pub fn state(&self) -> SessionState {
        *self.state.lock().unwrap()
    }

    /// Requests closure of this session.
    ///
    /// Safe to call from any thread: it only flips the state to `Closing`
    /// and stores a wake-up for the session's I/O loop, returning
    /// immediately. Returns `false` if the session is already closed.
    pub fn terminate(&self) -> bool {
        let mut state = self.state.lock().unwrap();
        match *state {
            SessionState::Closed => false,
            _ => {
                *state = SessionState::Closing;
                debug!("Session {} moved to closing", self.identity);
                self.shutdown.notify_one();
                true
            }
        }
    }

    /// Resolves once closure has been requested.
    ///
    /// A request made before the first call is not lost; `notify_one`
    /// stores a permit.
    pub async fn wait_terminated(&self) {
        self.shutdown.notified().await;
    }

    // --------------------
    // Engine-side transitions
    // --------------------

    /// Greeting sent; the client may now log in.
    pub fn begin_authentication(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == SessionState::Connecting {
            *state = SessionState::Authenticating;
        }
    }

    /// Login succeeded. A session already asked to close stays closing.
    pub fn activate(&self) {
        let mut state = self.state.lock().unwrap();
        if *state == SessionState::Authenticating {
            *state = SessionState::Active;
        }
    }

    /// Connection torn down; all further termination requests are no-ops.
    pub fn mark_closed(&self) {
        let mut state = self.state.lock().unwrap();
        *state = SessionState::Closed;
    }

    pub fn is_closed(&self) -> bool {
        self.state() == SessionState::Closed
    }
}
