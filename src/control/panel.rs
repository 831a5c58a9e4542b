//! Control panel façade
//!
//! The API the presentation layer drives: start/stop the server, list
//! connected clients, kick a client, and read the session log. Owns the
//! tokio runtime so callers need none of their own; methods must not be
//! called from inside an async context.

use std::net::SocketAddr;
use std::sync::Arc;

use log::info;
use tokio::runtime::Runtime;

use crate::auth::AuthStore;
use crate::config::ServerConfig;
use crate::control::log::SessionLog;
use crate::error::ServerError;
use crate::server::{Server, ServerState};

/// Outcome of a kick request. `NotFound` and `NoSelection` are
/// informational, not faults: a client that disconnected between a listing
/// and the kick is simply already gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickOutcome {
    Kicked,
    NotFound,
    NoSelection,
}

/// Façade over the server core for an external control thread.
pub struct ControlPanel {
    runtime: Runtime,
    server: Server,
    log: Arc<SessionLog>,
}

impl ControlPanel {
    /// Builds the façade and its runtime from a validated configuration.
    pub fn new(config: ServerConfig) -> std::io::Result<Self> {
        let auth = AuthStore::from_config(&config)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e.to_string()))?;

        let runtime = Runtime::new()?;
        let log = Arc::new(SessionLog::new());
        let server = Server::new(
            Arc::new(config),
            Arc::new(auth),
            Arc::clone(&log),
            runtime.handle().clone(),
        );

        Ok(Self {
            runtime,
            server,
            log,
        })
    }

    /// Starts the server on the given port.
    pub fn start(&self, port: u16) -> Result<(), ServerError> {
        self.server.start(port)
    }

    /// Stops the server. Idempotent.
    pub fn stop(&self) {
        self.server.stop();
    }

    pub fn state(&self) -> ServerState {
        self.server.state()
    }

    /// Address the server is listening on, while running.
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.server.bound_addr()
    }

    /// Identities of connected clients in connection order; empty while
    /// stopped.
    pub fn list_clients(&self) -> Vec<String> {
        match self.server.registry() {
            Some(registry) => registry.list().iter().map(SocketAddr::to_string).collect(),
            None => Vec::new(),
        }
    }

    /// Requests termination of the identified session.
    ///
    /// Never blocks on network I/O: the session is asked to close and
    /// tears its own socket down asynchronously, disappearing from
    /// `list_clients` once its disconnect completes.
    pub fn kick(&self, identity: &str) -> KickOutcome {
        if identity.trim().is_empty() {
            return KickOutcome::NoSelection;
        }

        let Ok(addr) = identity.parse::<SocketAddr>() else {
            return KickOutcome::NotFound;
        };

        let Some(registry) = self.server.registry() else {
            return KickOutcome::NotFound;
        };

        match registry.lookup(&addr) {
            Some(session) => {
                session.terminate();
                info!("Kick requested for {}", identity);
                self.log.append(format!("Kicked: {}", identity));
                KickOutcome::Kicked
            }
            None => KickOutcome::NotFound,
        }
    }

    pub fn append_log(&self, message: impl Into<String>) {
        self.log.append(message);
    }

    pub fn read_log(&self) -> Vec<String> {
        self.log.snapshot()
    }
}

impl Drop for ControlPanel {
    fn drop(&mut self) {
        self.stop();
    }
}
