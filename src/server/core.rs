//! Server lifecycle controller
//!
//! Owns the listening socket and the accept loop for one server run. The
//! registry is created on `start` and discarded on `stop`, so no session
//! bookkeeping outlives the run it belongs to. All public methods are
//! synchronous and intended for a control thread outside the runtime.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use tokio::net::TcpListener;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::auth::AuthStore;
use crate::config::ServerConfig;
use crate::control::SessionLog;
use crate::error::ServerError;
use crate::session::{SessionRegistry, run_session};

const ACCEPT_JOIN_TIMEOUT: Duration = Duration::from_secs(1);
const DRAIN_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Lifecycle state of the server, owned exclusively by the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerState {
    Stopped,
    Running,
}

impl std::fmt::Display for ServerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ServerState::Stopped => write!(f, "stopped"),
            ServerState::Running => write!(f, "running"),
        }
    }
}

/// Everything that exists only while the server is running.
struct ActiveRun {
    registry: Arc<SessionRegistry>,
    shutdown_tx: watch::Sender<bool>,
    accept_task: JoinHandle<()>,
    local_addr: SocketAddr,
}

/// The server lifecycle controller.
pub struct Server {
    config: Arc<ServerConfig>,
    auth: Arc<AuthStore>,
    log: Arc<SessionLog>,
    runtime: Handle,
    run: Mutex<Option<ActiveRun>>,
}

impl Server {
    pub fn new(
        config: Arc<ServerConfig>,
        auth: Arc<AuthStore>,
        log: Arc<SessionLog>,
        runtime: Handle,
    ) -> Self {
        Self {
            config,
            auth,
            log,
            runtime,
            run: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ServerState {
        if self.run.lock().unwrap().is_some() {
            ServerState::Running
        } else {
            ServerState::Stopped
        }
    }

    /// Address the listening socket is bound to, while running.
    pub fn bound_addr(&self) -> Option<SocketAddr> {
        self.run.lock().unwrap().as_ref().map(|run| run.local_addr)
    }

    /// The current run's registry, while running.
    pub fn registry(&self) -> Option<Arc<SessionRegistry>> {
        self.run
            .lock()
            .unwrap()
            .as_ref()
            .map(|run| Arc::clone(&run.registry))
    }

    /// Binds the listening socket and spawns the accept loop.
    ///
    /// Fails with `AlreadyRunning` while a run is active and with `Bind`
    /// when the socket cannot be created; in both cases the server state
    /// is unchanged.
    pub fn start(&self, port: u16) -> Result<(), ServerError> {
        let mut run = self.run.lock().unwrap();
        if run.is_some() {
            return Err(ServerError::AlreadyRunning);
        }

        let listener =
            std::net::TcpListener::bind(format!("{}:{}", self.config.bind_address, port))?;
        listener.set_nonblocking(true)?;
        let local_addr = listener.local_addr()?;

        if let Err(e) = std::fs::create_dir_all(self.config.server_root_path()) {
            warn!("Failed to create server root directory: {}", e);
        }

        let registry = Arc::new(SessionRegistry::new(self.config.max_clients));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let accept_task = self.runtime.spawn(accept_loop(
            listener,
            Arc::clone(&registry),
            Arc::clone(&self.auth),
            Arc::clone(&self.config),
            Arc::clone(&self.log),
            shutdown_rx,
        ));

        info!(
            "Server listening on {} (max {} clients)",
            local_addr, self.config.max_clients
        );

        *run = Some(ActiveRun {
            registry,
            shutdown_tx,
            accept_task,
            local_addr,
        });
        Ok(())
    }

    /// Stops the server. Calling this while stopped is a no-op.
    ///
    /// The listening socket is released before this returns, so a
    /// `start()` on the same port immediately afterwards succeeds. Session
    /// teardown is waited on best-effort, bounded by the configured
    /// shutdown timeout; sockets, not registry bookkeeping, are the final
    /// release authority.
    pub fn stop(&self) {
        let run = self.run.lock().unwrap().take();
        let Some(run) = run else {
            return;
        };

        info!("Stopping server on {}", run.local_addr);
        let _ = run.shutdown_tx.send(true);

        // Join the accept loop first so the listening socket is closed
        // before any new start() can race it.
        let mut accept_task = run.accept_task;
        let joined = self
            .runtime
            .block_on(async { tokio::time::timeout(ACCEPT_JOIN_TIMEOUT, &mut accept_task).await });
        if joined.is_err() {
            warn!("Accept loop did not stop in time; aborting it");
            accept_task.abort();
        }

        for session in run.registry.handles() {
            session.terminate();
        }

        let deadline = Instant::now() + self.config.shutdown_timeout();
        while !run.registry.is_empty() && Instant::now() < deadline {
            std::thread::sleep(DRAIN_POLL_INTERVAL);
        }

        let stragglers = run.registry.len();
        if stragglers > 0 {
            warn!(
                "{} session(s) still closing at shutdown; clearing registry",
                stragglers
            );
        }
        run.registry.clear();
        info!("Server stopped");
    }
}

/// Accepts connections until told to shut down, spawning a session task
/// per client so one slow client never blocks acceptance of others.
async fn accept_loop(
    listener: std::net::TcpListener,
    registry: Arc<SessionRegistry>,
    auth: Arc<AuthStore>,
    config: Arc<ServerConfig>,
    log: Arc<SessionLog>,
    mut shutdown: watch::Receiver<bool>,
) {
    let listener = match TcpListener::from_std(listener) {
        Ok(listener) => listener,
        Err(e) => {
            error!("Failed to adopt listening socket: {}", e);
            return;
        }
    };

    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("Accept loop shutting down");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((stream, addr)) => {
                        info!("New connection from {}", addr);
                        let registry = Arc::clone(&registry);
                        let auth = Arc::clone(&auth);
                        let config = Arc::clone(&config);
                        let log = Arc::clone(&log);

                        tokio::spawn(async move {
                            if let Err(e) =
                                run_session(stream, addr, registry, auth, config, log).await
                            {
                                warn!("Session {} ended with error: {}", addr, e);
                            }
                        });
                    }
                    Err(e) => {
                        error!("Error accepting connection: {}", e);
                    }
                }
            }
        }
    }
}
