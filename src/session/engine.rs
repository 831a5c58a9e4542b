//! Module `engine`
//!
//! Drives one client's command-channel exchange. The engine registers the
//! session on connect, pumps commands until the client leaves, errors out,
//! or an operator requests termination, and always deregisters exactly
//! once on the way out. Failures here are contained to this session's
//! task.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use log::{info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::OwnedWriteHalf;

use crate::auth::AuthStore;
use crate::config::ServerConfig;
use crate::control::SessionLog;
use crate::protocol::{Command, CommandStatus, LoginState, handle_command, parse_command};
use crate::session::registry::SessionRegistry;
use crate::session::state::SessionHandle;

const GREETING: &[u8] = b"220 Helm FTP server ready\r\n";
const TOO_MANY_CLIENTS: &[u8] = b"421 Too many connections. Try again later.\r\n";
const TERMINATED: &[u8] = b"421 Service not available, closing control connection\r\n";

/// Handles one accepted connection from registration to deregistration.
pub async fn run_session(
    mut stream: TcpStream,
    client_addr: SocketAddr,
    registry: Arc<SessionRegistry>,
    auth: Arc<AuthStore>,
    config: Arc<ServerConfig>,
    log: Arc<SessionLog>,
) -> io::Result<()> {
    let session = Arc::new(SessionHandle::new(client_addr));

    let displaced = match registry.register(Arc::clone(&session)) {
        Ok(displaced) => displaced,
        Err(e) => {
            warn!("Rejecting {}: {}", client_addr, e);
            stream.write_all(TOO_MANY_CLIENTS).await?;
            return Ok(());
        }
    };

    // Reconnect race: the old handle is presumed stale. Close it rather
    // than silently orphaning its socket.
    if let Some(stale) = displaced {
        info!("Identity {} reconnected; closing stale session", client_addr);
        stale.terminate();
    }

    info!(
        "Session registered: {} ({}/{} clients)",
        client_addr,
        registry.len(),
        config.max_clients
    );
    log.append(format!("Connected: {}", client_addr));

    let result = drive_session(stream, &session, &auth, &config).await;

    session.mark_closed();
    registry.unregister(&session);
    log.append(format!("Disconnected: {}", client_addr));
    info!(
        "Client {} disconnected after {:?}",
        client_addr,
        session.connected_at().elapsed()
    );

    result
}

/// Pumps the command loop until the session ends.
async fn drive_session(
    stream: TcpStream,
    session: &Arc<SessionHandle>,
    auth: &Arc<AuthStore>,
    config: &Arc<ServerConfig>,
) -> io::Result<()> {
    let client_addr = session.identity();
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_half.write_all(GREETING).await?;
    write_half.flush().await?;
    session.begin_authentication();

    let mut login = LoginState::default();
    let mut line = String::new();

    loop {
        line.clear();
        tokio::select! {
            _ = session.wait_terminated() => {
                info!("Session {} terminated by operator", client_addr);
                let _ = write_half.write_all(TERMINATED).await;
                return Ok(());
            }
            read = reader.read_line(&mut line) => {
                match read {
                    Ok(0) => {
                        info!("Connection closed by client {}", client_addr);
                        return Ok(());
                    }
                    Ok(_) => {
                        if line.len() > config.max_command_length {
                            let _ = write_half.write_all(b"500 Command too long\r\n").await;
                            continue;
                        }
                        if handle_line(&mut login, &line, session, auth, &mut write_half).await? {
                            return Ok(());
                        }
                    }
                    Err(e) => {
                        warn!("Failed to read from {}: {}", client_addr, e);
                        return Err(e);
                    }
                }
            }
        }
    }
}

/// Dispatches one command line. Returns `true` when the session should
/// close.
async fn handle_line(
    login: &mut LoginState,
    line: &str,
    session: &Arc<SessionHandle>,
    auth: &Arc<AuthStore>,
    write_half: &mut OwnedWriteHalf,
) -> io::Result<bool> {
    let command = parse_command(line.trim_end_matches("\r\n"));
    match &command {
        Command::PASS(_) => info!("Received from {}: PASS ****", session.identity()),
        other => info!("Received from {}: {:?}", session.identity(), other),
    }

    let result = handle_command(login, &command, auth, session);

    match result.status {
        CommandStatus::CloseConnection => {
            if let Some(msg) = result.message {
                let _ = write_half.write_all(msg.as_bytes()).await;
            }
            info!("Client {} requested to quit", session.identity());
            Ok(true)
        }
        CommandStatus::Success | CommandStatus::Failure(_) => {
            if let Some(msg) = result.message {
                write_half.write_all(msg.as_bytes()).await?;
            }
            Ok(false)
        }
    }
}
