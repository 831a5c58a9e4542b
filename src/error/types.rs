//! Error types
//!
//! Defines domain-specific error types for each module of the FTP server.

use std::fmt;
use std::io;

/// Server lifecycle errors
///
/// Both variants are recoverable and reported to the control layer;
/// neither changes the server state.
#[derive(Debug)]
pub enum ServerError {
    /// `start()` was called while the server is already running.
    AlreadyRunning,
    /// The listening socket could not be created; the server stays stopped.
    Bind(io::Error),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::AlreadyRunning => write!(f, "Server is already running"),
            ServerError::Bind(e) => write!(f, "Failed to bind listening socket: {}", e),
        }
    }
}

impl std::error::Error for ServerError {}

/// Authentication module errors
#[derive(Debug)]
pub enum AuthError {
    UnknownUser(String),
    InvalidPassword(String),
    MalformedInput(String),
    InvalidPermissionFlag(char),
}

impl AuthError {
    /// FTP reply code for this error on the command channel.
    pub fn ftp_code(&self) -> u16 {
        match self {
            AuthError::MalformedInput(_) => 501,
            _ => 530,
        }
    }
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::UnknownUser(u) => write!(f, "Unknown user: {}", u),
            AuthError::InvalidPassword(u) => write!(f, "Invalid password for user: {}", u),
            AuthError::MalformedInput(s) => write!(f, "Malformed input: {}", s),
            AuthError::InvalidPermissionFlag(c) => {
                write!(f, "Invalid permission flag: {:?}", c)
            }
        }
    }
}

impl std::error::Error for AuthError {}

/// Session module errors
#[derive(Debug)]
pub enum SessionError {
    /// The registry is at capacity; the connection is rejected at the door.
    TooManyClients(usize),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::TooManyClients(max) => {
                write!(f, "Connection limit reached ({} clients)", max)
            }
        }
    }
}

impl std::error::Error for SessionError {}

impl From<io::Error> for ServerError {
    fn from(error: io::Error) -> Self {
        ServerError::Bind(error)
    }
}
