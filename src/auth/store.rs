//! Authentication store
//!
//! Validates login attempts against the configured account. A mismatch is
//! a per-session denial answered on the command channel, never a server
//! fault.

use crate::auth::credentials::{Credential, Permissions};
use crate::config::ServerConfig;
use crate::error::AuthError;

const MAX_INPUT_LENGTH: usize = 64;

/// Performs basic input sanitation to reject malformed usernames/passwords.
fn is_valid_input(input: &str, max_length: usize) -> bool {
    !input.trim().is_empty() && input.len() <= max_length && !input.contains(['\r', '\n', '\0'])
}

/// Static credential store consulted at session start.
pub struct AuthStore {
    credential: Credential,
}

impl AuthStore {
    /// Builds the store from the configured account.
    pub fn from_config(config: &ServerConfig) -> Result<Self, AuthError> {
        let permissions = Permissions::from_mask(&config.permissions)?;
        Ok(Self {
            credential: Credential {
                username: config.username.clone(),
                password: config.password.clone(),
                root_directory: config.server_root_path(),
                permissions,
            },
        })
    }

    /// Validates that the given username names the configured account.
    ///
    /// Consulted at the USER step, before any password is seen.
    pub fn knows_user(&self, username: &str) -> Result<(), AuthError> {
        if !is_valid_input(username, MAX_INPUT_LENGTH) {
            return Err(AuthError::MalformedInput("Invalid username format".into()));
        }

        if username == self.credential.username {
            Ok(())
        } else {
            Err(AuthError::UnknownUser(username.to_string()))
        }
    }

    /// Validates a full credential pair, returning the granted permissions.
    pub fn authorize(&self, username: &str, password: &str) -> Result<Permissions, AuthError> {
        self.knows_user(username)?;

        if !is_valid_input(password, MAX_INPUT_LENGTH) {
            return Err(AuthError::MalformedInput("Invalid password format".into()));
        }

        if password == self.credential.password {
            Ok(self.credential.permissions.clone())
        } else {
            Err(AuthError::InvalidPassword(username.to_string()))
        }
    }

    /// The root directory the configured account is homed in.
    pub fn root_directory(&self) -> &std::path::Path {
        &self.credential.root_directory
    }
}
