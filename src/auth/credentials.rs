//! Credential types
//!
//! Defines the configured account and its permission mask. Both are
//! immutable after server start and read-only during a server run.

use std::path::PathBuf;

use crate::error::AuthError;

/// Permission flags accepted in a mask, pyftpdlib-style:
/// e = change directory, l = list, r = retrieve, a = append,
/// d = delete, f = rename, m = make directory, w = store,
/// T = modify timestamps.
const VALID_FLAGS: &str = "elradfmwT";

/// Permission mask granted to an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Permissions {
    mask: String,
}

impl Permissions {
    /// Parses a permission mask, rejecting unknown flags.
    pub fn from_mask(mask: &str) -> Result<Self, AuthError> {
        if let Some(bad) = mask.chars().find(|c| !VALID_FLAGS.contains(*c)) {
            return Err(AuthError::InvalidPermissionFlag(bad));
        }
        Ok(Self {
            mask: mask.to_string(),
        })
    }

    /// Returns whether the mask grants the given flag.
    pub fn allows(&self, flag: char) -> bool {
        self.mask.contains(flag)
    }

    /// Returns the mask as configured.
    pub fn as_str(&self) -> &str {
        &self.mask
    }
}

/// The single configured account.
///
/// Process-wide, immutable after server start.
#[derive(Debug, Clone)]
pub struct Credential {
    pub username: String,
    pub password: String,
    pub root_directory: PathBuf,
    pub permissions: Permissions,
}
