//! Error handling
//!
//! Defines error types for the server lifecycle, authentication, and
//! session management modules.

pub mod types;

pub use types::*;
