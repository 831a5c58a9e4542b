//! Server core functionality
//!
//! This module contains the server lifecycle controller: the listening
//! socket, the accept loop, and ownership of the session registry for one
//! server run.

pub mod core;

pub use core::{Server, ServerState};
