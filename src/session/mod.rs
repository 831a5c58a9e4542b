//! Session management system
//!
//! Tracks live client connections, exposes them to the control plane, and
//! supports safe mid-session termination while the network I/O loop keeps
//! running concurrently.

pub mod engine;
pub mod registry;
pub mod state;

pub use engine::run_session;
pub use registry::SessionRegistry;
pub use state::{SessionHandle, SessionState};
