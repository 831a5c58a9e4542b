pub mod auth;
pub mod config;
pub mod control;
pub mod error;
pub mod protocol;
pub mod server;
pub mod session;

pub use control::{ControlPanel, KickOutcome};
pub use server::{Server, ServerState};
