//! Control façade
//!
//! The narrow boundary between the server core and the excluded
//! presentation layer. Every method is synchronous and safe to call from
//! any thread at any rate.

pub mod log;
pub mod panel;

pub use log::SessionLog;
pub use panel::{ControlPanel, KickOutcome};
