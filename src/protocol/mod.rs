//! FTP command-channel protocol
//!
//! Parses client commands and generates responses for the session-scoped
//! subset of RFC 959 the server speaks. Data-channel commands are
//! acknowledged as unimplemented.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus, parse_command};
pub use handlers::{LoginState, handle_command};
