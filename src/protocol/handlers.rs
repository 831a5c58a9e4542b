//! Command handlers for the Helm FTP server.
//!
//! Dispatches parsed commands against the authentication store and the
//! session's login progression. Handlers never touch the network; they
//! return a `CommandResult` the session engine writes back.

use log::info;

use crate::auth::{AuthStore, Permissions};
use crate::protocol::commands::{Command, CommandResult, CommandStatus};
use crate::protocol::responses;
use crate::session::SessionHandle;

/// Tracks one session's USER/PASS progression.
#[derive(Default)]
pub struct LoginState {
    user: Option<String>,
    permissions: Option<Permissions>,
}

impl LoginState {
    pub fn is_authenticated(&self) -> bool {
        self.permissions.is_some()
    }

    pub fn permissions(&self) -> Option<&Permissions> {
        self.permissions.as_ref()
    }
}

/// Dispatches a received FTP command to its corresponding handler.
pub fn handle_command(
    login: &mut LoginState,
    command: &Command,
    auth: &AuthStore,
    session: &SessionHandle,
) -> CommandResult {
    match command {
        Command::QUIT => handle_cmd_quit(),
        Command::USER(username) => handle_cmd_user(login, username, auth),
        Command::PASS(password) => handle_cmd_pass(login, password, auth, session),
        Command::NOOP => handle_cmd_noop(),
        Command::SYST => handle_cmd_syst(),
        Command::TYPE(arg) => handle_cmd_type(login, arg),
        Command::PWD => handle_cmd_pwd(login),
        Command::UNSUPPORTED(name) => handle_cmd_unsupported(name),
        Command::UNKNOWN => handle_cmd_unknown(),
    }
}

/// Handles the QUIT command: signals connection close.
fn handle_cmd_quit() -> CommandResult {
    CommandResult {
        status: CommandStatus::CloseConnection,
        message: Some(responses::format_response(responses::GOODBYE, "Goodbye")),
    }
}

/// Handles the USER command: validates the username and records it for the
/// PASS step.
fn handle_cmd_user(login: &mut LoginState, username: &str, auth: &AuthStore) -> CommandResult {
    if login.is_authenticated() {
        return CommandResult {
            status: CommandStatus::Failure("Already logged in".into()),
            message: Some(responses::format_response(
                responses::NOT_LOGGED_IN,
                "Already logged in",
            )),
        };
    }

    match auth.knows_user(username) {
        Ok(()) => {
            login.user = Some(username.to_string());
            CommandResult {
                status: CommandStatus::Success,
                message: Some(responses::format_response(
                    responses::PASSWORD_REQUIRED,
                    "Password required",
                )),
            }
        }
        Err(e) => {
            login.user = None;
            CommandResult {
                status: CommandStatus::Failure(e.to_string()),
                message: Some(responses::format_response(e.ftp_code(), "Invalid username")),
            }
        }
    }
}

/// Handles the PASS command: authorizes the pending user and activates the
/// session on success.
fn handle_cmd_pass(
    login: &mut LoginState,
    password: &str,
    auth: &AuthStore,
    session: &SessionHandle,
) -> CommandResult {
    let Some(username) = login.user.clone() else {
        return CommandResult {
            status: CommandStatus::Failure("Username not provided".into()),
            message: Some(responses::format_response(
                responses::BAD_SEQUENCE,
                "Login with USER first",
            )),
        };
    };

    match auth.authorize(&username, password) {
        Ok(permissions) => {
            info!(
                "Client {} logged in as {} (permissions {})",
                session.identity(),
                username,
                permissions.as_str()
            );
            login.permissions = Some(permissions);
            session.activate();
            CommandResult {
                status: CommandStatus::Success,
                message: Some(responses::format_response(
                    responses::LOGIN_SUCCESS,
                    "Login successful",
                )),
            }
        }
        Err(e) => {
            login.permissions = None;
            CommandResult {
                status: CommandStatus::Failure(e.to_string()),
                message: Some(responses::format_response(
                    e.ftp_code(),
                    "Authentication failed",
                )),
            }
        }
    }
}

fn handle_cmd_noop() -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(responses::format_response(responses::OK, "NOOP ok")),
    }
}

fn handle_cmd_syst() -> CommandResult {
    CommandResult {
        status: CommandStatus::Success,
        message: Some(responses::format_response(
            responses::SYSTEM_TYPE,
            "UNIX Type: L8",
        )),
    }
}

/// Handles the TYPE command: only ASCII and image types exist.
fn handle_cmd_type(login: &LoginState, arg: &str) -> CommandResult {
    if let Some(denied) = require_login(login) {
        return denied;
    }

    match arg {
        "A" | "I" => CommandResult {
            status: CommandStatus::Success,
            message: Some(responses::format_response(
                responses::OK,
                &format!("Type set to {}", arg),
            )),
        },
        _ => CommandResult {
            status: CommandStatus::Failure(format!("Unsupported type: {}", arg)),
            message: Some(responses::format_response(
                responses::NOT_IMPLEMENTED,
                "Type not supported",
            )),
        },
    }
}

/// Handles the PWD command. Navigation is out of scope, so the account is
/// always homed at its root.
fn handle_cmd_pwd(login: &LoginState) -> CommandResult {
    if let Some(denied) = require_login(login) {
        return denied;
    }

    CommandResult {
        status: CommandStatus::Success,
        message: Some(responses::format_response(
            responses::PATH_CREATED,
            "\"/\" is the current directory",
        )),
    }
}

fn handle_cmd_unsupported(name: &str) -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure(format!("{} not implemented", name)),
        message: Some(responses::format_response(
            responses::NOT_IMPLEMENTED,
            "Command not implemented",
        )),
    }
}

fn handle_cmd_unknown() -> CommandResult {
    CommandResult {
        status: CommandStatus::Failure("Unknown command".into()),
        message: Some(responses::format_response(
            responses::SYNTAX_ERROR,
            "Unknown command",
        )),
    }
}

fn require_login(login: &LoginState) -> Option<CommandResult> {
    if login.is_authenticated() {
        None
    } else {
        Some(CommandResult {
            status: CommandStatus::Failure("Not logged in".into()),
            message: Some(responses::format_response(
                responses::NOT_LOGGED_IN,
                "Not logged in",
            )),
        })
    }
}
