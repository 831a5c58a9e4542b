//! Module `commands`
//!
//! Defines the FTP command parsing logic and the data structures used to
//! represent commands, their status, and results.

/// Represents an FTP command parsed from client input.
///
/// Commands that require arguments store them as `String` variants.
/// Commands that would need a data channel are recognized but carried as
/// `UNSUPPORTED` so handlers can answer them honestly.
#[derive(Debug, PartialEq)]
pub enum Command {
    QUIT,
    NOOP,
    SYST,
    PWD,
    USER(String),         // Username for login
    PASS(String),         // Password for login
    TYPE(String),         // Transfer type selection
    UNSUPPORTED(String),  // Recognized command outside this server's scope
    UNKNOWN,              // Unknown or malformed command
}

/// Represents the outcome status of executing a command.
pub enum CommandStatus {
    Success,
    Failure(String),
    CloseConnection,
}

/// Struct encapsulating the full result of a command execution.
pub struct CommandResult {
    pub status: CommandStatus,
    pub message: Option<String>,
}

/// Data-channel commands the server recognizes but does not implement.
const DATA_CHANNEL_COMMANDS: [&str; 8] = [
    "LIST", "RETR", "STOR", "APPE", "DELE", "PASV", "PORT", "CWD",
];

/// Parses a raw command string received from a client into the `Command`
/// enum.
///
/// Validates required arguments and returns `UNKNOWN` if a known command
/// is misused.
pub fn parse_command(raw: &str) -> Command {
    let trimmed = raw.trim();
    let mut parts = trimmed.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("").to_ascii_uppercase();
    let arg = parts.next().unwrap_or("").trim();

    match cmd.as_str() {
        "QUIT" => Command::QUIT,
        "NOOP" => Command::NOOP,
        "SYST" => Command::SYST,
        "PWD" => Command::PWD,
        "USER" if !arg.is_empty() => Command::USER(arg.to_string()),
        "PASS" if !arg.is_empty() => Command::PASS(arg.to_string()),
        "TYPE" if !arg.is_empty() => Command::TYPE(arg.to_ascii_uppercase()),
        c if DATA_CHANNEL_COMMANDS.contains(&c) => Command::UNSUPPORTED(c.to_string()),
        _ => Command::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_commands() {
        assert_eq!(parse_command("QUIT"), Command::QUIT);
        assert_eq!(parse_command("noop"), Command::NOOP);
        assert_eq!(parse_command("  SYST  "), Command::SYST);
        assert_eq!(parse_command("PWD"), Command::PWD);
    }

    #[test]
    fn parses_commands_with_arguments() {
        assert_eq!(
            parse_command("USER alice"),
            Command::USER("alice".to_string())
        );
        assert_eq!(
            parse_command("pass secret"),
            Command::PASS("secret".to_string())
        );
        assert_eq!(parse_command("TYPE i"), Command::TYPE("I".to_string()));
    }

    #[test]
    fn missing_required_argument_is_unknown() {
        assert_eq!(parse_command("USER"), Command::UNKNOWN);
        assert_eq!(parse_command("PASS"), Command::UNKNOWN);
        assert_eq!(parse_command("TYPE"), Command::UNKNOWN);
    }

    #[test]
    fn data_channel_commands_are_unsupported() {
        assert_eq!(
            parse_command("LIST"),
            Command::UNSUPPORTED("LIST".to_string())
        );
        assert_eq!(
            parse_command("STOR file.txt"),
            Command::UNSUPPORTED("STOR".to_string())
        );
        assert_eq!(
            parse_command("pasv"),
            Command::UNSUPPORTED("PASV".to_string())
        );
    }

    #[test]
    fn garbage_is_unknown() {
        assert_eq!(parse_command(""), Command::UNKNOWN);
        assert_eq!(parse_command("BADCMD now"), Command::UNKNOWN);
    }
}
