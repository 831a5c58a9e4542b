//! Helm FTP Server - Entry Point
//!
//! A minimal FTP server with an operator console: start/stop the server,
//! list connected clients, kick a client, and view the session log.

use std::io::{BufRead, Write};

use log::info;

use helm_ftp_server::config::ServerConfig;
use helm_ftp_server::{ControlPanel, KickOutcome};

fn main() {
    // env_logger picks up the RUST_LOG environment variable
    env_logger::init();

    info!("Launching FTP server control panel...");

    let config = match ServerConfig::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };
    let port = config.port;

    let panel = match ControlPanel::new(config) {
        Ok(panel) => panel,
        Err(e) => {
            eprintln!("Failed to initialize control panel: {}", e);
            std::process::exit(1);
        }
    };

    println!("Helm FTP server console. Type 'help' for commands.");
    let stdin = std::io::stdin();

    loop {
        print!("> ");
        let _ = std::io::stdout().flush();

        let mut line = String::new();
        match stdin.lock().read_line(&mut line) {
            Ok(0) => break,
            Ok(_) => {}
            Err(e) => {
                eprintln!("Failed to read command: {}", e);
                break;
            }
        }

        let mut parts = line.trim().splitn(2, char::is_whitespace);
        let verb = parts.next().unwrap_or("");
        let arg = parts.next().unwrap_or("").trim();

        match verb {
            "start" => match panel.start(port) {
                Ok(()) => println!(
                    "Server started on {}",
                    panel
                        .bound_addr()
                        .map(|a| a.to_string())
                        .unwrap_or_default()
                ),
                Err(e) => println!("{}", e),
            },
            "stop" => {
                panel.stop();
                println!("Server stopped");
            }
            "status" => println!("Server is {}", panel.state()),
            "list" => {
                let clients = panel.list_clients();
                if clients.is_empty() {
                    println!("No clients connected");
                } else {
                    for client in clients {
                        println!("{}", client);
                    }
                }
            }
            "kick" => match panel.kick(arg) {
                KickOutcome::Kicked => println!("Kicked: {}", arg),
                KickOutcome::NotFound => println!("No such client: {}", arg),
                KickOutcome::NoSelection => println!("Usage: kick <address>"),
            },
            "log" => {
                let entries = panel.read_log();
                if entries.is_empty() {
                    println!("No logs yet.");
                } else {
                    for entry in entries {
                        println!("{}", entry);
                    }
                }
            }
            "quit" | "exit" => break,
            "help" => {
                println!("Commands: start, stop, status, list, kick <address>, log, quit");
            }
            "" => {}
            other => println!("Unknown command: {} (try 'help')", other),
        }
    }

    panel.stop();
    info!("Console exiting");
}
