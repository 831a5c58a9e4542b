use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpStream};
use std::thread;
use std::time::{Duration, Instant};

use helm_ftp_server::config::ServerConfig;
use helm_ftp_server::{ControlPanel, KickOutcome, ServerState};

fn test_config() -> ServerConfig {
    ServerConfig {
        bind_address: "127.0.0.1".to_string(),
        username: "alice".to_string(),
        password: "alice123".to_string(),
        server_root: std::env::temp_dir()
            .join("helm-ftp-test-root")
            .to_string_lossy()
            .to_string(),
        shutdown_timeout_secs: 2,
        ..ServerConfig::default()
    }
}

fn start_panel() -> (ControlPanel, SocketAddr) {
    let panel = ControlPanel::new(test_config()).unwrap();
    panel.start(0).unwrap();
    let addr = panel.bound_addr().unwrap();
    (panel, addr)
}

// Client side of one control connection
struct FtpClient {
    reader: BufReader<TcpStream>,
}

impl FtpClient {
    fn connect(addr: SocketAddr) -> Self {
        let mut attempts = 5;
        let stream = loop {
            match TcpStream::connect(addr) {
                Ok(stream) => break stream,
                Err(_) if attempts > 0 => {
                    thread::sleep(Duration::from_millis(100));
                    attempts -= 1;
                }
                Err(e) => panic!("Failed to connect: {}", e),
            }
        };
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        Self {
            reader: BufReader::new(stream),
        }
    }

    fn read_reply(&mut self) -> String {
        let mut line = String::new();
        self.reader.read_line(&mut line).unwrap();
        line.trim_end().to_string()
    }

    fn send_command(&mut self, command: &str) -> String {
        let stream = self.reader.get_mut();
        stream
            .write_all(format!("{}\r\n", command).as_bytes())
            .unwrap();
        stream.flush().unwrap();
        self.read_reply()
    }

    fn login(&mut self) {
        assert!(self.read_reply().starts_with("220"));
        assert_eq!(self.send_command("USER alice"), "331 Password required");
        assert_eq!(self.send_command("PASS alice123"), "230 Login successful");
    }

    /// Reads until the server closes the connection, returning everything
    /// seen on the way out.
    fn read_to_eof(&mut self) -> String {
        let mut rest = String::new();
        loop {
            let mut line = String::new();
            match self.reader.read_line(&mut line) {
                Ok(0) => return rest,
                Ok(_) => rest.push_str(&line),
                Err(e) => panic!("Read failed while draining connection: {}", e),
            }
        }
    }
}

fn wait_for(mut condition: impl FnMut() -> bool, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(20));
    }
    condition()
}

#[test]
fn second_start_returns_already_running() {
    let (panel, addr) = start_panel();

    let err = panel.start(0).unwrap_err();
    assert!(err.to_string().contains("already running"));

    // The first instance must remain active
    assert_eq!(panel.state(), ServerState::Running);
    assert_eq!(panel.bound_addr(), Some(addr));
    let mut client = FtpClient::connect(addr);
    assert!(client.read_reply().starts_with("220"));

    panel.stop();
}

#[test]
fn stop_is_idempotent_and_releases_the_port() {
    let (panel, addr) = start_panel();

    panel.stop();
    assert_eq!(panel.state(), ServerState::Stopped);
    panel.stop(); // no-op

    // The listening socket was released, so the same port binds again
    panel.start(addr.port()).unwrap();
    assert_eq!(panel.bound_addr().unwrap().port(), addr.port());
    panel.stop();
}

#[test]
fn bind_failure_is_reported_and_server_stays_stopped() {
    let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = occupied.local_addr().unwrap().port();

    let panel = ControlPanel::new(test_config()).unwrap();
    let err = panel.start(port).unwrap_err();
    assert!(err.to_string().contains("bind"));
    assert_eq!(panel.state(), ServerState::Stopped);
    assert!(panel.list_clients().is_empty());

    // A later start on a free port still works
    panel.start(0).unwrap();
    panel.stop();
}

#[test]
fn kick_closes_the_client_and_records_the_log() {
    let (panel, addr) = start_panel();

    let mut client = FtpClient::connect(addr);
    client.login();

    assert!(wait_for(
        || panel.list_clients().len() == 1,
        Duration::from_secs(2)
    ));
    let identity = panel.list_clients()[0].clone();

    assert_eq!(panel.kick(&identity), KickOutcome::Kicked);

    // The session closes from its own task: the client sees the 421
    // farewell and then EOF, and the listing drains.
    let farewell = client.read_to_eof();
    assert!(farewell.contains("421"), "unexpected farewell: {}", farewell);
    assert!(wait_for(
        || panel.list_clients().is_empty(),
        Duration::from_secs(2)
    ));

    let log = panel.read_log();
    assert!(log.contains(&format!("Kicked: {}", identity)));
    assert!(log.contains(&format!("Connected: {}", identity)));
    assert!(log.contains(&format!("Disconnected: {}", identity)));

    panel.stop();
}

#[test]
fn kick_of_unknown_identity_is_not_found() {
    let (panel, _addr) = start_panel();

    assert_eq!(panel.kick("203.0.113.7:9999"), KickOutcome::NotFound);
    assert_eq!(panel.kick(""), KickOutcome::NoSelection);
    assert!(panel.read_log().is_empty());

    panel.stop();
}

#[test]
fn kicking_one_of_two_clients_leaves_the_other() {
    let (panel, addr) = start_panel();

    let mut first = FtpClient::connect(addr);
    first.login();
    let mut second = FtpClient::connect(addr);
    second.login();

    assert!(wait_for(
        || panel.list_clients().len() == 2,
        Duration::from_secs(2)
    ));
    let clients = panel.list_clients();

    assert_eq!(panel.kick(&clients[0]), KickOutcome::Kicked);
    first.read_to_eof();

    assert!(wait_for(
        || panel.list_clients() == clients[1..],
        Duration::from_secs(2)
    ));

    // The survivor is still being served
    assert_eq!(second.send_command("NOOP"), "200 NOOP ok");

    panel.stop();
}

#[test]
fn auth_denial_is_local_to_the_session() {
    let (panel, addr) = start_panel();

    let mut client = FtpClient::connect(addr);
    assert!(client.read_reply().starts_with("220"));
    assert_eq!(client.send_command("USER mallory"), "530 Invalid username");
    assert_eq!(client.send_command("USER alice"), "331 Password required");
    assert_eq!(
        client.send_command("PASS wrong"),
        "530 Authentication failed"
    );

    // The denial did not kill the connection or the server
    assert_eq!(client.send_command("NOOP"), "200 NOOP ok");
    assert_eq!(client.send_command("QUIT"), "221 Goodbye");
    assert_eq!(panel.state(), ServerState::Running);

    panel.stop();
}

#[test]
fn commands_require_login_until_authenticated() {
    let (panel, addr) = start_panel();

    let mut client = FtpClient::connect(addr);
    assert!(client.read_reply().starts_with("220"));
    assert_eq!(client.send_command("PWD"), "530 Not logged in");
    assert_eq!(client.send_command("PASS alice123"), "503 Login with USER first");

    assert_eq!(client.send_command("USER alice"), "331 Password required");
    assert_eq!(client.send_command("PASS alice123"), "230 Login successful");
    assert_eq!(
        client.send_command("PWD"),
        "257 \"/\" is the current directory"
    );
    assert_eq!(
        client.send_command("LIST"),
        "502 Command not implemented"
    );

    panel.stop();
}

#[test]
fn quit_removes_the_session_from_the_listing() {
    let (panel, addr) = start_panel();

    let mut client = FtpClient::connect(addr);
    client.login();
    assert!(wait_for(
        || panel.list_clients().len() == 1,
        Duration::from_secs(2)
    ));

    assert_eq!(client.send_command("QUIT"), "221 Goodbye");
    assert!(wait_for(
        || panel.list_clients().is_empty(),
        Duration::from_secs(2)
    ));

    panel.stop();
}

#[test]
fn stop_terminates_active_sessions() {
    let (panel, addr) = start_panel();

    let mut client = FtpClient::connect(addr);
    client.login();
    assert!(wait_for(
        || panel.list_clients().len() == 1,
        Duration::from_secs(2)
    ));

    panel.stop();

    assert_eq!(panel.state(), ServerState::Stopped);
    assert!(panel.list_clients().is_empty());
    let farewell = client.read_to_eof();
    assert!(farewell.contains("421"), "unexpected farewell: {}", farewell);
}
