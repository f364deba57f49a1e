//! Tor control-port session
//!
//! Talks the Tor control protocol to an already running Tor, over TCP or a
//! Unix control socket. Authentication supports no auth, cookie files and
//! controller passwords.

use std::path::Path;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::error::{ConnectError, ConnectResult};
use crate::models::{ConnectionMode, TorSettings, TorStatus};
use crate::session::{SessionFactory, TorSession};

/// Control ports tried by automatic mode, Tor Browser's first
const AUTOMATIC_PORTS: [u16; 3] = [9151, 9153, 9051];

/// Control socket tried by automatic mode
const AUTOMATIC_SOCKET: &str = "/var/run/tor/control";

trait ControlStream: AsyncRead + AsyncWrite + Unpin + Send + Sync {}

impl<T: AsyncRead + AsyncWrite + Unpin + Send + Sync> ControlStream for T {}

/// A reply from the controller: status code and the text of each line
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reply {
    code: u16,
    lines: Vec<String>,
}

impl Reply {
    const fn is_ok(&self) -> bool {
        self.code == 250
    }

    fn summary(&self) -> String {
        format!("{} {}", self.code, self.lines.join(" "))
    }
}

/// An open control connection
struct ControlConnection {
    stream: BufReader<Box<dyn ControlStream>>,
}

impl ControlConnection {
    fn new(stream: Box<dyn ControlStream>) -> Self {
        Self {
            stream: BufReader::new(stream),
        }
    }

    async fn command(&mut self, line: &str) -> ConnectResult<Reply> {
        self.stream.get_mut().write_all(line.as_bytes()).await?;
        self.stream.get_mut().write_all(b"\r\n").await?;
        self.stream.get_mut().flush().await?;
        self.read_reply().await
    }

    async fn read_reply(&mut self) -> ConnectResult<Reply> {
        let mut lines = Vec::new();
        loop {
            let line = self.read_line().await?;
            let (Some(code), Some(separator), Some(text)) =
                (line.get(..3), line.as_bytes().get(3), line.get(4..))
            else {
                return Err(ConnectError::Protocol(format!("short reply line: {line:?}")));
            };
            let code: u16 = code
                .parse()
                .map_err(|_| ConnectError::Protocol(format!("bad status code: {line:?}")))?;
            let separator = *separator;
            lines.push(text.to_string());
            match separator {
                b' ' => return Ok(Reply { code, lines }),
                b'-' => {}
                b'+' => loop {
                    let data = self.read_line().await?;
                    if data == "." {
                        break;
                    }
                    lines.push(data);
                },
                _ => return Err(ConnectError::Protocol(format!("bad reply line: {line:?}"))),
            }
        }
    }

    async fn read_line(&mut self) -> ConnectResult<String> {
        let mut line = String::new();
        let read = self.stream.read_line(&mut line).await?;
        if read == 0 {
            return Err(ConnectError::Protocol(
                "controller closed the connection".to_string(),
            ));
        }
        Ok(line.trim_end_matches(['\r', '\n']).to_string())
    }

    async fn quit(mut self) {
        if let Err(e) = self.stream.get_mut().write_all(b"QUIT\r\n").await {
            tracing::debug!(%e, "failed to send QUIT");
        }
        let _ = self.stream.get_mut().shutdown().await;
    }
}

/// Authentication methods offered in a PROTOCOLINFO reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct AuthInfo {
    methods: Vec<String>,
    cookie_file: Option<String>,
}

impl AuthInfo {
    fn parse(reply: &Reply) -> Self {
        let mut info = Self::default();
        for line in &reply.lines {
            let Some(rest) = line.strip_prefix("AUTH ") else {
                continue;
            };
            for field in split_fields(rest) {
                if let Some(methods) = field.strip_prefix("METHODS=") {
                    info.methods = methods.split(',').map(str::to_string).collect();
                } else if let Some(path) = field.strip_prefix("COOKIEFILE=") {
                    info.cookie_file = Some(unquote(path));
                }
            }
        }
        info
    }

    fn offers(&self, method: &str) -> bool {
        self.methods.iter().any(|m| m == method)
    }
}

/// Splits `KEY=value KEY="quoted value"` fields on unquoted spaces
fn split_fields(text: &str) -> Vec<&str> {
    let mut fields = Vec::new();
    let mut start = 0;
    let mut quoted = false;
    let mut escaped = false;
    for (i, c) in text.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' if quoted => escaped = true,
            '"' => quoted = !quoted,
            ' ' if !quoted => {
                if i > start {
                    fields.push(&text[start..i]);
                }
                start = i + 1;
            }
            _ => {}
        }
    }
    if start < text.len() {
        fields.push(&text[start..]);
    }
    fields
}

fn unquote(value: &str) -> String {
    let inner = value
        .strip_prefix('"')
        .and_then(|v| v.strip_suffix('"'))
        .unwrap_or(value);
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                out.push(next);
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// A `TorSession` backed by the Tor control protocol
#[derive(Default)]
pub struct ControlPortSession {
    connection: Option<ControlConnection>,
    status: Option<TorStatus>,
}

impl std::fmt::Debug for ControlPortSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControlPortSession")
            .field("connected", &self.connection.is_some())
            .field("status", &self.status)
            .finish()
    }
}

impl ControlPortSession {
    /// Creates an unconnected session
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the status reported by the controller, once connected
    #[must_use]
    pub const fn status(&self) -> Option<&TorStatus> {
        self.status.as_ref()
    }

    async fn open(settings: &TorSettings) -> ConnectResult<Box<dyn ControlStream>> {
        match settings.connection_mode {
            ConnectionMode::Bundled => Err(ConnectError::Unsupported(
                "the bundled Tor is not available, choose another connection mode".to_string(),
            )),
            ConnectionMode::ControlPort => {
                let port = parse_port(&settings.control_port_port)?;
                open_tcp(settings.control_port_address.trim(), port).await
            }
            ConnectionMode::SocketFile => open_socket(Path::new(&settings.socket_file_path)).await,
            ConnectionMode::Automatic => {
                for port in AUTOMATIC_PORTS {
                    match open_tcp("127.0.0.1", port).await {
                        Ok(stream) => return Ok(stream),
                        Err(e) => tracing::debug!(port, %e, "no Tor controller on port"),
                    }
                }
                open_socket(Path::new(AUTOMATIC_SOCKET)).await.map_err(|_| {
                    ConnectError::Unreachable(
                        "couldn't find a running Tor on the usual ports or socket".to_string(),
                    )
                })
            }
        }
    }

    async fn authenticate(
        connection: &mut ControlConnection,
        password: Option<&str>,
    ) -> ConnectResult<()> {
        let info = connection.command("PROTOCOLINFO 1").await?;
        if !info.is_ok() {
            return Err(ConnectError::Protocol(info.summary()));
        }
        let info = AuthInfo::parse(&info);
        tracing::debug!(methods = ?info.methods, "controller auth methods");

        let command = if let Some(password) = password {
            format!("AUTHENTICATE {}", quote(password))
        } else if info.offers("NULL") || info.methods.is_empty() {
            "AUTHENTICATE".to_string()
        } else if let (true, Some(path)) = (info.offers("COOKIE"), info.cookie_file.as_deref()) {
            let cookie = tokio::fs::read(path).await.map_err(|e| {
                ConnectError::AuthFailed(format!("can't read cookie file {path}: {e}"))
            })?;
            format!("AUTHENTICATE {}", hex::encode_upper(&cookie))
        } else {
            return Err(ConnectError::AuthFailed(
                "the Tor controller requires a password".to_string(),
            ));
        };

        let reply = connection.command(&command).await?;
        if reply.is_ok() {
            Ok(())
        } else {
            Err(ConnectError::AuthFailed(reply.summary()))
        }
    }

    async fn query_status(connection: &mut ControlConnection) -> ConnectResult<TorStatus> {
        let reply = connection.command("GETINFO version").await?;
        if !reply.is_ok() {
            return Err(ConnectError::Protocol(reply.summary()));
        }
        let version = reply
            .lines
            .iter()
            .find_map(|l| l.strip_prefix("version="))
            .ok_or_else(|| ConnectError::Protocol("no version in GETINFO reply".to_string()))?;
        Ok(TorStatus::from_version(version))
    }
}

fn parse_port(port: &str) -> ConnectResult<u16> {
    port.trim()
        .parse()
        .map_err(|_| ConnectError::Unreachable(format!("invalid control port: {port:?}")))
}

async fn open_tcp(address: &str, port: u16) -> ConnectResult<Box<dyn ControlStream>> {
    let stream = TcpStream::connect((address, port))
        .await
        .map_err(|e| ConnectError::Unreachable(format!("{address}:{port}: {e}")))?;
    Ok(Box::new(stream))
}

#[cfg(unix)]
async fn open_socket(path: &Path) -> ConnectResult<Box<dyn ControlStream>> {
    let stream = tokio::net::UnixStream::connect(path)
        .await
        .map_err(|e| ConnectError::Unreachable(format!("{}: {e}", path.display())))?;
    Ok(Box::new(stream))
}

#[cfg(not(unix))]
async fn open_socket(path: &Path) -> ConnectResult<Box<dyn ControlStream>> {
    Err(ConnectError::Unsupported(format!(
        "control socket files are not supported on this platform: {}",
        path.display()
    )))
}

#[async_trait]
impl TorSession for ControlPortSession {
    fn is_authenticated(&self) -> bool {
        self.connection.is_some() && self.status.is_some()
    }

    async fn connect(&mut self, settings: &TorSettings) -> ConnectResult<TorStatus> {
        self.cleanup().await;
        tracing::info!(mode = settings.connection_mode.as_str(), "connecting to Tor");

        let mut connection = ControlConnection::new(Self::open(settings).await?);
        Self::authenticate(&mut connection, settings.auth_password_for_connect()).await?;
        let status = Self::query_status(&mut connection).await?;
        tracing::info!(version = %status.tor_version, "connected to Tor");

        self.connection = Some(connection);
        self.status = Some(status.clone());
        Ok(status)
    }

    async fn cleanup(&mut self) {
        self.status = None;
        if let Some(connection) = self.connection.take() {
            tracing::debug!("closing Tor control connection");
            connection.quit().await;
        }
    }
}

/// Produces fresh `ControlPortSession`s for settings tests
#[derive(Debug, Default, Clone, Copy)]
pub struct ControlPortFactory;

impl SessionFactory for ControlPortFactory {
    fn isolated_session(&self) -> Box<dyn TorSession> {
        Box::new(ControlPortSession::new())
    }
}
