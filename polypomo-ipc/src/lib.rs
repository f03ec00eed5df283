//! Inter-process communication between the polypomo daemon and its clients
//!
//! We use a Unix domain socket for local IPC. The wire format is plain
//! UTF-8 text, one command per connection, so status bars and shell
//! scripts can talk to the daemon without any framing.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub mod client;

pub use client::send;

/// Commands a client can send to the daemon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Toggle,
    AudioFinished,
    Switch,
    GetStatus,
    GetTime,
    End,
    Lock,
    /// `seconds` is signed: `time add -60` takes a minute off
    Time { op: TimeOp, seconds: i64 },
    Exit,
    /// Anything outside the grammar. The daemon treats it as a no-op.
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOp {
    Add,
    Sub,
}

impl TimeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            TimeOp::Add => "add",
            TimeOp::Sub => "sub",
        }
    }
}

impl Command {
    /// Decode one command from its wire text.
    ///
    /// Matching is exact and case-sensitive; no trimming is applied.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "toggle" => Command::Toggle,
            "audio_finished" => Command::AudioFinished,
            "switch" => Command::Switch,
            "gstatus" => Command::GetStatus,
            "gtime" => Command::GetTime,
            "end" => Command::End,
            "lock" => Command::Lock,
            "exit" => Command::Exit,
            _ => Self::parse_time(raw).unwrap_or_else(|| Command::Unrecognized(raw.to_string())),
        }
    }

    fn parse_time(raw: &str) -> Option<Self> {
        let mut parts = raw.split(' ');
        if parts.next()? != "time" {
            return None;
        }
        let op = match parts.next()? {
            "add" => TimeOp::Add,
            "sub" => TimeOp::Sub,
            _ => return None,
        };
        let seconds = parts.next()?.parse().ok()?;
        if parts.next().is_some() {
            return None;
        }
        Some(Command::Time { op, seconds })
    }

    /// Decode raw bytes as received from a socket.
    pub fn from_bytes(raw: &[u8]) -> Self {
        Self::parse(&String::from_utf8_lossy(raw))
    }

    /// Whether the client should wait for a reply after sending this command
    pub fn expects_reply(&self) -> bool {
        matches!(self, Command::GetTime | Command::GetStatus)
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Toggle => f.write_str("toggle"),
            Command::AudioFinished => f.write_str("audio_finished"),
            Command::Switch => f.write_str("switch"),
            Command::GetStatus => f.write_str("gstatus"),
            Command::GetTime => f.write_str("gtime"),
            Command::End => f.write_str("end"),
            Command::Lock => f.write_str("lock"),
            Command::Time { op, seconds } => write!(f, "time {} {}", op.as_str(), seconds),
            Command::Exit => f.write_str("exit"),
            Command::Unrecognized(raw) => f.write_str(raw),
        }
    }
}

#[derive(Error, Debug)]
pub enum IpcError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No instance is listening on {} - is polypomo running?", .0.display())]
    NotRunning(PathBuf),
}

/// Upper bound for a command or a reply, in bytes
pub const MAX_MESSAGE_LEN: usize = 1024;

pub const SOCKET_NAME: &str = "polypomo.sock";
pub const RUNTIME_DIR_ENV: &str = "XDG_RUNTIME_DIR";
pub const FALLBACK_RUNTIME_DIR: &str = "/var/tmp";

/// Well-known socket path: `$XDG_RUNTIME_DIR/polypomo.sock`, or under
/// `/var/tmp` when the variable is unset.
pub fn socket_path() -> PathBuf {
    let dir = std::env::var_os(RUNTIME_DIR_ENV)
        .filter(|dir| !dir.is_empty())
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(FALLBACK_RUNTIME_DIR));
    dir.join(SOCKET_NAME)
}
