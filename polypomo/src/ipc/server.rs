//! Unix domain socket server for IPC
//!
//! The listener never runs on its own task. The daemon loop calls
//! [`Listener::serve_once`] after every tick, which listens for a bounded
//! window and handles at most one command before handing control back.

use crate::phase::PhaseState;
use anyhow::{Context, Result};
use polypomo_ipc::{Command, MAX_MESSAGE_LEN};
use std::io::Write;
use std::path::Path;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{UnixListener, UnixStream};
use tokio::time::{timeout, Instant};
use tracing::{debug, warn};

/// Total time spent listening per loop iteration
pub const LISTEN_WINDOW: Duration = Duration::from_millis(900);
/// Bound on a single accept, and on reading from an accepted connection
pub const ACCEPT_TIMEOUT: Duration = Duration::from_millis(200);

/// What the daemon loop should do after a listen window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Outcome of applying one command to the state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    None,
    /// Written back on the connection
    Reply(String),
    /// Written to the daemon's stdout
    Print(String),
    Exit,
}

/// Apply a decoded command to the state.
pub fn dispatch(command: &Command, state: &mut PhaseState) -> Response {
    match command {
        Command::Toggle => state.toggle(),
        Command::AudioFinished => state.mark_audio_finished(),
        Command::Switch => {
            state.next_timer();
            state.toggle();
        }
        Command::GetStatus => return Response::Print(format!("{}\n", state.phase())),
        Command::GetTime => return Response::Reply(state.render_status_line()),
        Command::End => state.next_timer(),
        Command::Lock => state.toggle_lock(),
        Command::Time { op, seconds } => state.change(*op, *seconds),
        Command::Exit => return Response::Exit,
        Command::Unrecognized(raw) => debug!("Ignoring unrecognized command {:?}", raw),
    }
    Response::None
}

pub struct Listener {
    inner: UnixListener,
    window: Duration,
    accept_timeout: Duration,
}

impl Listener {
    pub fn bind(path: &Path) -> Result<Self> {
        let inner = UnixListener::bind(path)
            .with_context(|| format!("Failed to bind socket at {}", path.display()))?;
        Ok(Self::from_listener(inner))
    }

    pub fn from_listener(inner: UnixListener) -> Self {
        Self {
            inner,
            window: LISTEN_WINDOW,
            accept_timeout: ACCEPT_TIMEOUT,
        }
    }

    pub fn with_timing(mut self, window: Duration, accept_timeout: Duration) -> Self {
        self.window = window;
        self.accept_timeout = accept_timeout;
        self
    }

    /// Listen for one window and handle at most one command.
    pub async fn serve_once(&self, state: &mut PhaseState) -> Flow {
        let Some((mut stream, command)) = self.next_command().await else {
            return Flow::Continue;
        };

        let flow = match dispatch(&command, state) {
            Response::None => Flow::Continue,
            Response::Reply(reply) => {
                if let Err(e) = stream.write_all(reply.as_bytes()).await {
                    warn!("Failed to reply to {}: {}", command, e);
                }
                Flow::Continue
            }
            Response::Print(text) => {
                print_status(&text);
                Flow::Continue
            }
            Response::Exit => Flow::Exit,
        };

        if let Err(e) = stream.shutdown().await {
            debug!("Error closing connection after {}: {}", command, e);
        }
        flow
    }

    /// Accept connections until one delivers data or the window closes.
    async fn next_command(&self) -> Option<(UnixStream, Command)> {
        let deadline = Instant::now() + self.window;

        loop {
            let left = deadline.checked_duration_since(Instant::now())?;
            if left.is_zero() {
                return None;
            }

            let mut stream = match timeout(self.accept_timeout.min(left), self.inner.accept()).await
            {
                Ok(Ok((stream, _))) => stream,
                Ok(Err(e)) => {
                    warn!("Error accepting connection: {}", e);
                    tokio::time::sleep(self.accept_timeout.min(left)).await;
                    continue;
                }
                Err(_) => continue,
            };

            // Reads share the window's deadline so a cycle never overruns it
            let left = deadline.saturating_duration_since(Instant::now());
            let mut buf = [0u8; MAX_MESSAGE_LEN];
            match timeout(self.accept_timeout.min(left), stream.read(&mut buf)).await {
                Ok(Ok(n)) if n > 0 => return Some((stream, Command::from_bytes(&buf[..n]))),
                Ok(Ok(_)) => debug!("Connection closed without a command"),
                Ok(Err(e)) => debug!("Error reading command: {}", e),
                Err(_) => debug!("No command before timeout"),
            }
        }
    }
}

fn print_status(text: &str) {
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = stdout.write_all(text.as_bytes()).and_then(|_| stdout.flush()) {
        warn!("Failed to write status: {}", e);
    }
}
