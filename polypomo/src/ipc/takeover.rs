//! Startup handshake that displaces a previously running daemon
//!
//! The old daemon is asked to `exit` through the socket; we then poll until
//! nothing serves the path any more and bind our own listener over it. This
//! is best effort: if the old daemon never lets go, the path is presumed
//! stale and replaced anyway.

use super::server::Listener;
use anyhow::{Context, Result};
use polypomo_ipc::{Command, IpcError};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;
use std::time::Duration;
use tokio::net::UnixStream;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy)]
pub struct TakeoverPolicy {
    pub retries: u32,
    pub interval: Duration,
}

impl Default for TakeoverPolicy {
    fn default() -> Self {
        Self {
            retries: 20,
            interval: Duration::from_millis(500),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Takeover {
    /// Nothing was listening
    NoDaemon,
    /// A daemon received `exit` and released the socket
    Displaced,
    /// A daemon received `exit` but the socket was still served after all
    /// retries
    Stale,
    /// Connecting failed for another reason, e.g. permission denied
    Unreachable,
}

/// Ask whatever listens on `path` to exit and wait for it to let go.
pub async fn displace_running(path: &Path, policy: TakeoverPolicy) -> Takeover {
    match polypomo_ipc::send(path, &Command::Exit).await {
        Ok(_) => {}
        Err(IpcError::NotRunning(_)) => {
            info!("No instance is listening on {}", path.display());
            return Takeover::NoDaemon;
        }
        Err(e) => {
            warn!("Could not reach {}: {}", path.display(), e);
            return Takeover::Unreachable;
        }
    }

    for _ in 0..policy.retries {
        if released(path).await {
            info!("Previous instance released {}", path.display());
            return Takeover::Displaced;
        }
        tokio::time::sleep(policy.interval).await;
    }

    warn!("Socket {} was not released, assuming it's stale", path.display());
    Takeover::Stale
}

/// The path is gone, or nobody accepts connections on it any more.
async fn released(path: &Path) -> bool {
    if !path.exists() {
        return true;
    }
    match UnixStream::connect(path).await {
        Ok(_) => false,
        Err(e) => matches!(e.kind(), ErrorKind::ConnectionRefused | ErrorKind::NotFound),
    }
}

/// Displace any running daemon, clear the path and bind a fresh listener.
pub async fn bind_fresh(path: &Path, policy: TakeoverPolicy) -> Result<Listener> {
    displace_running(path, policy).await;

    ensure_socket_parent(path)?;
    remove_socket_if_exists(path)
        .with_context(|| format!("Failed to remove old socket at {}", path.display()))?;
    let listener = Listener::bind(path)?;
    info!("IPC server listening on {}", path.display());
    Ok(listener)
}

fn ensure_socket_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display())),
        _ => Ok(()),
    }
}

fn remove_socket_if_exists(path: &Path) -> std::io::Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}
