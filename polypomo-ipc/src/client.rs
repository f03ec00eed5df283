//! Client side of the protocol: one connection per command

use crate::{Command, IpcError, MAX_MESSAGE_LEN};
use std::io::ErrorKind;
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Send a single command to the daemon listening at `path`.
///
/// Queries (`gtime`, `gstatus`) wait for one reply buffer and return it;
/// everything else closes the connection right after writing and returns
/// `None`.
pub async fn send(path: &Path, command: &Command) -> Result<Option<String>, IpcError> {
    let mut stream = match UnixStream::connect(path).await {
        Ok(stream) => stream,
        Err(e) if matches!(e.kind(), ErrorKind::NotFound | ErrorKind::ConnectionRefused) => {
            return Err(IpcError::NotRunning(path.to_path_buf()));
        }
        Err(e) => return Err(e.into()),
    };

    stream.write_all(command.to_string().as_bytes()).await?;

    if !command.expects_reply() {
        return Ok(None);
    }

    let mut buf = vec![0; MAX_MESSAGE_LEN];
    let n = stream.read(&mut buf).await?;
    Ok(Some(String::from_utf8_lossy(&buf[..n]).into_owned()))
}
