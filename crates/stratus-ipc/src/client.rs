//! One-shot control client
//!
//! The client half of the wire protocol: connect, send one request, read
//! the response up to the delimiter. Used by the `stratus` CLI.

use std::path::Path;

use anyhow::Context;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

use crate::protocol::{Command, DELIMITER};

/// Send a command to the daemon at `socket_path` and return its response
/// with the delimiter stripped.
pub async fn send_request(socket_path: &Path, command: &Command) -> anyhow::Result<String> {
    let mut stream = UnixStream::connect(socket_path).await.with_context(|| {
        format!(
            "failed to connect to {} (is stratusd running?)",
            socket_path.display()
        )
    })?;

    let mut request = command.to_request();
    request.push(DELIMITER);
    stream.write_all(request.as_bytes()).await?;

    let mut response = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let read = stream.read(&mut chunk).await?;
        if read == 0 {
            break;
        }
        response.extend_from_slice(&chunk[..read]);
        if response.contains(&(DELIMITER as u8)) {
            break;
        }
    }

    let text = String::from_utf8_lossy(&response);
    Ok(text.trim_end().trim_end_matches(DELIMITER).to_string())
}
