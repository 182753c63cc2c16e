//! TCP transport. A connection carries JSON-RPC messages back to back, optionally
//! separated by whitespace, and every answer is written as one line.
use std::future::Future;
use std::io;
use std::sync::Arc;

use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::net::TcpListener;

use crate::handler::McpHandler;
use crate::protocol::{JsonRpcError, JsonRpcId, JsonRpcResponse};

const READ_CHUNK: usize = 4096;

/// Accepts connections until `shutdown` completes
pub async fn run<F>(listener: TcpListener, handler: Arc<McpHandler>, shutdown: F) -> io::Result<()>
where
    F: Future<Output = ()>,
{
    tokio::pin!(shutdown);
    loop {
        tokio::select! {
            () = &mut shutdown => {
                info!("MCP server has been shut down");
                return Ok(());
            }
            accepted = listener.accept() => {
                let (stream, peer) = accepted?;
                info!("New connection from {peer}");
                let handler = handler.clone();
                tokio::spawn(async move {
                    if let Err(e) = serve_connection(stream, &handler).await {
                        warn!("Connection from {peer} failed: {e}");
                    }
                    debug!("Connection from {peer} closed");
                });
            }
        }
    }
}

/// Answers requests until the peer closes its side or sends malformed JSON
pub async fn serve_connection<S>(mut stream: S, handler: &McpHandler) -> io::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buffer: Vec<u8> = Vec::new();
    let mut chunk = [0u8; READ_CHUNK];

    loop {
        let read = stream.read(&mut chunk).await?;
        let eof = read == 0;
        buffer.extend_from_slice(&chunk[..read]);

        let frames = split_messages(&buffer, eof);
        buffer.drain(..frames.consumed);

        for message in frames.messages {
            if let Some(response) = handler.handle(message).await {
                write_response(&mut stream, &response).await?;
            }
        }

        if let Some(reason) = frames.malformed {
            error!("Invalid JSON: {reason}");
            let response = JsonRpcResponse::error(
                JsonRpcId::Null,
                JsonRpcError::parse_error(format!("Invalid JSON: {reason}")),
            );
            write_response(&mut stream, &response).await?;
            stream.shutdown().await?;
            return Ok(());
        }
        if eof {
            return Ok(());
        }
    }
}

async fn write_response<S>(stream: &mut S, response: &JsonRpcResponse) -> io::Result<()>
where
    S: AsyncWrite + Unpin,
{
    let mut line = serde_json::to_vec(response)?;
    line.push(b'\n');
    stream.write_all(&line).await?;
    stream.flush().await
}

#[derive(Debug, Default)]
pub(crate) struct Frames {
    pub messages: Vec<Value>,
    /// Bytes of the buffer that have been turned into messages
    pub consumed: usize,
    pub malformed: Option<String>,
}

/// Splits the complete JSON values off the front of `buffer`. A trailing partial value is
/// left for the next read, unless the peer has closed the connection.
pub(crate) fn split_messages(buffer: &[u8], eof: bool) -> Frames {
    let mut frames = Frames::default();
    let mut values = serde_json::Deserializer::from_slice(buffer).into_iter::<Value>();
    loop {
        match values.next() {
            Some(Ok(value)) => {
                frames.messages.push(value);
                frames.consumed = values.byte_offset();
            }
            Some(Err(e)) if e.is_eof() && !eof => break,
            Some(Err(e)) => {
                frames.malformed = Some(e.to_string());
                break;
            }
            None => {
                frames.consumed = buffer.len();
                break;
            }
        }
    }
    frames
}
