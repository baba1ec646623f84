//! Stdio transport: JSON-RPC lines on stdin, replies on stdout.
//!
//! Requests are handled one at a time, so replies come back in arrival order.
//! A separate reader task keeps consuming input while a request runs, which is
//! what lets `notifications/cancelled` reach a request that is still in flight.

use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

use crate::protocol::ProtocolHandler;
use crate::types::{JsonRpcMessage, McpError, McpResult};

use super::framing;

enum Inbound {
    Message(JsonRpcMessage),
    Undecodable(McpError),
}

pub struct StdioTransport {
    handler: Arc<ProtocolHandler>,
}

impl StdioTransport {
    pub fn new(handler: Arc<ProtocolHandler>) -> Self {
        Self { handler }
    }

    pub async fn run(&self) -> McpResult<()> {
        tracing::info!("Stdio transport started");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve until `reader` reaches EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> McpResult<()>
    where
        R: AsyncBufRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin,
    {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let reader_task = tokio::spawn(read_loop(reader, Arc::clone(&self.handler), tx));

        while let Some(inbound) = rx.recv().await {
            let reply = match inbound {
                Inbound::Message(msg) => self.handler.handle_message(msg).await,
                Inbound::Undecodable(e) => {
                    tracing::warn!("Parse error: {e}");
                    Some(framing::undecodable_reply(&e))
                }
            };

            if let Some(reply) = reply {
                let framed = framing::frame_message(&reply)?;
                writer.write_all(framed.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        self.handler.cancel_all().await;
        reader_task
            .await
            .map_err(|e| McpError::Transport(e.to_string()))?
    }
}

async fn read_loop<R>(
    reader: R,
    handler: Arc<ProtocolHandler>,
    tx: mpsc::UnboundedSender<Inbound>,
) -> McpResult<()>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let inbound = match framing::parse_message(&line) {
            // Cancellations bypass the queue so they can overtake the request they target.
            Ok(msg @ JsonRpcMessage::Notification(_)) if is_cancellation(&msg) => {
                handler.handle_message(msg).await;
                continue;
            }
            Ok(msg) => Inbound::Message(msg),
            Err(e) => Inbound::Undecodable(e),
        };

        if tx.send(inbound).is_err() {
            break;
        }
    }

    tracing::info!("EOF on stdin, shutting down");
    Ok(())
}

fn is_cancellation(msg: &JsonRpcMessage) -> bool {
    matches!(
        msg.method(),
        Some("notifications/cancelled") | Some("$/cancelRequest")
    )
}
