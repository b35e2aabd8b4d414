//! JSON-lines TCP front door for the engine.
//!
//! Each line a client sends is one `Request`; each line written back is the
//! matching `Response`. Connections are independent tasks that share the
//! engine handle, so the engine still sees one request at a time.

use std::net::SocketAddr;

use anyhow::Result;
use rr_engine::{EngineHandle, Request, Response};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

pub async fn serve(listener: TcpListener, engine: EngineHandle) -> Result<()> {
    info!(addr = ?listener.local_addr().ok(), endpoint = engine.name(), "accepting connections");
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                let engine = engine.clone();
                tokio::spawn(async move {
                    if let Err(err) = handle_connection(stream, peer, engine).await {
                        warn!(%peer, error = ?err, "connection closed with error");
                    }
                });
            }
            Err(err) => warn!(error = ?err, "failed to accept connection"),
        }
    }
}

async fn handle_connection(stream: TcpStream, peer: SocketAddr, engine: EngineHandle) -> Result<()> {
    debug!(%peer, "client connected");
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<Request>(line) {
            Ok(request) => engine.request(request).await?,
            Err(err) => Response::error(format!("malformed request: {err}")),
        };

        let mut encoded = serde_json::to_vec(&response)?;
        encoded.push(b'\n');
        writer.write_all(&encoded).await?;
        writer.flush().await?;
    }

    debug!(%peer, "client disconnected");
    Ok(())
}
