//! hostsim-agent: local stand-in for the driver host platform.
//!
//! Listens on a Unix socket and handles JSON-RPC requests for the emulated
//! platform calls, so driver scripts can be exercised without the
//! production agent.

mod config;
mod handler;
mod protocol;

use config::AgentConfig;
use futures::{SinkExt, StreamExt};
use handler::handle_request;
use protocol::{error_codes, Request, Response};
use tokio::net::{UnixListener, UnixStream};
use tokio_util::codec::{Framed, LinesCodec, LinesCodecError};
use tracing::{debug, error, info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hostsim_agent=debug".parse()?),
        )
        .init();

    let config = AgentConfig::from_env();
    info!(?config, "hostsim-agent starting");

    // A stale socket from a previous run blocks bind.
    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
        debug!(path = %config.socket_path.display(), "removed stale socket");
    }

    let listener = UnixListener::bind(&config.socket_path)?;
    info!(path = %config.socket_path.display(), "listening for driver connections");

    loop {
        match listener.accept().await {
            Ok((stream, _addr)) => {
                let max_request_bytes = config.max_request_bytes;
                tokio::spawn(async move {
                    if let Err(e) = handle_connection(stream, max_request_bytes).await {
                        warn!(error = %e, "connection error");
                    }
                });
            }
            Err(e) => {
                error!(error = %e, "failed to accept connection");
            }
        }
    }
}

/// Serve newline-delimited JSON-RPC requests on one connection.
///
/// Lines are never buffered past `max_request_bytes`. An over-long line is
/// answered with `INVALID_REQUEST` and the connection is closed, since the
/// framing can no longer be trusted.
async fn handle_connection(stream: UnixStream, max_request_bytes: usize) -> anyhow::Result<()> {
    let mut framed = Framed::new(stream, LinesCodec::new_with_max_length(max_request_bytes));

    while let Some(line) = framed.next().await {
        let line = match line {
            Ok(line) => line,
            Err(LinesCodecError::MaxLineLengthExceeded) => {
                warn!(max = max_request_bytes, "request too large, closing connection");
                let response = Response::error(
                    0,
                    error_codes::INVALID_REQUEST,
                    format!("request exceeds {max_request_bytes} bytes"),
                );
                framed.send(serde_json::to_string(&response)?).await?;
                break;
            }
            Err(LinesCodecError::Io(e)) => return Err(e.into()),
        };

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }

        debug!(len = trimmed.len(), "received request");
        let response = match serde_json::from_str::<Request>(trimmed) {
            Ok(req) => handle_request(req),
            Err(e) => {
                warn!(error = %e, "failed to parse request");
                Response::error(0, error_codes::PARSE_ERROR, format!("parse error: {}", e))
            }
        };

        let json = serde_json::to_string(&response)?;
        debug!(len = json.len(), "sending response");
        framed.send(json).await?;
    }

    debug!("client disconnected");
    Ok(())
}
