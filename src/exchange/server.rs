//! Clock-exchange server
//!
//! Answers inbound handshakes: every accepted connection gets the local
//! timestamp as an ASCII decimal frame, then the connection is closed. Each
//! connection runs on its own task so a slow or hostile peer cannot stall
//! acceptance of others.
use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tracing::{debug, warn};

use crate::clock;
use crate::error::{PeerbeatError, Result};

pub struct ClockExchangeServer {
    listener: TcpListener,
}

impl ClockExchangeServer {
    pub async fn bind(addr: SocketAddr) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| PeerbeatError::Transport(format!("Socket creation failed: {}", e)))?;
        Ok(Self { listener })
    }

    /// The bound address; the port here is what beacons advertise.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener
            .local_addr()
            .map_err(|e| PeerbeatError::Transport(format!("Socket creation failed: {}", e)))
    }

    /// Accept connections until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("exchange server stopped");
                    return Ok(());
                }
                accepted = self.listener.accept() => match accepted {
                    Ok((stream, peer_addr)) => {
                        tokio::spawn(handle_connection(stream, peer_addr));
                    }
                    Err(e) => {
                        // Continue accepting despite errors
                        warn!("TCP accept failed: {}", e);
                    }
                }
            }
        }
    }
}

/// One response, no further protocol: send our timestamp and close.
async fn handle_connection(mut stream: TcpStream, peer_addr: SocketAddr) {
    let now = clock::unix_micros();
    let frame = now.to_string();

    if let Err(e) = stream.write_all(frame.as_bytes()).await {
        warn!(%peer_addr, "failed to send timestamp: {}", e);
        return;
    }
    if let Err(e) = stream.shutdown().await {
        debug!(%peer_addr, "close after exchange failed: {}", e);
        return;
    }
    debug!(%peer_addr, timestamp = now, "answered clock exchange");
}
