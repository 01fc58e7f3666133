//! Clock-exchange client
//!
//! One short-lived task per exchange attempt: connect to the advertised
//! endpoint, trade timestamp frames, record the measured offset. Any failure
//! along the way declares the peer unreachable and removes it from the
//! neighbor table; no failure here may affect any other peer or loop.
use std::net::SocketAddr;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::clock;
use crate::error::ExchangeError;
use crate::neighbors::NeighborTable;
use crate::peer_id::PeerId;

/// Upper bound on a reply frame; an i64 in decimal is at most 19 digits.
const MAX_REPLY_LEN: u64 = 32;

pub struct ClockExchangeClient {
    peer_id: PeerId,
    address: SocketAddr,
    table: NeighborTable,
    deadline: Duration,
}

impl ClockExchangeClient {
    pub fn new(
        peer_id: PeerId,
        address: SocketAddr,
        table: NeighborTable,
        deadline: Duration,
    ) -> Self {
        Self {
            peer_id,
            address,
            table,
            deadline,
        }
    }

    /// Run the one-shot handshake and record the outcome in the table.
    pub async fn run(self) {
        debug!(peer_id = %self.peer_id, address = %self.address, "attempting clock exchange");
        match self.exchange().await {
            Ok((delay, t_local)) => {
                self.table
                    .upsert(self.peer_id.clone(), delay, t_local, self.address);
                info!(peer_id = %self.peer_id, delay_micros = delay, "clock exchange complete");
            }
            Err(err) => {
                let reason = err.evict_reason();
                self.table.remove(&self.peer_id);
                warn!(peer_id = %self.peer_id, reason, "clock exchange failed: {}", err);
            }
        }
    }

    /// The handshake proper: returns `(delay, t_local)` on success. Every
    /// network step runs under the configured deadline so an unresponsive
    /// peer cannot pin this task forever.
    async fn exchange(&self) -> Result<(i64, i64), ExchangeError> {
        let mut stream = match timeout(self.deadline, TcpStream::connect(self.address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => return Err(ExchangeError::Unreachable(e.to_string())),
            Err(_) => return Err(ExchangeError::DeadlineExceeded("connect")),
        };

        let t_local = clock::unix_micros();
        let frame = t_local.to_string();
        match timeout(self.deadline, stream.write_all(frame.as_bytes())).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(ExchangeError::SendFailed(e.to_string())),
            Err(_) => return Err(ExchangeError::DeadlineExceeded("send")),
        }

        let mut reply = Vec::new();
        match timeout(
            self.deadline,
            (&mut stream).take(MAX_REPLY_LEN).read_to_end(&mut reply),
        )
        .await
        {
            Ok(Ok(0)) => {
                return Err(ExchangeError::RecvFailed(
                    "peer closed without replying".to_string(),
                ))
            }
            Ok(Ok(_)) => {}
            Ok(Err(e)) => return Err(ExchangeError::RecvFailed(e.to_string())),
            Err(_) => return Err(ExchangeError::DeadlineExceeded("receive")),
        }

        let t_peer = parse_timestamp(&reply)?;
        Ok((clock::clock_delay(t_peer, t_local), t_local))
    }
}

/// Decode a timestamp frame defensively: a peer speaking anything but ASCII
/// decimal microseconds is a protocol violation, never a crash.
fn parse_timestamp(frame: &[u8]) -> Result<i64, ExchangeError> {
    let text = std::str::from_utf8(frame)
        .map_err(|_| ExchangeError::BadTimestamp("reply is not ASCII".to_string()))?;
    let digits = text.trim();
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ExchangeError::BadTimestamp(
            "reply is not a decimal timestamp".to_string(),
        ));
    }
    digits
        .parse::<i64>()
        .map_err(|_| ExchangeError::BadTimestamp("timestamp out of range".to_string()))
}
