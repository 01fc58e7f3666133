//! Discovery listener
//!
//! Receives announce datagrams from the segment and decides, per beacon,
//! whether the peer needs a full clock exchange or only a liveness refresh.
//! No datagram is allowed to take the loop down: malformed payloads and our
//! own beacons are filtered, receive errors are logged and the loop
//! continues.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tracing::{debug, trace, warn};

use crate::clock;
use crate::discovery::message::BeaconMessage;
use crate::error::{DiscoveryError, Result};
use crate::exchange::ClockExchangeClient;
use crate::neighbors::{BeaconDisposition, NeighborTable};
use crate::peer_id::PeerId;

pub struct DiscoveryListener {
    socket: Arc<UdpSocket>,
    local_id: PeerId,
    table: NeighborTable,
    exchange_deadline: Duration,
}

impl DiscoveryListener {
    pub fn new(
        socket: Arc<UdpSocket>,
        local_id: PeerId,
        table: NeighborTable,
        exchange_deadline: Duration,
    ) -> Self {
        Self {
            socket,
            local_id,
            table,
            exchange_deadline,
        }
    }

    /// Receive datagrams until shutdown.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut buf = vec![0u8; 4096];
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("listener loop stopped");
                    return Ok(());
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, src)) => self.handle_datagram(&buf[..len], src),
                    Err(e) => {
                        // Continue receiving despite errors
                        warn!("UDP receive error: {}", e);
                    }
                }
            }
        }
    }

    fn handle_datagram(&self, datagram: &[u8], src: SocketAddr) {
        let message = match self.classify(datagram) {
            Ok(message) => message,
            Err(DiscoveryError::SelfBeacon) => {
                trace!(%src, "ignoring our own beacon");
                return;
            }
            Err(err) => {
                debug!(%src, %err, "discarded datagram");
                return;
            }
        };

        debug!(peer_id = %message.peer_id, %src, "received beacon");
        let now = clock::unix_micros();
        match self.table.observe_beacon(&message.peer_id, now) {
            BeaconDisposition::Refreshed => {}
            BeaconDisposition::Resync => {
                let address = SocketAddr::new(src.ip(), message.tcp_port);
                let client = ClockExchangeClient::new(
                    message.peer_id,
                    address,
                    self.table.clone(),
                    self.exchange_deadline,
                );
                tokio::spawn(client.run());
            }
        }
    }

    /// Parse and filter one datagram. Beacons we broadcast ourselves come
    /// back on the shared port and must never create a neighbor entry.
    fn classify(&self, datagram: &[u8]) -> std::result::Result<BeaconMessage, DiscoveryError> {
        let message = BeaconMessage::parse(datagram)?;
        if message.peer_id == self.local_id {
            return Err(DiscoveryError::SelfBeacon);
        }
        Ok(message)
    }
}
