//! Discovery beacon
//!
//! Announces this node once per interval so peers on the segment can find
//! it without a registry. The payload never changes for the life of the
//! process, so it is rendered once up front.
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::time::interval;
use tracing::debug;

use crate::discovery::message::BeaconMessage;
use crate::error::{PeerbeatError, Result};

pub struct DiscoveryBeacon {
    socket: Arc<UdpSocket>,
    target: SocketAddr,
    payload: String,
    period: Duration,
}

impl DiscoveryBeacon {
    pub fn new(
        socket: Arc<UdpSocket>,
        target: SocketAddr,
        message: BeaconMessage,
        period: Duration,
    ) -> Self {
        Self {
            socket,
            target,
            payload: message.to_string(),
            period,
        }
    }

    /// Announce until shutdown. A send failure ends the loop with an error:
    /// either the socket works for the life of the process or the process is
    /// already failing, so there is no retry policy here.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) -> Result<()> {
        let mut ticker = interval(self.period);
        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("beacon loop stopped");
                    return Ok(());
                }
                _ = ticker.tick() => {
                    self.socket
                        .send_to(self.payload.as_bytes(), self.target)
                        .await
                        .map_err(|e| {
                            PeerbeatError::Transport(format!("Beacon send failed: {}", e))
                        })?;
                    debug!(target = %self.target, payload = %self.payload, "sent beacon");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peer_id::PeerId;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_beacon_announces_on_interval() {
        let receiver = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let target = receiver.local_addr().unwrap();

        let sender = Arc::new(UdpSocket::bind("127.0.0.1:0").await.unwrap());
        let peer_id: PeerId = "deadbeef".parse().unwrap();
        let beacon = DiscoveryBeacon::new(
            sender,
            target,
            BeaconMessage::new(peer_id.clone(), 4242),
            Duration::from_millis(10),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(beacon.run(shutdown_rx));

        let mut buf = [0u8; 128];
        for _ in 0..2 {
            let (len, _) = timeout(Duration::from_secs(2), receiver.recv_from(&mut buf))
                .await
                .expect("beacon should arrive")
                .unwrap();
            let message = BeaconMessage::parse(&buf[..len]).unwrap();
            assert_eq!(message.peer_id, peer_id);
            assert_eq!(message.tcp_port, 4242);
        }

        shutdown_tx.send(true).unwrap();
        let result = timeout(Duration::from_secs(2), task).await.unwrap().unwrap();
        assert!(result.is_ok());
    }
}
