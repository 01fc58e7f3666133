//! Node wiring
//!
//! Binds the sockets, spawns the four long-lived loops (exchange server,
//! discovery listener, beacon, sweeper), and hands back a handle that owns
//! the shutdown signal. The TCP listener is bound first because the beacon
//! has to advertise whichever port the OS assigned.
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::discovery::{BeaconMessage, DiscoveryBeacon, DiscoveryListener};
use crate::error::{PeerbeatError, Result};
use crate::exchange::ClockExchangeServer;
use crate::neighbors::{NeighborEntry, NeighborTable};
use crate::peer_id::PeerId;
use crate::settings::Settings;
use crate::sweeper::LivenessSweeper;
use crate::transport;

pub struct Node {
    settings: Settings,
}

impl Node {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// Bind everything and start the loops. Socket failures here are fatal:
    /// a node that cannot open its ports has nothing useful to do.
    pub async fn start(self) -> Result<NodeHandle> {
        let peer_id = match &self.settings.node_id {
            Some(raw) => raw.parse::<PeerId>().map_err(PeerbeatError::Config)?,
            None => PeerId::generate(),
        };
        let table = NeighborTable::new(self.settings.refresh_limit());

        let server = ClockExchangeServer::bind(self.settings.tcp_bind_addr()?).await?;
        let tcp_addr = server.local_addr()?;

        let udp_std = transport::bind_broadcast_socket(self.settings.broadcast_port)?;
        let socket = Arc::new(UdpSocket::from_std(udp_std)?);
        let udp_addr = socket.local_addr()?;

        let target = self.settings.broadcast_target_addr()?;
        let message = BeaconMessage::new(peer_id.clone(), tcp_addr.port());

        let listener = DiscoveryListener::new(
            socket.clone(),
            peer_id.clone(),
            table.clone(),
            self.settings.exchange_deadline(),
        );
        let beacon = DiscoveryBeacon::new(
            socket,
            target,
            message,
            self.settings.beacon_interval(),
        );
        let sweeper = LivenessSweeper::new(
            table.clone(),
            self.settings.sweep_interval(),
            self.settings.liveness_timeout(),
        );

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let tasks = vec![
            tokio::spawn(server.run(shutdown_rx.clone())),
            tokio::spawn(listener.run(shutdown_rx.clone())),
            tokio::spawn(beacon.run(shutdown_rx.clone())),
            tokio::spawn(sweeper.run(shutdown_rx)),
        ];

        info!(peer_id = %peer_id, %tcp_addr, %udp_addr, "node started");
        Ok(NodeHandle {
            peer_id,
            table,
            tcp_addr,
            udp_addr,
            shutdown_tx,
            tasks,
        })
    }
}

/// Running node: owns the loop tasks and the shutdown signal.
pub struct NodeHandle {
    peer_id: PeerId,
    table: NeighborTable,
    tcp_addr: SocketAddr,
    udp_addr: SocketAddr,
    shutdown_tx: watch::Sender<bool>,
    tasks: Vec<JoinHandle<Result<()>>>,
}

impl NodeHandle {
    pub fn peer_id(&self) -> &PeerId {
        &self.peer_id
    }

    /// Advertised clock-exchange endpoint.
    pub fn tcp_addr(&self) -> SocketAddr {
        self.tcp_addr
    }

    /// Discovery socket address.
    pub fn udp_addr(&self) -> SocketAddr {
        self.udp_addr
    }

    /// Point-in-time view of the neighborhood.
    pub fn neighbors(&self) -> HashMap<PeerId, NeighborEntry> {
        self.table.snapshot()
    }

    /// Signal every loop to stop. Idempotent.
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Wait for all loops to finish, logging any that failed.
    pub async fn join(self) {
        for task in self.tasks {
            match task.await {
                Ok(Ok(())) => {}
                Ok(Err(err)) => error!("loop exited with error: {}", err),
                Err(err) => error!("loop task panicked: {}", err),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[tokio::test]
    async fn test_node_starts_and_shuts_down_cleanly() {
        let settings = Settings {
            listen_address: "127.0.0.1".to_string(),
            broadcast_port: 0,
            broadcast_target: "127.0.0.1:1".to_string(),
            node_id: Some("0badcafe".to_string()),
            beacon_interval_ms: 50,
            ..Settings::default()
        };
        let handle = Node::new(settings).start().await.unwrap();

        assert_eq!(handle.peer_id().as_str(), "0badcafe");
        assert!(handle.tcp_addr().port() > 0);
        assert!(handle.udp_addr().port() > 0);
        assert!(handle.neighbors().is_empty());

        handle.shutdown();
        timeout(Duration::from_secs(2), handle.join())
            .await
            .expect("all loops should stop on shutdown");
    }

    #[tokio::test]
    async fn test_node_rejects_bad_identifier_override() {
        let settings = Settings {
            node_id: Some("NOT-HEX!".to_string()),
            broadcast_port: 0,
            ..Settings::default()
        };
        let result = Node::new(settings).start().await;
        assert!(matches!(result, Err(PeerbeatError::Config(_))));
    }
}
