//! Peerbeat application settings
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::error::{PeerbeatError, Result};

pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const STANDARD_PORT_BROADCAST: u16 = 35498;
pub const DEFAULT_PORT_BROADCAST: &str = "35498";
pub const DEFAULT_BROADCAST_TARGET: &str = "255.255.255.255";

pub const DEFAULT_BEACON_INTERVAL_MS: &str = "1000";
pub const DEFAULT_RESYNC_CADENCE: &str = "10";
pub const DEFAULT_SWEEP_INTERVAL_MS: &str = "1000";
pub const DEFAULT_LIVENESS_TIMEOUT_MS: &str = "10000";
pub const DEFAULT_EXCHANGE_DEADLINE_MS: &str = "5000";

#[derive(Clone, Debug)]
pub struct Settings {
    // Server listen address
    pub listen_address: String,

    // TCP listen port for the clock-exchange server (0 = OS-assigned)
    pub tcp_listen_port: u16,

    // UDP port for discovery beacons
    pub broadcast_port: u16,

    // Beacon destination, "ip" or "ip:port"
    pub broadcast_target: String,

    // Node identifier override; generated when absent
    pub node_id: Option<String>,

    // Interval between announce beacons
    pub beacon_interval_ms: u64,

    // Beacons per peer between full clock exchanges
    pub resync_cadence: u8,

    // Interval between liveness sweeps
    pub sweep_interval_ms: u64,

    // Age past which a silent neighbor is evicted
    pub liveness_timeout_ms: u64,

    // Deadline for each clock-exchange network step
    pub exchange_deadline_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen_address: "0.0.0.0".to_string(),
            tcp_listen_port: 0,
            broadcast_port: STANDARD_PORT_BROADCAST,
            broadcast_target: DEFAULT_BROADCAST_TARGET.to_string(),
            node_id: None,
            beacon_interval_ms: 1000,
            resync_cadence: 10,
            sweep_interval_ms: 1000,
            liveness_timeout_ms: 10_000,
            exchange_deadline_ms: 5000,
        }
    }
}

impl Settings {
    pub fn beacon_interval(&self) -> Duration {
        Duration::from_millis(self.beacon_interval_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    pub fn liveness_timeout(&self) -> Duration {
        Duration::from_millis(self.liveness_timeout_ms)
    }

    pub fn exchange_deadline(&self) -> Duration {
        Duration::from_millis(self.exchange_deadline_ms)
    }

    /// Upper bound for a neighbor's refresh count: the beacon that would
    /// exceed it triggers a full exchange instead.
    pub fn refresh_limit(&self) -> u8 {
        self.resync_cadence.saturating_sub(1)
    }

    /// Where beacons are sent. A bare IP inherits the broadcast port; an
    /// explicit `ip:port` form overrides it (loopback test setups need this).
    pub fn broadcast_target_addr(&self) -> Result<SocketAddr> {
        if self.broadcast_target.contains(':') {
            self.broadcast_target.parse::<SocketAddr>().map_err(|e| {
                PeerbeatError::Config(format!(
                    "Invalid broadcast target {}: {}",
                    self.broadcast_target, e
                ))
            })
        } else {
            let ip = self.broadcast_target.parse::<IpAddr>().map_err(|e| {
                PeerbeatError::Config(format!(
                    "Invalid broadcast target {}: {}",
                    self.broadcast_target, e
                ))
            })?;
            Ok(SocketAddr::from((ip, self.broadcast_port)))
        }
    }

    /// Bind address for the clock-exchange TCP listener.
    pub fn tcp_bind_addr(&self) -> Result<SocketAddr> {
        let ip = self.listen_address.parse::<IpAddr>().map_err(|e| {
            PeerbeatError::Config(format!(
                "Invalid listen address {}: {}",
                self.listen_address, e
            ))
        })?;
        Ok(SocketAddr::from((ip, self.tcp_listen_port)))
    }
}
