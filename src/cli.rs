//! CLI for this application
//!
use crate::settings;

#[derive(Clone, Debug, clap::Parser)]
pub struct Cli {
    // Server listen address
    #[clap(
        long,
        default_value = "0.0.0.0",
        env("PEERBEAT_LISTEN_ADDRESS"),
        help = "IP Address to listen on"
    )]
    pub listen_address: String,

    // TCP listen port for clock exchanges
    #[clap(
        long,
        default_value = "0",
        env("PEERBEAT_TCP_LISTEN_PORT"),
        help = "TCP port for the clock-exchange server (0 = OS-assigned)"
    )]
    pub tcp_listen_port: u16,

    // UDP port for discovery beacons
    #[clap(
        long,
        default_value = settings::DEFAULT_PORT_BROADCAST,
        env("PEERBEAT_BROADCAST_PORT"),
        help = "UDP port to bind for discovery beacons"
    )]
    pub broadcast_port: u16,

    // Beacon destination address
    #[clap(
        long,
        default_value = settings::DEFAULT_BROADCAST_TARGET,
        env("PEERBEAT_BROADCAST_TARGET"),
        help = "Beacon destination, 'ip' or 'ip:port' (defaults to the broadcast port)"
    )]
    pub broadcast_target: String,

    // Node identity override
    #[clap(
        long,
        env("PEERBEAT_NODE_ID"),
        help = "Node identifier (8 lowercase hex chars); generated when absent"
    )]
    pub node_id: Option<String>,

    // Interval between announce beacons
    #[clap(
        long,
        default_value = settings::DEFAULT_BEACON_INTERVAL_MS,
        env("PEERBEAT_BEACON_INTERVAL_MS"),
        help = "Milliseconds between announce beacons"
    )]
    pub beacon_interval_ms: u64,

    // Beacons per peer between full clock exchanges
    #[clap(
        long,
        default_value = settings::DEFAULT_RESYNC_CADENCE,
        env("PEERBEAT_RESYNC_CADENCE"),
        help = "Beacons received from a peer between full clock exchanges"
    )]
    pub resync_cadence: u8,

    // Interval between liveness sweeps
    #[clap(
        long,
        default_value = settings::DEFAULT_SWEEP_INTERVAL_MS,
        env("PEERBEAT_SWEEP_INTERVAL_MS"),
        help = "Milliseconds between liveness sweeps"
    )]
    pub sweep_interval_ms: u64,

    // Eviction horizon
    #[clap(
        long,
        default_value = settings::DEFAULT_LIVENESS_TIMEOUT_MS,
        env("PEERBEAT_LIVENESS_TIMEOUT_MS"),
        help = "Milliseconds of silence before a neighbor is evicted"
    )]
    pub liveness_timeout_ms: u64,

    // Per-step handshake deadline
    #[clap(
        long,
        default_value = settings::DEFAULT_EXCHANGE_DEADLINE_MS,
        env("PEERBEAT_EXCHANGE_DEADLINE_MS"),
        help = "Milliseconds allowed for each clock-exchange network step"
    )]
    pub exchange_deadline_ms: u64,
}

impl Cli {
    pub fn into_settings(self) -> settings::Settings {
        settings::Settings {
            listen_address: self.listen_address,
            tcp_listen_port: self.tcp_listen_port,
            broadcast_port: self.broadcast_port,
            broadcast_target: self.broadcast_target,
            node_id: self.node_id,
            beacon_interval_ms: self.beacon_interval_ms,
            resync_cadence: self.resync_cadence,
            sweep_interval_ms: self.sweep_interval_ms,
            liveness_timeout_ms: self.liveness_timeout_ms,
            exchange_deadline_ms: self.exchange_deadline_ms,
        }
    }
}
