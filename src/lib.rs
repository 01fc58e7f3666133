//! Peerbeat: decentralized peer discovery and clock-offset estimation for a
//! single broadcast domain.
//!
//! Nodes announce themselves over UDP broadcast, discover each other without
//! a central registry, and measure the clock offset to every discovered peer
//! with a one-shot TCP handshake. Each node keeps a live neighbor table that
//! evicts peers it has not heard from recently.
pub mod cli;
pub mod clock;
pub mod discovery;
pub mod error;
pub mod exchange;
pub mod neighbors;
pub mod node;
pub mod peer_id;
pub mod settings;
pub mod sweeper;
pub mod transport;

pub use error::{PeerbeatError, Result};
pub use neighbors::{NeighborEntry, NeighborTable};
pub use node::{Node, NodeHandle};
pub use peer_id::PeerId;
