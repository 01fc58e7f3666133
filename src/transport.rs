//! Socket setup
//!
//! The discovery socket needs options tokio's `UdpSocket::bind` does not
//! expose: address/port reuse so several nodes on one host can share the
//! well-known beacon port, and broadcast permission for the announce loop.
//! Built with socket2 and handed to tokio nonblocking.
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4, UdpSocket};

use socket2::{Domain, Protocol, Socket, Type};

use crate::error::{PeerbeatError, Result};

fn setup_err(err: std::io::Error) -> PeerbeatError {
    PeerbeatError::Transport(format!("Socket creation failed: {}", err))
}

/// Bind the shared discovery socket on `0.0.0.0:port`.
pub fn bind_broadcast_socket(port: u16) -> Result<UdpSocket> {
    let socket = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::UDP)).map_err(setup_err)?;
    socket.set_reuse_address(true).map_err(setup_err)?;
    #[cfg(all(unix, not(target_os = "solaris"), not(target_os = "illumos")))]
    socket.set_reuse_port(true).map_err(setup_err)?;
    socket.set_broadcast(true).map_err(setup_err)?;
    socket.set_nonblocking(true).map_err(setup_err)?;

    let bind_addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
    socket.bind(&bind_addr.into()).map_err(|e| {
        PeerbeatError::Transport(format!("Failed to bind UDP port {}: {}", port, e))
    })?;

    Ok(socket.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_socket_is_broadcast_capable() {
        let socket = bind_broadcast_socket(0).unwrap();
        assert!(socket.broadcast().unwrap());
        assert!(socket.local_addr().unwrap().port() > 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_two_nodes_share_the_beacon_port() {
        let first = bind_broadcast_socket(0).unwrap();
        let port = first.local_addr().unwrap().port();

        // A second node on the same host must be able to join the port.
        let second = bind_broadcast_socket(port).unwrap();
        assert_eq!(second.local_addr().unwrap().port(), port);
    }
}
