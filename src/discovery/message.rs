//! Discovery wire format
//!
//! One announce datagram per beacon: `"<peer_id> ON <tcp_port>"`, plain
//! ASCII. The id is exactly 8 lowercase hex characters and the port 1-5
//! decimal digits; anything else is discarded by the listener.
use std::fmt;

use crate::error::DiscoveryError;
use crate::peer_id::PeerId;

const SEPARATOR: &str = " ON ";
const MAX_PORT_DIGITS: usize = 5;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BeaconMessage {
    pub peer_id: PeerId,
    pub tcp_port: u16,
}

impl BeaconMessage {
    pub fn new(peer_id: PeerId, tcp_port: u16) -> Self {
        Self { peer_id, tcp_port }
    }

    /// Strict parse of a received datagram. The whole payload must match the
    /// announce pattern; trailing line endings are tolerated, trailing
    /// garbage is not.
    pub fn parse(datagram: &[u8]) -> Result<Self, DiscoveryError> {
        let text = std::str::from_utf8(datagram)
            .map_err(|_| DiscoveryError::Malformed("payload is not ASCII".to_string()))?;
        let text = text.trim_end_matches(['\r', '\n']);

        let (id_part, port_part) = text
            .split_once(SEPARATOR)
            .ok_or_else(|| DiscoveryError::Malformed("missing announce separator".to_string()))?;

        let peer_id = id_part.parse::<PeerId>().map_err(DiscoveryError::Malformed)?;

        if port_part.is_empty()
            || port_part.len() > MAX_PORT_DIGITS
            || !port_part.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(DiscoveryError::Malformed(
                "port is not 1-5 decimal digits".to_string(),
            ));
        }
        let tcp_port = port_part
            .parse::<u16>()
            .map_err(|_| DiscoveryError::Malformed("port out of range".to_string()))?;

        Ok(Self { peer_id, tcp_port })
    }
}

impl fmt::Display for BeaconMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.peer_id, SEPARATOR, self.tcp_port)
    }
}
