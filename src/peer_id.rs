//! Node identity
//!
//! Every process is identified by a short token that is generated once at
//! startup and never changes for the life of the process. The token is what
//! travels in discovery datagrams, so it is kept deliberately small and
//! strictly validated on receipt.
use std::fmt;
use std::str::FromStr;

/// Length of a peer identifier on the wire.
pub const PEER_ID_LEN: usize = 8;

/// Process-unique identifier: exactly 8 lowercase hex characters.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PeerId(String);

impl PeerId {
    /// Generate a fresh identifier for this process.
    pub fn generate() -> Self {
        // uuid's simple format is 32 lowercase hex chars; the wire format
        // carries the first 8.
        let hex = uuid::Uuid::new_v4().simple().to_string();
        PeerId(hex[..PEER_ID_LEN].to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Validate a candidate identifier token.
pub fn validate_peer_id(raw: &str) -> Result<(), String> {
    if raw.len() != PEER_ID_LEN {
        return Err(format!(
            "peer id must be {} characters, got {}",
            PEER_ID_LEN,
            raw.len()
        ));
    }
    if !raw
        .bytes()
        .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
    {
        return Err(format!("peer id must be lowercase hex: {:?}", raw));
    }
    Ok(())
}

impl FromStr for PeerId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        validate_peer_id(s)?;
        Ok(PeerId(s.to_string()))
    }
}

impl fmt::Display for PeerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
