use std::fmt;

/// Main error type for the peerbeat discovery daemon
#[derive(Debug)]
pub enum PeerbeatError {
    /// Configuration or CLI argument errors
    Config(String),

    /// Discovery datagram errors
    Discovery(DiscoveryError),

    /// Clock-exchange handshake errors
    Exchange(ExchangeError),

    /// System I/O errors
    Io(std::io::Error),

    /// Socket setup and transport errors
    Transport(String),
}

/// Discovery protocol specific errors
#[derive(Debug)]
pub enum DiscoveryError {
    /// Datagram did not match the announce pattern
    Malformed(String),

    /// Beacon originated from this node
    SelfBeacon,
}

/// Clock-exchange handshake errors
#[derive(Debug)]
pub enum ExchangeError {
    /// Connection could not be established
    Unreachable(String),

    /// Send failed mid-handshake
    SendFailed(String),

    /// Receive failed mid-handshake
    RecvFailed(String),

    /// Peer reply was not a valid timestamp frame
    BadTimestamp(String),

    /// A handshake step exceeded its deadline
    DeadlineExceeded(&'static str),
}

impl ExchangeError {
    /// Eviction reason recorded when this failure removes a neighbor.
    pub fn evict_reason(&self) -> &'static str {
        match self {
            ExchangeError::Unreachable(_) => "refused",
            ExchangeError::SendFailed(_) => "send failure",
            ExchangeError::RecvFailed(_) => "receive failure",
            ExchangeError::BadTimestamp(_) => "receive failure",
            ExchangeError::DeadlineExceeded(_) => "timeout",
        }
    }
}

impl fmt::Display for PeerbeatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PeerbeatError::Config(msg) => write!(f, "Configuration error: {}", msg),
            PeerbeatError::Discovery(err) => write!(f, "Discovery error: {}", err),
            PeerbeatError::Exchange(err) => write!(f, "Exchange error: {}", err),
            PeerbeatError::Io(err) => write!(f, "I/O error: {}", err),
            PeerbeatError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl fmt::Display for DiscoveryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiscoveryError::Malformed(msg) => write!(f, "Malformed datagram: {}", msg),
            DiscoveryError::SelfBeacon => write!(f, "Beacon from this node"),
        }
    }
}

impl fmt::Display for ExchangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExchangeError::Unreachable(msg) => write!(f, "Peer unreachable: {}", msg),
            ExchangeError::SendFailed(msg) => write!(f, "Send failed: {}", msg),
            ExchangeError::RecvFailed(msg) => write!(f, "Receive failed: {}", msg),
            ExchangeError::BadTimestamp(msg) => write!(f, "Bad timestamp: {}", msg),
            ExchangeError::DeadlineExceeded(step) => write!(f, "Deadline exceeded during {}", step),
        }
    }
}

impl std::error::Error for PeerbeatError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PeerbeatError::Io(err) => Some(err),
            PeerbeatError::Discovery(err) => Some(err),
            PeerbeatError::Exchange(err) => Some(err),
            _ => None,
        }
    }
}

impl std::error::Error for DiscoveryError {}
impl std::error::Error for ExchangeError {}

// Convenient type alias for Results using our error type
pub type Result<T> = std::result::Result<T, PeerbeatError>;

// Conversions from common error types
impl From<std::io::Error> for PeerbeatError {
    fn from(err: std::io::Error) -> Self {
        PeerbeatError::Io(err)
    }
}

impl From<DiscoveryError> for PeerbeatError {
    fn from(err: DiscoveryError) -> Self {
        PeerbeatError::Discovery(err)
    }
}

impl From<ExchangeError> for PeerbeatError {
    fn from(err: ExchangeError) -> Self {
        PeerbeatError::Exchange(err)
    }
}
