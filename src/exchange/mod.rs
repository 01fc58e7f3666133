//! Clock-exchange protocol
//!
//! One TCP round trip per exchange: the client sends its timestamp, the
//! server answers with its own, both in ASCII decimal microseconds, and the
//! connection is done. The measured difference is the peer's clock offset.

mod client;
mod server;

pub use client::ClockExchangeClient;
pub use server::ClockExchangeServer;
