//! Client side of the armorlink protocol.
//!
//! The connection steps live in their own modules and are driven in order by
//! [`sync_client::Client`].

// Magic header and version negotiation
pub mod handshake;

// Public key confirmation and session key establishment
pub mod key_exchange;

// Operator confirmation of the server key
pub mod trust;

// Synchronous client implementation
pub mod sync_client;
