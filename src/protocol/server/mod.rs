//! Server side of the armorlink protocol.

// Synchronous server implementation
pub mod sync_server;
