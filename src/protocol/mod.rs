//! Protocol implementation for armorlink.
//!
//! This module contains the connection sequence: the client side with its
//! handshake, key exchange and trust prompt, and the server responder.

// Client implementation
pub mod client;

// Server implementation
pub mod server;

// Builder
pub mod builder;

// Re-export for convenience
pub use builder::{ClientBuilder, ClientConfig, client};
pub use client::sync_client::{Client, Session};
pub use server::sync_server::Server;
