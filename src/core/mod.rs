//! Core components for the armorlink protocol.
//!
//! This module contains the fundamental building blocks: wire framing,
//! cryptographic primitives, secret storage and error handling.

// Export cryptographic functionality
pub mod crypto;

// Blocking wire primitives
pub mod channel;

// Base64 and PEM text helpers
pub mod encoding;

// Export memory handling for sensitive data
pub mod memory;

// Export security utilities
pub mod security;

// Protocol constants
pub mod constants;

// Error handling
pub mod error;

// Re-exports for convenience
pub use self::error::{Error, ErrorKind, Result};
pub use self::constants::{DEFAULT_PORT, MAGIC_HEADER, PROTOCOL_VERSION};
