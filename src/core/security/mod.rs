/*!
Security utilities for the armorlink protocol.
*/

// Constant-time operations to prevent timing attacks
pub mod constant_time;

pub use constant_time::constant_time_eq;
