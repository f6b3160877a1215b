/*!
Constants for the armorlink protocol.

This module contains the wire constants shared by both ends of the
connection: the magic header, the protocol version, size bounds and the
key-container framing.
*/

/// Magic header sent by the server as the first bytes of every connection
pub const MAGIC_HEADER: [u8; 10] = [0xAF, 0xEA, 0x39, 0xE0, 0x67, 0x10, 0x20, 0xC9, 0x2F, 0xEB];

/// Protocol version spoken by this implementation
pub const PROTOCOL_VERSION: i32 = 0;

/// Default TCP port of the server
pub const DEFAULT_PORT: u16 = 2250;

/// Verdict byte sent by the server when the client version is accepted
pub const VERDICT_ACCEPTED: u8 = 0;

/// Verdict byte sent by the server when the client version is rejected
pub const VERDICT_REJECTED: u8 = 1;

/// Size constants for the protocol
pub mod sizes {
    /// Size of a length or version field in bytes
    pub const INT_FIELD_SIZE: usize = 4;

    /// Smallest public key blob accepted from the server
    pub const MIN_PUBLIC_KEY_SIZE: usize = 1;

    /// Largest public key blob accepted from the server (10 KiB)
    pub const MAX_PUBLIC_KEY_SIZE: usize = 1024 * 10;

    /// Largest encrypted envelope accepted by the server (10 KiB)
    pub const MAX_ENVELOPE_SIZE: usize = 1024 * 10;

    /// AES constants
    pub mod aes {
        /// Size of an AES-128 key in bytes
        pub const KEY_SIZE_128: usize = 16;

        /// Size of an AES-256 key in bytes
        pub const KEY_SIZE_256: usize = 32;

        /// Size of an AES initialization vector in bytes
        pub const IV_SIZE: usize = 16;
    }
}

/// Key container framing
pub mod pem {
    /// Header placed in front of the base64 encoded public key
    pub const PUBLIC_KEY_HEADER: &str = "-----BEGIN PUBLIC KEY-----\n";

    /// Footer placed after the base64 encoded public key
    pub const PUBLIC_KEY_FOOTER: &str = "\n-----END PUBLIC KEY-----\n";

    /// Column width of base64 lines inside a key container
    pub const LINE_WIDTH: usize = 64;
}

/// Inner pad byte of the keyed-hash construction
pub const HMAC_INNER_PAD: u8 = 0x36;

/// Outer pad byte of the keyed-hash construction
pub const HMAC_OUTER_PAD: u8 = 0x5c;
