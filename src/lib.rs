/*!
# armorlink

Client side of a small secure-channel protocol over TCP, plus the server
responder it talks to.

## Overview

A connection runs three steps in order and stops at the first failure:

1. Handshake: the server sends a 10-byte magic header, the client answers
   with its protocol version, the server replies with a one-byte verdict.
2. Public key confirmation: the server sends its RSA public key as DER; the
   client shows it as base64 and an operator (or policy) accepts or rejects
   it. There is no certificate chain, so trust is established on first use.
3. Session key establishment: the client generates a random symmetric key
   and IV, appends a digest of them, encrypts the result to the server's key
   with RSA PKCS#1 v1.5 and sends it.

Independently of the connection, [`HmacLayer`] computes and verifies
keyed-hash tags over messages using SHA-256, SHA-384 or SHA-512.

## Example

```no_run
use armorlink::{client, protocol::client::trust::ConsolePrompt};

# fn main() -> armorlink::Result<()> {
let client = client().build()?;
let (_stream, session) = client.connect(("example.org", armorlink::DEFAULT_PORT), &mut ConsolePrompt::stdio())?;
println!("{} byte session key", session.session_key().key().len());
# Ok(())
# }
```

Secret material (session keys, authentication keys and pads) lives in
buffers that are wiped on drop, and tag comparison runs in constant time.
*/

// Core protocol components
pub mod core;

// Protocol implementation
pub mod protocol;

// Re-export commonly used types for convenience
pub use core::error::{Error, ErrorKind, Result};
pub use core::constants::{DEFAULT_PORT, MAGIC_HEADER, PROTOCOL_VERSION, sizes};
pub use core::encoding::{encode_base64, wrap_pem};
pub use core::memory::SecureVec;
pub use core::security::constant_time_eq;

// Re-export crypto configuration and primitives
pub use core::crypto::{
    CryptoConfig, DigestAlgorithm, Envelope, HmacLayer, MessageBuffer, PublicKeyContainer, SessionKeyBundle,
    SymmetricCipher,
};

// Re-export protocol entry points
pub use protocol::builder::{ClientBuilder, ClientConfig, client};
pub use protocol::client::sync_client::{Client, Session};
pub use protocol::client::trust::{AcceptAll, ConsolePrompt, TrustPrompt};
pub use protocol::server::sync_server::Server;
