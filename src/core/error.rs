/*!
Error handling for the armorlink protocol.

Every step of the handshake and key exchange is fail-fast: the first error
aborts the sequence and is returned to the caller. Variants carry enough
detail for logs but never key material. [`ErrorKind`] collapses them into
the stable categories operators and scripts see as exit codes.
*/

use std::fmt;
use std::io;
use thiserror::Error;

/// Result type for the armorlink protocol
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for the armorlink protocol
#[derive(Error, Debug)]
pub enum Error {
    /// Peer closed the connection before the expected byte count arrived
    #[error("Connection closed after {received} of {expected} bytes")]
    ConnectionClosed {
        expected: usize,
        received: usize,
    },

    /// Hard I/O error while reading
    #[error("Read failed: {0}")]
    Read(#[source] io::Error),

    /// Hard I/O error while writing
    #[error("Write failed: {0}")]
    Write(#[source] io::Error),

    /// Could not resolve or connect to the server
    #[error("Cannot connect: {0}")]
    Connect(#[source] io::Error),

    /// Magic header mismatch, or the header could not be read
    #[error("Invalid protocol")]
    ProtocolMismatch,

    /// Server refused the client's protocol version
    #[error("Invalid protocol version, outdated client (verdict {verdict})")]
    UnsupportedVersion {
        verdict: u8,
    },

    /// Declared public key length outside the accepted bounds
    #[error("Invalid public key size: {0}")]
    InvalidPublicKeySize(i32),

    /// Operator declined the server's public key
    #[error("Public key rejected by operator")]
    RejectedByOperator,

    /// Public key container could not be parsed into an RSA key
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Asymmetric encryption of the envelope failed
    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    /// Secure randomness was not available
    #[error("Cannot generate key material: {0}")]
    KeyGenerationFailed(String),

    /// Tag mismatch on an authenticated message
    #[error("Message authentication failed")]
    AuthenticationFailed,

    /// Declared envelope length outside the accepted bounds
    #[error("Invalid encrypted session key size: {0}")]
    InvalidEnvelopeSize(i32),

    /// Envelope could not be decrypted with the server's private key
    #[error("Cannot decrypt session key data")]
    DecryptionFailed,

    /// Envelope digest does not match the key material it carries
    #[error("Tampered encrypted session key")]
    TamperedEnvelope,

    /// Declared authenticated frame length outside the accepted bounds
    #[error("Invalid frame size: {0}")]
    InvalidFrameSize(i32),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Stable error categories, one per outward exit condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Socket read/write/close failure
    ConnectionError,
    /// Could not reach the server at all
    ConnectFailed,
    /// Bad magic header
    ProtocolMismatch,
    /// Version refused by the server
    UnsupportedVersion,
    /// Public key length out of bounds
    InvalidPublicKeySize,
    /// Operator rejected the key
    RejectedByOperator,
    /// Unparseable key material
    InvalidPublicKey,
    /// Envelope encryption failed
    EncryptionFailed,
    /// Randomness unavailable
    KeyGenerationFailed,
    /// Tag mismatch
    AuthenticationFailed,
    /// Server side: envelope size, decryption or digest failure
    InvalidEnvelope,
    /// Bad configuration
    Configuration,
}

impl ErrorKind {
    /// Process exit code for this kind. Each kind maps to a distinct value.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Configuration => 2,
            ErrorKind::ConnectFailed => 4,
            ErrorKind::ProtocolMismatch => 5,
            ErrorKind::ConnectionError => 6,
            ErrorKind::InvalidPublicKeySize => 7,
            ErrorKind::RejectedByOperator => 8,
            ErrorKind::EncryptionFailed => 9,
            ErrorKind::InvalidPublicKey => 10,
            ErrorKind::UnsupportedVersion => 11,
            ErrorKind::KeyGenerationFailed => 12,
            ErrorKind::AuthenticationFailed => 13,
            ErrorKind::InvalidEnvelope => 14,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::ConnectionError => write!(f, "ConnectionError"),
            ErrorKind::ConnectFailed => write!(f, "ConnectFailed"),
            ErrorKind::ProtocolMismatch => write!(f, "ProtocolMismatch"),
            ErrorKind::UnsupportedVersion => write!(f, "UnsupportedVersion"),
            ErrorKind::InvalidPublicKeySize => write!(f, "InvalidPublicKeySize"),
            ErrorKind::RejectedByOperator => write!(f, "RejectedByOperator"),
            ErrorKind::InvalidPublicKey => write!(f, "InvalidPublicKey"),
            ErrorKind::EncryptionFailed => write!(f, "EncryptionFailed"),
            ErrorKind::KeyGenerationFailed => write!(f, "KeyGenerationFailed"),
            ErrorKind::AuthenticationFailed => write!(f, "AuthenticationFailed"),
            ErrorKind::InvalidEnvelope => write!(f, "InvalidEnvelope"),
            ErrorKind::Configuration => write!(f, "Configuration"),
        }
    }
}

impl Error {
    /// Category of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ConnectionClosed { .. } | Error::Read(_) | Error::Write(_) => {
                ErrorKind::ConnectionError
            }
            Error::Connect(_) => ErrorKind::ConnectFailed,
            Error::ProtocolMismatch => ErrorKind::ProtocolMismatch,
            Error::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Error::InvalidPublicKeySize(_) => ErrorKind::InvalidPublicKeySize,
            Error::RejectedByOperator => ErrorKind::RejectedByOperator,
            Error::InvalidPublicKey(_) => ErrorKind::InvalidPublicKey,
            Error::EncryptionFailed(_) => ErrorKind::EncryptionFailed,
            Error::KeyGenerationFailed(_) => ErrorKind::KeyGenerationFailed,
            Error::AuthenticationFailed | Error::InvalidFrameSize(_) => ErrorKind::AuthenticationFailed,
            Error::InvalidEnvelopeSize(_) | Error::DecryptionFailed | Error::TamperedEnvelope => {
                ErrorKind::InvalidEnvelope
            }
            Error::Config(_) => ErrorKind::Configuration,
        }
    }

    /// Process exit code for this error
    pub fn exit_code(&self) -> u8 {
        self.kind().exit_code()
    }

    /// Whether this error came from the underlying connection
    pub fn is_connection_error(&self) -> bool {
        self.kind() == ErrorKind::ConnectionError
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Read(io_error) | Error::Write(io_error) | Error::Connect(io_error) => io_error,
            Error::ConnectionClosed { .. } => {
                io::Error::new(io::ErrorKind::UnexpectedEof, error.to_string())
            }
            Error::AuthenticationFailed | Error::RejectedByOperator => {
                io::Error::new(io::ErrorKind::PermissionDenied, error.to_string())
            }
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

/// Convert a string to an Error::Config
pub fn config_err<T, S: Into<String>>(msg: S) -> Result<T> {
    Err(Error::Config(msg.into()))
}
