/*!
Synchronous client for the armorlink protocol.

Runs the three connection steps strictly in order over one blocking stream:
handshake, public key confirmation, session key establishment. The first
failure ends the attempt; nothing is retried. To try again, open a new
connection and start over.
*/

use crate::core::{
    crypto::{HmacLayer, PublicKeyContainer, SessionKeyBundle},
    error::{Error, Result},
};
use crate::protocol::{
    builder::ClientConfig,
    client::{
        handshake::Handshake,
        key_exchange::{establish_session_key, receive_public_key},
        trust::TrustPrompt,
    },
};
use rand::{CryptoRng, RngCore, rngs::OsRng};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use tracing::{debug, info};

/// Keys agreed on for one connection
#[derive(Debug)]
pub struct Session {
    session_key: SessionKeyBundle,
    server_key: PublicKeyContainer,
}

impl Session {
    /// Plaintext symmetric key and IV sent to the server
    pub fn session_key(&self) -> &SessionKeyBundle {
        &self.session_key
    }

    /// The server public key the operator accepted
    pub fn server_key(&self) -> &PublicKeyContainer {
        &self.server_key
    }

    /// Consume the session and keep only the key bundle
    pub fn into_session_key(self) -> SessionKeyBundle {
        self.session_key
    }
}

/// Synchronous client for the armorlink protocol.
#[derive(Debug, Clone)]
pub struct Client {
    config: ClientConfig,
}

impl Client {
    /// Create a client with default configuration
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
        }
    }

    /// Create a client with specific configuration.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Create a message authentication layer for the configured digest
    pub fn hmac_layer(&self) -> Result<HmacLayer> {
        HmacLayer::new(self.config.crypto.digest)
    }

    /// Connect over TCP and establish a session.
    ///
    /// Returns the open stream together with the session so the caller can
    /// keep using the connection.
    pub fn connect<A, P>(&self, addr: A, prompt: &mut P) -> Result<(TcpStream, Session)>
    where
        A: ToSocketAddrs,
        P: TrustPrompt + ?Sized,
    {
        let mut stream = TcpStream::connect(addr).map_err(Error::Connect)?;
        if let Ok(peer) = stream.peer_addr() {
            info!(%peer, "connected");
        }

        stream.set_read_timeout(self.config.io_timeout).map_err(Error::Connect)?;
        stream.set_write_timeout(self.config.io_timeout).map_err(Error::Connect)?;

        let session = self.establish(&mut stream, prompt)?;
        Ok((stream, session))
    }

    /// Establish a session over an already connected stream.
    pub fn establish<S, P>(&self, stream: &mut S, prompt: &mut P) -> Result<Session>
    where
        S: Read + Write + ?Sized,
        P: TrustPrompt + ?Sized,
    {
        self.establish_with_rng(stream, prompt, &mut OsRng)
    }

    /// Establish a session drawing key material from `rng`.
    pub fn establish_with_rng<S, P, R>(&self, stream: &mut S, prompt: &mut P, rng: &mut R) -> Result<Session>
    where
        S: Read + Write + ?Sized,
        P: TrustPrompt + ?Sized,
        R: RngCore + CryptoRng,
    {
        let mut handshake = Handshake::new(self.config.protocol_version);
        handshake.run(stream)?;
        debug!(version = self.config.protocol_version, "handshake accepted");

        let server_key = receive_public_key(stream, prompt, self.config.max_public_key_size)?;
        let session_key = establish_session_key(stream, &server_key, &self.config.crypto, rng)?;

        info!("session established");
        Ok(Session {
            session_key,
            server_key,
        })
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}
