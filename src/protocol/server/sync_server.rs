/*!
Synchronous server responder for the armorlink protocol.

The server side of one connection: send the magic header, judge the
client's version, publish the RSA public key, then receive and verify the
encrypted session key envelope.

[`Server::serve`] runs that responder for every connection a listener
accepts, each on its own thread. A failed connection is logged and the
loop keeps serving.
*/

use crate::core::{
    channel,
    constants::{MAGIC_HEADER, PROTOCOL_VERSION, VERDICT_ACCEPTED, VERDICT_REJECTED, sizes::MAX_ENVELOPE_SIZE},
    crypto::{CryptoConfig, SessionKeyBundle, decrypt_envelope},
    error::{Error, Result, config_err},
};
use rsa::{
    RsaPrivateKey, RsaPublicKey,
    pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey},
};
use std::fs;
use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Socket deadline applied to accepted connections
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(30);

/// Synchronous server for the armorlink protocol.
pub struct Server {
    private_key: RsaPrivateKey,
    public_der: Vec<u8>,
    crypto: CryptoConfig,
    version: i32,
    io_timeout: Option<Duration>,
    stopped: AtomicBool,
}

impl Server {
    /// Create a server around an RSA private key.
    ///
    /// The DER public key is encoded once here and reused for every client.
    pub fn new(private_key: RsaPrivateKey, crypto: CryptoConfig) -> Result<Self> {
        let public_der = private_key
            .to_public_key()
            .to_public_key_der()
            .map_err(|e| Error::InvalidPublicKey(e.to_string()))?
            .as_bytes()
            .to_vec();

        Ok(Self {
            private_key,
            public_der,
            crypto,
            version: PROTOCOL_VERSION,
            io_timeout: Some(DEFAULT_SERVER_TIMEOUT),
            stopped: AtomicBool::new(false),
        })
    }

    /// Create a server from a PKCS#8 DER-encoded private key.
    pub fn from_pkcs8_der(der: &[u8], crypto: CryptoConfig) -> Result<Self> {
        let private_key =
            RsaPrivateKey::from_pkcs8_der(der).map_err(|e| Error::Config(format!("invalid PKCS#8 private key: {}", e)))?;
        Self::new(private_key, crypto)
    }

    /// Load the keypair from DER files: an X.509 SubjectPublicKeyInfo public
    /// key and a PKCS#8 private key.
    ///
    /// The two files must hold halves of the same key.
    pub fn from_key_files(public_key: &Path, private_key: &Path, crypto: CryptoConfig) -> Result<Self> {
        let read = |path: &Path| {
            fs::read(path).map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))
        };

        let public = RsaPublicKey::from_public_key_der(&read(public_key)?)
            .map_err(|e| Error::Config(format!("invalid public key in {}: {}", public_key.display(), e)))?;
        let server = Self::from_pkcs8_der(&read(private_key)?, crypto)?;

        if server.private_key.to_public_key() != public {
            return config_err("public and private key files do not match");
        }
        Ok(server)
    }

    /// Accept only clients announcing `version`
    pub fn with_version(mut self, version: i32) -> Self {
        self.version = version;
        self
    }

    /// Change or remove the socket deadline used by [`Server::accept_tcp`]
    /// and [`Server::serve`]
    pub fn with_io_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.io_timeout = timeout;
        self
    }

    /// DER-encoded SubjectPublicKeyInfo sent to clients
    pub fn public_key_der(&self) -> &[u8] {
        &self.public_der
    }

    /// Crypto configuration shared with clients
    pub fn crypto_config(&self) -> &CryptoConfig {
        &self.crypto
    }

    /// Accept one TCP connection and run the responder on it.
    pub fn accept_tcp(&self, listener: &TcpListener) -> Result<(TcpStream, SessionKeyBundle)> {
        let (mut stream, peer) = listener.accept().map_err(Error::Connect)?;
        info!(%peer, "client connected");

        let bundle = self.respond(&mut stream)?;
        Ok((stream, bundle))
    }

    /// Serve clients until [`Server::stop`] is called.
    ///
    /// Every accepted connection runs on its own thread. `on_session`
    /// receives each recovered session key; failed connections are logged
    /// and do not stop the loop. The stop flag is checked after each
    /// accept, and the call returns once all connection threads finish.
    pub fn serve<F>(&self, listener: &TcpListener, on_session: F)
    where
        F: Fn(SocketAddr, SessionKeyBundle) + Sync,
    {
        let on_session = &on_session;

        thread::scope(|scope| {
            loop {
                let accepted = listener.accept();
                if self.stopped.load(Ordering::Acquire) {
                    break;
                }

                let (mut stream, peer) = match accepted {
                    Ok(connection) => connection,
                    Err(e) => {
                        warn!(error = %e, "accept failed");
                        continue;
                    }
                };

                scope.spawn(move || {
                    info!(%peer, "client connected");
                    match self.respond(&mut stream) {
                        Ok(bundle) => on_session(peer, bundle),
                        Err(e) => warn!(%peer, kind = %e.kind(), error = %e, "connection failed"),
                    }
                });
            }
        });

        info!("server stopped");
    }

    /// Ask a running [`Server::serve`] loop to return.
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    /// Whether [`Server::stop`] has been called
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    fn respond(&self, stream: &mut TcpStream) -> Result<SessionKeyBundle> {
        stream.set_read_timeout(self.io_timeout).map_err(Error::Connect)?;
        stream.set_write_timeout(self.io_timeout).map_err(Error::Connect)?;
        self.accept(stream)
    }

    /// Run the responder over a connected stream and return the session key
    /// bundle the client sent.
    pub fn accept<S: Read + Write + ?Sized>(&self, stream: &mut S) -> Result<SessionKeyBundle> {
        channel::write_exact(stream, &MAGIC_HEADER)?;

        let client_version = channel::read_i32(stream)?;
        if client_version != self.version {
            warn!(client_version, expected = self.version, "rejecting client version");
            channel::write_u8(stream, VERDICT_REJECTED)?;
            return Err(Error::UnsupportedVersion {
                verdict: VERDICT_REJECTED,
            });
        }
        channel::write_u8(stream, VERDICT_ACCEPTED)?;
        debug!(client_version, "client version accepted");

        channel::write_frame(stream, &self.public_der)?;
        debug!(len = self.public_der.len(), "public key sent");

        let len = channel::read_length(stream, 1..=MAX_ENVELOPE_SIZE, Error::InvalidEnvelopeSize)?;
        let ciphertext = channel::read_exact(stream, len)?;

        match decrypt_envelope(&self.private_key, &ciphertext, &self.crypto) {
            Ok(bundle) => {
                info!(cipher = %bundle.cipher(), "session key received");
                Ok(bundle)
            }
            Err(e) => {
                warn!(error = %e, "session key envelope rejected");
                Err(e)
            }
        }
    }
}

impl std::fmt::Debug for Server {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Server")
            .field("crypto", &self.crypto)
            .field("version", &self.version)
            .field("io_timeout", &self.io_timeout)
            .finish_non_exhaustive()
    }
}
