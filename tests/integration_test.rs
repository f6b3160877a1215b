// tests/integration_test.rs
use armorlink::{
    AcceptAll, CryptoConfig, DigestAlgorithm, Error, ErrorKind, HmacLayer, MAGIC_HEADER, Result, Server,
    SymmetricCipher, client, encode_base64,
    core::channel,
};
use rand::rngs::OsRng;
use rsa::{RsaPrivateKey, traits::PublicKeyParts};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, OnceLock, mpsc};
use std::thread;
use std::time::Duration;

fn server_key() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 1024).expect("RSA key generation"))
}

fn server_key_2048() -> &'static RsaPrivateKey {
    static KEY: OnceLock<RsaPrivateKey> = OnceLock::new();
    KEY.get_or_init(|| RsaPrivateKey::new(&mut OsRng, 2048).expect("RSA key generation"))
}

/// Run `server` against one connection on a loopback port.
fn spawn_server<T, F>(handler: F) -> (u16, thread::JoinHandle<T>)
where
    T: Send + 'static,
    F: FnOnce(TcpStream) -> T + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (stream, _) = listener.accept().unwrap();
        handler(stream)
    });
    (port, handle)
}

#[test]
fn test_full_connection_sha256_aes256() -> Result<()> {
    let crypto = CryptoConfig::with_algorithms(DigestAlgorithm::Sha256, SymmetricCipher::Aes256);
    assert_eq!(crypto.envelope_len(), 80);

    let listener = TcpListener::bind("127.0.0.1:0").map_err(Error::Connect)?;
    let port = listener.local_addr().map_err(Error::Connect)?.port();
    let server = Server::new(server_key().clone(), crypto)?;
    let expected_key_text = encode_base64(server.public_key_der());
    let server_thread = thread::spawn(move || server.accept_tcp(&listener).map(|(_, bundle)| bundle));

    let client = client()
        .with_crypto_config(crypto)
        .with_io_timeout(Duration::from_secs(10))
        .build()?;

    let mut shown = String::new();
    let mut prompt = |key: &str| {
        shown = key.to_string();
        true
    };
    let (_stream, session) = client.connect(("127.0.0.1", port), &mut prompt)?;

    let received = server_thread.join().unwrap()?;
    assert_eq!(received.as_bytes(), session.session_key().as_bytes());
    assert_eq!(session.session_key().key().len(), 32);
    assert_eq!(session.session_key().iv().len(), 16);

    // The prompt saw exactly the base64 of the DER key the server sent
    assert_eq!(shown, expected_key_text);
    assert!(session.server_key().as_pem().starts_with("-----BEGIN PUBLIC KEY-----\n"));
    assert_eq!(session.server_key().parse()?, server_key().to_public_key());

    // The authentication layer works on its own after the connection
    let layer = HmacLayer::new(crypto.digest)?;
    let mut buffer = layer.create_buffer();
    buffer.load_message(b"hello");
    assert_eq!(layer.encode(&mut buffer).len(), 5 + 32);
    assert_eq!(layer.decode(&mut buffer)?, b"hello");
    Ok(())
}

#[test]
fn test_default_config_end_to_end() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(Error::Connect)?;
    let port = listener.local_addr().map_err(Error::Connect)?.port();
    let server = Server::new(server_key().clone(), CryptoConfig::default())?;
    let server_thread = thread::spawn(move || server.accept_tcp(&listener).map(|(_, bundle)| bundle));

    let (_stream, session) = client().build()?.connect(("127.0.0.1", port), &mut AcceptAll)?;
    let received = server_thread.join().unwrap()?;
    assert_eq!(received.key(), session.session_key().key());
    assert_eq!(received.iv(), session.session_key().iv());
    Ok(())
}

#[test]
fn test_operator_rejection_sends_nothing() {
    let (port, server_thread) = spawn_server(|mut stream| {
        stream.write_all(&MAGIC_HEADER).unwrap();
        let mut version = [0u8; 4];
        stream.read_exact(&mut version).unwrap();
        stream.write_all(&[0]).unwrap();
        channel::write_frame(&mut stream, b"not really a key").unwrap();

        // The client closes without sending an envelope
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        rest
    });

    let mut deny = |_: &str| false;
    let result = client().build().unwrap().connect(("127.0.0.1", port), &mut deny);
    assert!(matches!(result, Err(Error::RejectedByOperator)));
    assert!(server_thread.join().unwrap().is_empty());
}

#[test]
fn test_wrong_magic_aborts() {
    let (port, server_thread) = spawn_server(|mut stream| {
        let mut magic = MAGIC_HEADER;
        magic[0] = 0;
        stream.write_all(&magic).unwrap();
        let mut rest = Vec::new();
        stream.read_to_end(&mut rest).unwrap();
        rest
    });

    let result = client().build().unwrap().connect(("127.0.0.1", port), &mut AcceptAll);
    let err = result.err().expect("handshake must fail");
    assert_eq!(err.kind(), ErrorKind::ProtocolMismatch);
    assert_eq!(err.exit_code(), 5);
    // No version was sent
    assert!(server_thread.join().unwrap().is_empty());
}

#[test]
fn test_version_mismatch_against_server() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(Error::Connect)?;
    let port = listener.local_addr().map_err(Error::Connect)?.port();
    let server = Server::new(server_key().clone(), CryptoConfig::default())?;
    let server_thread = thread::spawn(move || server.accept_tcp(&listener).map(|_| ()));

    let client = client().with_protocol_version(1).build()?;
    let result = client.connect(("127.0.0.1", port), &mut AcceptAll);
    assert!(matches!(result, Err(Error::UnsupportedVersion { verdict: 1 })));
    assert!(matches!(server_thread.join().unwrap(), Err(Error::UnsupportedVersion { .. })));
    Ok(())
}

#[test]
fn test_server_closes_mid_handshake() {
    let (port, server_thread) = spawn_server(|mut stream| {
        stream.write_all(&MAGIC_HEADER).unwrap();
        let mut version = [0u8; 4];
        stream.read_exact(&mut version).unwrap();
        // Drop without a verdict
    });

    let err = client()
        .build()
        .unwrap()
        .connect(("127.0.0.1", port), &mut AcceptAll)
        .err()
        .expect("connection must fail");
    server_thread.join().unwrap();
    assert!(err.is_connection_error());
    assert_eq!(err.exit_code(), 6);
}

#[test]
fn test_io_timeout_is_connection_error() {
    let (port, server_thread) = spawn_server(|mut stream| {
        stream.write_all(&MAGIC_HEADER).unwrap();
        // Withhold the verdict until the client gives up
        thread::sleep(Duration::from_millis(500));
        drop(stream);
    });

    let client = client().with_io_timeout(Duration::from_millis(100)).build().unwrap();
    let err = client
        .connect(("127.0.0.1", port), &mut AcceptAll)
        .err()
        .expect("read must time out");
    server_thread.join().unwrap();
    assert_eq!(err.kind(), ErrorKind::ConnectionError);
}

#[test]
fn test_2048_bit_key_sha256_aes256() -> Result<()> {
    let crypto = CryptoConfig::with_algorithms(DigestAlgorithm::Sha256, SymmetricCipher::Aes256);
    assert_eq!(crypto.envelope_len(), 80);

    let listener = TcpListener::bind("127.0.0.1:0").map_err(Error::Connect)?;
    let port = listener.local_addr().map_err(Error::Connect)?.port();
    let server = Server::new(server_key_2048().clone(), crypto)?;

    let server_thread = thread::spawn(move || server.accept_tcp(&listener).map(|(_, bundle)| bundle));

    let client = client()
        .with_crypto_config(crypto)
        .with_io_timeout(Duration::from_secs(30))
        .build()?;
    let (_stream, session) = client.connect(("127.0.0.1", port), &mut AcceptAll)?;
    let received = server_thread.join().unwrap()?;

    assert_eq!(received.as_bytes(), session.session_key().as_bytes());
    assert_eq!(session.session_key().key().len(), 32);
    assert_eq!(session.server_key().parse()?.size(), 256);
    Ok(())
}

#[test]
fn test_serve_survives_failed_connection() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").map_err(Error::Connect)?;
    let port = listener.local_addr().map_err(Error::Connect)?.port();
    let server = Arc::new(Server::new(server_key().clone(), CryptoConfig::default())?);

    let (sessions_tx, sessions) = mpsc::channel();
    let serving = Arc::clone(&server);
    let server_thread = thread::spawn(move || {
        serving.serve(&listener, |_, bundle| {
            sessions_tx.send(bundle).unwrap();
        });
    });

    // First client announces a version the server refuses
    let refused = client()
        .with_protocol_version(9)
        .build()?
        .connect(("127.0.0.1", port), &mut AcceptAll);
    assert!(matches!(refused, Err(Error::UnsupportedVersion { verdict: 1 })));

    // Second client still gets served
    let (_stream, session) = client().build()?.connect(("127.0.0.1", port), &mut AcceptAll)?;
    let received = sessions
        .recv_timeout(Duration::from_secs(10))
        .expect("session reported by the server");
    assert_eq!(received.as_bytes(), session.session_key().as_bytes());

    // Wake the accept loop so it sees the stop flag
    server.stop();
    drop(TcpStream::connect(("127.0.0.1", port)));
    server_thread.join().unwrap();

    assert!(sessions.try_recv().is_err());
    Ok(())
}
