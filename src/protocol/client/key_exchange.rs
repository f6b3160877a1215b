/*!
Public key exchange and session key establishment.

After the handshake the server sends `{i32 length, DER public key}`. The
length is bounded before anything is allocated, since nothing on the channel
is authenticated yet. The operator confirms the key, and the client answers
with `{i32 length, RSA(key || iv || digest(key || iv))}`.
*/

use crate::core::{
    channel,
    constants::{
        pem::{PUBLIC_KEY_FOOTER, PUBLIC_KEY_HEADER},
        sizes::MIN_PUBLIC_KEY_SIZE,
    },
    crypto::{CryptoConfig, Envelope, PublicKeyContainer, SessionKeyBundle},
    encoding::{encode_base64, wrap_pem},
    error::{Error, Result},
};
use crate::protocol::client::trust::TrustPrompt;
use rand::{CryptoRng, RngCore};
use std::io::{Read, Write};
use tracing::{debug, info, warn};

/// Receive the server's public key and have `prompt` confirm it.
///
/// A declared length outside `1..=max_size` fails with
/// [`Error::InvalidPublicKeySize`] before any key bytes are read.
pub fn receive_public_key<S, P>(stream: &mut S, prompt: &mut P, max_size: usize) -> Result<PublicKeyContainer>
where
    S: Read + ?Sized,
    P: TrustPrompt + ?Sized,
{
    let len = channel::read_length(stream, MIN_PUBLIC_KEY_SIZE..=max_size, Error::InvalidPublicKeySize)?;
    debug!(len, "receiving server public key");

    let blob = channel::read_exact(stream, len)?;
    let key_text = encode_base64(&blob);
    drop(blob);

    if !prompt.confirm(&key_text) {
        warn!("server public key rejected");
        return Err(Error::RejectedByOperator);
    }

    info!("server public key accepted");
    Ok(PublicKeyContainer::from_pem(wrap_pem(&key_text, PUBLIC_KEY_HEADER, PUBLIC_KEY_FOOTER)))
}

/// Generate a session key bundle, send it encrypted under `public_key`,
/// and return the plaintext bundle.
pub fn establish_session_key<S, R>(
    stream: &mut S,
    public_key: &PublicKeyContainer,
    config: &CryptoConfig,
    rng: &mut R,
) -> Result<SessionKeyBundle>
where
    S: Write + ?Sized,
    R: RngCore + CryptoRng,
{
    let bundle = SessionKeyBundle::generate_with_rng(config.cipher, rng)?;
    let envelope = Envelope::seal(&bundle, config.digest);

    let rsa_key = public_key.parse()?;
    let ciphertext = envelope.encrypt_with_rng(&rsa_key, rng)?;
    drop(envelope);

    channel::write_frame(stream, &ciphertext)?;
    info!(
        cipher = %config.cipher,
        digest = %config.digest,
        encrypted_len = ciphertext.len(),
        "session key sent"
    );

    Ok(bundle)
}
