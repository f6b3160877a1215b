/*!
Message authentication layer.

A keyed-hash construction built from the plain digest primitive:

```text
inner = digest(inner_pad || message)
tag   = digest(outer_pad || inner)
```

with `inner_pad[i] = 0x36 ^ key[i]` and `outer_pad[i] = 0x5c ^ key[i]` over a
master key exactly one digest block long. For such keys the output is
identical to standard HMAC.

[`HmacLayer`] holds the key and pads. It is written once at construction and
only read afterwards, so one instance can serve any number of threads.
[`MessageBuffer`] is the reusable per-caller buffer that encode and decode
work on; it is mutated in place and must not be shared without external
synchronization.
*/

use crate::core::{
    channel,
    constants::{HMAC_INNER_PAD, HMAC_OUTER_PAD},
    crypto::{config::DigestAlgorithm, digest::DigestContext},
    error::{Error, Result},
    memory::SecureVec,
    security::constant_time_eq,
};
use rand::{CryptoRng, RngCore, rngs::OsRng};
use std::fmt;
use std::io::{Read, Write};
use tracing::debug;
use zeroize::Zeroize;

/// Largest digest output among the supported algorithms
const MAX_OUTPUT_SIZE: usize = 64;

/// Keyed-hash context: master key plus the two derived pads
pub struct HmacLayer {
    algorithm: DigestAlgorithm,
    master_key: SecureVec,
    inner_pad: SecureVec,
    outer_pad: SecureVec,
}

impl HmacLayer {
    /// Create a layer with a fresh master key from the OS random source.
    pub fn new(algorithm: DigestAlgorithm) -> Result<Self> {
        Self::with_rng(algorithm, &mut OsRng)
    }

    /// Create a layer with a master key drawn from `rng`.
    ///
    /// Fails with [`Error::KeyGenerationFailed`] if the source cannot
    /// produce bytes.
    pub fn with_rng<R: RngCore + CryptoRng>(algorithm: DigestAlgorithm, rng: &mut R) -> Result<Self> {
        let mut master_key = SecureVec::zeroed(algorithm.block_size());
        rng.try_fill_bytes(&mut master_key)
            .map_err(|e| Error::KeyGenerationFailed(e.to_string()))?;

        debug!(digest = %algorithm, key_len = master_key.len(), "generated authentication master key");
        Ok(Self::derive(algorithm, master_key))
    }

    /// Create a layer from a known master key, as the receiving side of a
    /// transported key does.
    ///
    /// The key must be exactly one digest block long.
    pub fn from_key(algorithm: DigestAlgorithm, key: &[u8]) -> Result<Self> {
        if key.len() != algorithm.block_size() {
            return Err(Error::Config(format!(
                "{} master key must be {} bytes, got {}",
                algorithm,
                algorithm.block_size(),
                key.len()
            )));
        }
        Ok(Self::derive(algorithm, SecureVec::from_slice(key)))
    }

    fn derive(algorithm: DigestAlgorithm, master_key: SecureVec) -> Self {
        let inner_pad = SecureVec::from_vec(master_key.iter().map(|b| b ^ HMAC_INNER_PAD).collect());
        let outer_pad = SecureVec::from_vec(master_key.iter().map(|b| b ^ HMAC_OUTER_PAD).collect());

        Self {
            algorithm,
            master_key,
            inner_pad,
            outer_pad,
        }
    }

    /// Digest algorithm in use
    pub fn algorithm(&self) -> DigestAlgorithm {
        self.algorithm
    }

    /// The raw master key, for transport to the peer.
    pub fn master_key(&self) -> &[u8] {
        &self.master_key
    }

    /// Size of every tag produced by this layer
    pub fn tag_len(&self) -> usize {
        self.algorithm.output_size()
    }

    /// A reusable buffer sized for this layer's tags
    pub fn create_buffer(&self) -> MessageBuffer {
        MessageBuffer::new(self.tag_len())
    }

    /// Compute the tag of `message` into `out` (`tag_len()` bytes).
    fn tag_into(&self, message: &[u8], out: &mut [u8]) {
        let mut inner = [0u8; MAX_OUTPUT_SIZE];
        let inner = &mut inner[..self.tag_len()];

        let mut ctx = DigestContext::new(self.algorithm);
        ctx.update(&self.inner_pad);
        ctx.update(message);
        ctx.finalize_into(inner);

        let mut ctx = DigestContext::new(self.algorithm);
        ctx.update(&self.outer_pad);
        ctx.update(inner);
        ctx.finalize_into(out);

        inner.zeroize();
    }

    /// Tag of `message`
    pub fn compute_tag(&self, message: &[u8]) -> Vec<u8> {
        let mut tag = vec![0u8; self.tag_len()];
        self.tag_into(message, &mut tag);
        tag
    }

    /// Append the tag of the stored message and return `message || tag`.
    pub fn encode<'b>(&self, buffer: &'b mut MessageBuffer) -> &'b [u8] {
        buffer.set_tag_len(self.tag_len());

        let (message, tag) = buffer.frame.split_at_mut(buffer.message_len);
        self.tag_into(message, tag);
        &buffer.frame
    }

    /// Verify the tag stored after the message and return the message.
    ///
    /// On mismatch the message must be dropped; nothing is retried.
    pub fn decode<'b>(&self, buffer: &'b mut MessageBuffer) -> Result<&'b [u8]> {
        if buffer.tag_len != self.tag_len() {
            return Err(Error::AuthenticationFailed);
        }

        let mut recomputed = std::mem::take(&mut buffer.recomputed_tag);
        recomputed.resize(self.tag_len(), 0);
        self.tag_into(buffer.message(), &mut recomputed);

        let verified = constant_time_eq(buffer.tag(), &recomputed);
        buffer.recomputed_tag = recomputed;

        if verified {
            Ok(buffer.message())
        } else {
            Err(Error::AuthenticationFailed)
        }
    }

    #[cfg(test)]
    pub(crate) fn pads(&self) -> (&[u8], &[u8]) {
        (&self.inner_pad, &self.outer_pad)
    }
}

impl fmt::Debug for HmacLayer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HmacLayer")
            .field("algorithm", &self.algorithm)
            .field("master_key", &"[REDACTED]")
            .finish()
    }
}

/// Reusable buffer holding one message and its tags.
///
/// Layout: `frame` is `message || tag` (exactly what goes on the wire);
/// `recomputed_tag` is scratch space for verification. Allocated size is
/// therefore `message_len + 2 * tag_len` once a decode has run, and both
/// vectors keep their capacity across messages.
#[derive(Clone)]
pub struct MessageBuffer {
    frame: Vec<u8>,
    message_len: usize,
    tag_len: usize,
    recomputed_tag: Vec<u8>,
}

impl MessageBuffer {
    /// Create an empty buffer for tags of `tag_len` bytes
    pub fn new(tag_len: usize) -> Self {
        Self {
            frame: vec![0u8; tag_len],
            message_len: 0,
            tag_len,
            recomputed_tag: Vec::with_capacity(tag_len),
        }
    }

    fn set_tag_len(&mut self, tag_len: usize) {
        if self.tag_len != tag_len {
            self.tag_len = tag_len;
            self.frame.resize(self.message_len + tag_len, 0);
        }
    }

    /// Reset to a zero-filled message of `size` bytes and return it for
    /// the caller to fill.
    pub fn alloc_message(&mut self, size: usize) -> &mut [u8] {
        self.frame.clear();
        self.frame.resize(size + self.tag_len, 0);
        self.message_len = size;
        &mut self.frame[..size]
    }

    /// Replace the stored message with a copy of `message`
    pub fn load_message(&mut self, message: &[u8]) {
        self.alloc_message(message.len()).copy_from_slice(message);
    }

    /// Load a received `message || tag` frame for verification.
    ///
    /// A frame shorter than one tag cannot be authentic.
    pub fn load_frame(&mut self, frame: &[u8]) -> Result<()> {
        let message_len = frame
            .len()
            .checked_sub(self.tag_len)
            .ok_or(Error::AuthenticationFailed)?;

        self.alloc_message(message_len);
        self.frame.copy_from_slice(frame);
        Ok(())
    }

    /// Stored message
    pub fn message(&self) -> &[u8] {
        &self.frame[..self.message_len]
    }

    /// Stored message, writable
    pub fn message_mut(&mut self) -> &mut [u8] {
        &mut self.frame[..self.message_len]
    }

    /// Tag region after the message
    pub fn tag(&self) -> &[u8] {
        &self.frame[self.message_len..]
    }

    /// Tag region after the message, writable
    pub fn tag_mut(&mut self) -> &mut [u8] {
        &mut self.frame[self.message_len..]
    }

    /// Whole `message || tag` region
    pub fn frame(&self) -> &[u8] {
        &self.frame
    }

    /// Message size in bytes
    pub fn message_len(&self) -> usize {
        self.message_len
    }

    /// Tag size in bytes
    pub fn tag_len(&self) -> usize {
        self.tag_len
    }

    /// Bytes currently allocated for message, received tag and scratch tag
    pub fn allocated_len(&self) -> usize {
        self.frame.len() + self.recomputed_tag.len()
    }

    /// Encode the stored message and send it as `{i32 length, message || tag}`.
    pub fn write_to<W: Write + ?Sized>(&mut self, writer: &mut W, layer: &HmacLayer) -> Result<()> {
        let frame = layer.encode(self);
        channel::write_frame(writer, frame)
    }

    /// Receive a `{i32 length, message || tag}` frame of at most `max_len`
    /// bytes and return the verified message.
    pub fn read_from<R: Read + ?Sized>(
        &mut self,
        reader: &mut R,
        layer: &HmacLayer,
        max_len: usize,
    ) -> Result<&[u8]> {
        self.set_tag_len(layer.tag_len());

        let len = channel::read_length(reader, self.tag_len..=max_len, Error::InvalidFrameSize)?;
        self.alloc_message(len - self.tag_len);
        channel::read_into(reader, &mut self.frame)?;

        layer.decode(self)
    }
}

impl fmt::Debug for MessageBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageBuffer")
            .field("message_len", &self.message_len)
            .field("tag_len", &self.tag_len)
            .finish()
    }
}
