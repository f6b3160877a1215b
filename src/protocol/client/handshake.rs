/*!
Client handshake state machine.

```text
Start -> MagicChecked -> VersionNegotiated -> Accepted
   \           \                \
    `-----------`----------------`--> Rejected(reason)
```

1. Read the 10-byte magic header and compare it byte for byte.
2. Send the client protocol version as a big-endian i32.
3. Read the one-byte verdict; `0` accepts.

Every rejection is terminal. The caller closes the connection.
*/

use crate::core::{
    channel,
    constants::{MAGIC_HEADER, VERDICT_ACCEPTED},
    error::{Error, ErrorKind, Result},
};
use std::fmt;
use std::io::{Read, Write};
use tracing::{debug, warn};

/// Handshake progress
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    /// Nothing exchanged yet
    Start,
    /// Magic header received and matched
    MagicChecked,
    /// Version sent, verdict pending
    VersionNegotiated,
    /// Server accepted the version
    Accepted,
    /// Handshake failed
    Rejected(ErrorKind),
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandshakeState::Start => write!(f, "Start"),
            HandshakeState::MagicChecked => write!(f, "MagicChecked"),
            HandshakeState::VersionNegotiated => write!(f, "VersionNegotiated"),
            HandshakeState::Accepted => write!(f, "Accepted"),
            HandshakeState::Rejected(reason) => write!(f, "Rejected({})", reason),
        }
    }
}

/// One handshake attempt over a connected stream
#[derive(Debug)]
pub struct Handshake {
    version: i32,
    state: HandshakeState,
}

impl Handshake {
    /// Prepare a handshake announcing `version`
    pub fn new(version: i32) -> Self {
        Self {
            version,
            state: HandshakeState::Start,
        }
    }

    /// Current state
    pub fn state(&self) -> HandshakeState {
        self.state
    }

    /// Whether the server accepted the version
    pub fn is_accepted(&self) -> bool {
        self.state == HandshakeState::Accepted
    }

    /// Drive the handshake to completion.
    ///
    /// Can only be run once; a second call fails with
    /// [`Error::ProtocolMismatch`] without touching the stream.
    pub fn run<S: Read + Write + ?Sized>(&mut self, stream: &mut S) -> Result<()> {
        if self.state != HandshakeState::Start {
            return Err(Error::ProtocolMismatch);
        }

        let result = self.exchange(stream);
        if let Err(e) = &result {
            warn!(state = %self.state, error = %e, "handshake rejected");
            self.state = HandshakeState::Rejected(e.kind());
        }
        result
    }

    fn exchange<S: Read + Write + ?Sized>(&mut self, stream: &mut S) -> Result<()> {
        let mut header = [0u8; MAGIC_HEADER.len()];
        if channel::read_into(stream, &mut header).is_err() || header != MAGIC_HEADER {
            return Err(Error::ProtocolMismatch);
        }
        self.transition(HandshakeState::MagicChecked);

        channel::write_i32(stream, self.version)?;
        self.transition(HandshakeState::VersionNegotiated);

        let verdict = channel::read_u8(stream)?;
        if verdict != VERDICT_ACCEPTED {
            return Err(Error::UnsupportedVersion { verdict });
        }
        self.transition(HandshakeState::Accepted);

        Ok(())
    }

    fn transition(&mut self, next: HandshakeState) {
        debug!(from = %self.state, to = %next, "handshake");
        self.state = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{self, Cursor};

    /// In-memory duplex: reads from a script, records writes
    struct Scripted {
        input: Cursor<Vec<u8>>,
        output: Vec<u8>,
    }

    impl Scripted {
        fn new(input: Vec<u8>) -> Self {
            Self {
                input: Cursor::new(input),
                output: Vec::new(),
            }
        }
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.input.read(buf)
        }
    }

    impl Write for Scripted {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.output.write(buf)
        }
        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_accepted() -> Result<()> {
        let mut script = MAGIC_HEADER.to_vec();
        script.push(0);
        let mut stream = Scripted::new(script);

        let mut handshake = Handshake::new(0);
        handshake.run(&mut stream)?;
        assert!(handshake.is_accepted());
        assert_eq!(stream.output, vec![0, 0, 0, 0]);
        Ok(())
    }

    #[test]
    fn test_sends_version_big_endian() -> Result<()> {
        let mut script = MAGIC_HEADER.to_vec();
        script.push(0);
        let mut stream = Scripted::new(script);

        Handshake::new(0x0A0B_0C0D).run(&mut stream)?;
        assert_eq!(stream.output, vec![0x0A, 0x0B, 0x0C, 0x0D]);
        Ok(())
    }

    #[test]
    fn test_bad_magic_stops_immediately() {
        let mut script = MAGIC_HEADER.to_vec();
        script[9] ^= 0xFF;
        script.push(0);
        let mut stream = Scripted::new(script);

        let mut handshake = Handshake::new(0);
        assert!(matches!(handshake.run(&mut stream), Err(Error::ProtocolMismatch)));
        assert_eq!(handshake.state(), HandshakeState::Rejected(ErrorKind::ProtocolMismatch));
        assert!(stream.output.is_empty());
        // verdict byte left unread
        assert_eq!(stream.input.position(), 10);
    }

    #[test]
    fn test_short_magic_is_mismatch() {
        let mut stream = Scripted::new(MAGIC_HEADER[..4].to_vec());
        let mut handshake = Handshake::new(0);
        assert!(matches!(handshake.run(&mut stream), Err(Error::ProtocolMismatch)));
        assert!(stream.output.is_empty());
    }

    #[test]
    fn test_version_rejected() {
        let mut script = MAGIC_HEADER.to_vec();
        script.push(1);
        let mut stream = Scripted::new(script);

        let mut handshake = Handshake::new(0);
        assert!(matches!(
            handshake.run(&mut stream),
            Err(Error::UnsupportedVersion { verdict: 1 })
        ));
        assert_eq!(handshake.state(), HandshakeState::Rejected(ErrorKind::UnsupportedVersion));
    }

    #[test]
    fn test_missing_verdict_is_connection_error() {
        let mut stream = Scripted::new(MAGIC_HEADER.to_vec());
        let mut handshake = Handshake::new(0);
        let err = handshake.run(&mut stream).unwrap_err();
        assert!(err.is_connection_error());
        assert_eq!(handshake.state(), HandshakeState::Rejected(ErrorKind::ConnectionError));
    }

    #[test]
    fn test_cannot_run_twice() -> Result<()> {
        let mut script = MAGIC_HEADER.to_vec();
        script.push(0);
        let mut stream = Scripted::new(script);

        let mut handshake = Handshake::new(0);
        handshake.run(&mut stream)?;
        assert!(handshake.run(&mut stream).is_err());
        assert!(handshake.is_accepted());
        Ok(())
    }
}
