/*!
Framed channel I/O.

Blocking exact-count reads and writes over any connected byte stream, plus
the big-endian integer framing every length-prefixed field of the protocol
is built on. Short reads and short writes are retried; interrupted calls are
restarted. Nothing is buffered between calls.
*/

use crate::core::{
    constants::sizes::INT_FIELD_SIZE,
    error::{Error, Result},
};
use byteorder::{BigEndian, ByteOrder};
use std::io::{self, Read, Write};
use std::ops::RangeInclusive;

/// Fill `buf` completely from `reader`.
///
/// Fails with [`Error::ConnectionClosed`] if the peer closes first and with
/// [`Error::Read`] on any other I/O error.
pub fn read_into<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<()> {
    let mut received = 0;

    while received < buf.len() {
        match reader.read(&mut buf[received..]) {
            Ok(0) => {
                return Err(Error::ConnectionClosed {
                    expected: buf.len(),
                    received,
                });
            }
            Ok(n) => received += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Read(e)),
        }
    }

    Ok(())
}

/// Read exactly `n` bytes from `reader`.
pub fn read_exact<R: Read + ?Sized>(reader: &mut R, n: usize) -> Result<Vec<u8>> {
    let mut buf = vec![0u8; n];
    read_into(reader, &mut buf)?;
    Ok(buf)
}

/// Write all of `data` to `writer`.
///
/// Any error aborts immediately; a writer that accepts zero bytes is
/// reported as [`io::ErrorKind::WriteZero`].
pub fn write_exact<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> Result<()> {
    let mut written = 0;

    while written < data.len() {
        match writer.write(&data[written..]) {
            Ok(0) => {
                return Err(Error::Write(io::Error::new(
                    io::ErrorKind::WriteZero,
                    format!("wrote {} of {} bytes", written, data.len()),
                )));
            }
            Ok(n) => written += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(Error::Write(e)),
        }
    }

    writer.flush().map_err(Error::Write)
}

/// Read a single byte
pub fn read_u8<R: Read + ?Sized>(reader: &mut R) -> Result<u8> {
    let mut byte = [0u8; 1];
    read_into(reader, &mut byte)?;
    Ok(byte[0])
}

/// Write a single byte
pub fn write_u8<W: Write + ?Sized>(writer: &mut W, value: u8) -> Result<()> {
    write_exact(writer, &[value])
}

/// Read a big-endian signed 32-bit integer
pub fn read_i32<R: Read + ?Sized>(reader: &mut R) -> Result<i32> {
    let mut bytes = [0u8; INT_FIELD_SIZE];
    read_into(reader, &mut bytes)?;
    Ok(BigEndian::read_i32(&bytes))
}

/// Write a big-endian signed 32-bit integer
pub fn write_i32<W: Write + ?Sized>(writer: &mut W, value: i32) -> Result<()> {
    let mut bytes = [0u8; INT_FIELD_SIZE];
    BigEndian::write_i32(&mut bytes, value);
    write_exact(writer, &bytes)
}

/// Read a length prefix and return it if it lies within `bounds`.
///
/// The payload itself is not read. `reject` builds the error for an
/// out-of-range length from the raw declared value.
pub fn read_length<R, F>(reader: &mut R, bounds: RangeInclusive<usize>, reject: F) -> Result<usize>
where
    R: Read + ?Sized,
    F: FnOnce(i32) -> Error,
{
    let declared = read_i32(reader)?;

    match usize::try_from(declared) {
        Ok(len) if bounds.contains(&len) => Ok(len),
        _ => Err(reject(declared)),
    }
}

/// Write `{i32 length, data}`
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, data: &[u8]) -> Result<()> {
    let len = i32::try_from(data.len()).map_err(|_| {
        Error::Write(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("frame of {} bytes exceeds the length field", data.len()),
        ))
    })?;

    write_i32(writer, len)?;
    write_exact(writer, data)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Reader that hands out at most one byte per call
    struct Trickle<'a>(&'a [u8]);

    impl Read for Trickle<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.0.is_empty() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.0[0];
            self.0 = &self.0[1..];
            Ok(1)
        }
    }

    #[test]
    fn test_read_exact_retries_short_reads() -> Result<()> {
        let data = [1u8, 2, 3, 4, 5, 6, 7];
        let mut reader = Trickle(&data);
        assert_eq!(read_exact(&mut reader, 7)?, data.to_vec());
        Ok(())
    }

    #[test]
    fn test_read_exact_reports_early_close() {
        let mut reader = Cursor::new(vec![1u8, 2, 3]);
        match read_exact(&mut reader, 5) {
            Err(Error::ConnectionClosed { expected, received }) => {
                assert_eq!(expected, 5);
                assert_eq!(received, 3);
            }
            other => panic!("Expected ConnectionClosed, got {:?}", other),
        }
    }

    #[test]
    fn test_read_exact_zero_bytes() -> Result<()> {
        let mut reader = Cursor::new(Vec::new());
        assert!(read_exact(&mut reader, 0)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_i32_is_big_endian() -> Result<()> {
        let mut out = Vec::new();
        write_i32(&mut out, 0x0102_0304)?;
        assert_eq!(out, vec![1, 2, 3, 4]);

        write_i32(&mut out, -2)?;
        let mut reader = Cursor::new(out);
        assert_eq!(read_i32(&mut reader)?, 0x0102_0304);
        assert_eq!(read_i32(&mut reader)?, -2);
        Ok(())
    }

    #[test]
    fn test_read_length_bounds() -> Result<()> {
        let mut out = Vec::new();
        write_i32(&mut out, 10)?;
        write_i32(&mut out, 11)?;
        write_i32(&mut out, -1)?;
        let mut reader = Cursor::new(out);

        assert_eq!(read_length(&mut reader, 1..=10, Error::InvalidPublicKeySize)?, 10);
        assert!(matches!(
            read_length(&mut reader, 1..=10, Error::InvalidPublicKeySize),
            Err(Error::InvalidPublicKeySize(11))
        ));
        assert!(matches!(
            read_length(&mut reader, 1..=10, Error::InvalidPublicKeySize),
            Err(Error::InvalidPublicKeySize(-1))
        ));
        Ok(())
    }

    #[test]
    fn test_write_frame() -> Result<()> {
        let mut out = Vec::new();
        write_frame(&mut out, b"abc")?;
        assert_eq!(out, vec![0, 0, 0, 3, b'a', b'b', b'c']);
        Ok(())
    }
}
