//! Little-endian binary codec
//!
//! Every inbound frame is read through a [`PacketReader`] and every outbound
//! payload is assembled with a [`PacketWriter`]. All integers are
//! little-endian; strings are prefixed with a 2-byte length.
//!
//! Reads never panic: a read past the end of the frame returns
//! [`CodecError::OutOfBounds`] and leaves the cursor where it was. Writes never
//! truncate: a string or count that does not fit its declared width returns
//! [`CodecError::ValueOutOfRange`].

use bytes::{Buf, BufMut, Bytes, BytesMut};
use mserver_core::ServerError;
use std::fmt;

/// Codec failures
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Fewer bytes remain than the requested read needs
    #[error("read of {needed} bytes with only {remaining} remaining")]
    OutOfBounds { needed: usize, remaining: usize },

    /// A value does not fit the width it is written with
    #[error("{field} value {value} exceeds maximum {max}")]
    ValueOutOfRange {
        field: &'static str,
        value: usize,
        max: usize,
    },
}

impl From<CodecError> for ServerError {
    fn from(err: CodecError) -> Self {
        ServerError::ProtocolViolation(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;

/// Trait for types with a fixed wire layout
pub trait WireFormat: Sized {
    fn encode(&self, w: &mut PacketWriter) -> Result<()>;
    fn decode(r: &mut PacketReader) -> Result<Self>;
}

/// Cursor over one inbound frame
#[derive(Clone)]
pub struct PacketReader {
    buf: Bytes,
}

impl PacketReader {
    #[inline]
    pub fn new(buf: impl Into<Bytes>) -> Self {
        Self { buf: buf.into() }
    }

    /// Bytes left in the frame
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    /// Unread part of the frame
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[..]
    }

    #[inline]
    fn ensure(&self, needed: usize) -> Result<()> {
        let remaining = self.buf.remaining();
        if remaining < needed {
            return Err(CodecError::OutOfBounds { needed, remaining });
        }
        Ok(())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.buf.get_u8())
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.buf.get_i8())
    }

    /// Any nonzero byte is `true`
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        self.ensure(2)?;
        Ok(self.buf.get_u16_le())
    }

    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        self.ensure(2)?;
        Ok(self.buf.get_i16_le())
    }

    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        self.ensure(4)?;
        Ok(self.buf.get_u32_le())
    }

    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        self.ensure(4)?;
        Ok(self.buf.get_i32_le())
    }

    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        self.ensure(8)?;
        Ok(self.buf.get_i64_le())
    }

    /// Read exactly `len` raw bytes
    pub fn read_bytes(&mut self, len: usize) -> Result<Bytes> {
        self.ensure(len)?;
        Ok(self.buf.copy_to_bytes(len))
    }

    /// Discard `len` bytes
    pub fn skip(&mut self, len: usize) -> Result<()> {
        self.ensure(len)?;
        self.buf.advance(len);
        Ok(())
    }

    /// Read a 2-byte length followed by that many bytes of text
    ///
    /// The client sends single-byte text; invalid UTF-8 is replaced rather
    /// than rejected. The cursor is untouched if the body is truncated.
    pub fn read_length_prefixed_string(&mut self) -> Result<String> {
        self.ensure(2)?;
        let len = u16::from_le_bytes([self.buf[0], self.buf[1]]) as usize;
        self.ensure(2 + len)?;
        self.buf.advance(2);
        let raw = self.buf.copy_to_bytes(len);
        Ok(String::from_utf8_lossy(&raw).into_owned())
    }
}

impl fmt::Debug for PacketReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PacketReader({} bytes: {:02X?})", self.buf.len(), &self.buf[..])
    }
}

/// Growable little-endian output buffer
#[derive(Debug, Default)]
pub struct PacketWriter {
    buf: BytesMut,
}

impl PacketWriter {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: BytesMut::with_capacity(capacity),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.buf.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    #[inline]
    pub fn write_u8(&mut self, val: u8) -> &mut Self {
        self.buf.put_u8(val);
        self
    }

    #[inline]
    pub fn write_i8(&mut self, val: i8) -> &mut Self {
        self.buf.put_i8(val);
        self
    }

    #[inline]
    pub fn write_bool(&mut self, val: bool) -> &mut Self {
        self.buf.put_u8(val as u8);
        self
    }

    #[inline]
    pub fn write_u16(&mut self, val: u16) -> &mut Self {
        self.buf.put_u16_le(val);
        self
    }

    #[inline]
    pub fn write_i16(&mut self, val: i16) -> &mut Self {
        self.buf.put_i16_le(val);
        self
    }

    #[inline]
    pub fn write_u32(&mut self, val: u32) -> &mut Self {
        self.buf.put_u32_le(val);
        self
    }

    #[inline]
    pub fn write_i32(&mut self, val: i32) -> &mut Self {
        self.buf.put_i32_le(val);
        self
    }

    #[inline]
    pub fn write_i64(&mut self, val: i64) -> &mut Self {
        self.buf.put_i64_le(val);
        self
    }

    #[inline]
    pub fn write_bytes(&mut self, val: &[u8]) -> &mut Self {
        self.buf.put_slice(val);
        self
    }

    /// Write a count that must fit in one byte
    pub fn write_count_u8(&mut self, field: &'static str, count: usize) -> Result<&mut Self> {
        let val = u8::try_from(count).map_err(|_| CodecError::ValueOutOfRange {
            field,
            value: count,
            max: u8::MAX as usize,
        })?;
        Ok(self.write_u8(val))
    }

    /// Write a count that must fit in two bytes
    pub fn write_count_u16(&mut self, field: &'static str, count: usize) -> Result<&mut Self> {
        let val = u16::try_from(count).map_err(|_| CodecError::ValueOutOfRange {
            field,
            value: count,
            max: u16::MAX as usize,
        })?;
        Ok(self.write_u16(val))
    }

    /// Write a 2-byte length followed by the raw bytes of `val`
    pub fn write_length_prefixed_string(&mut self, val: &str) -> Result<&mut Self> {
        let bytes = val.as_bytes();
        let len = u16::try_from(bytes.len()).map_err(|_| CodecError::ValueOutOfRange {
            field: "string length",
            value: bytes.len(),
            max: u16::MAX as usize,
        })?;
        self.buf.put_u16_le(len);
        self.buf.put_slice(bytes);
        Ok(self)
    }

    /// Write `val` into a fixed-width, NUL-padded field
    pub fn write_padded_string(&mut self, val: &str, width: usize) -> Result<&mut Self> {
        let bytes = val.as_bytes();
        if bytes.len() > width {
            return Err(CodecError::ValueOutOfRange {
                field: "padded string",
                value: bytes.len(),
                max: width,
            });
        }
        self.buf.put_slice(bytes);
        self.buf.put_bytes(0, width - bytes.len());
        Ok(self)
    }

    /// Finish the payload
    #[inline]
    pub fn into_bytes(self) -> Bytes {
        self.buf.freeze()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_little_endian_layout() {
        let mut w = PacketWriter::new();
        w.write_u16(0x1234).write_i32(-2).write_i64(1);
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..2], &[0x34, 0x12]);
        assert_eq!(&bytes[2..6], &[0xFE, 0xFF, 0xFF, 0xFF]);
        assert_eq!(&bytes[6..], &[1, 0, 0, 0, 0, 0, 0, 0]);
    }

    #[test]
    fn test_reader_primitives() {
        let mut r = PacketReader::new(vec![0x01, 0xFF, 0x34, 0x12, 0x78, 0x56, 0x34, 0x12]);
        assert!(r.read_bool().unwrap());
        assert_eq!(r.read_i8().unwrap(), -1);
        assert_eq!(r.read_u16().unwrap(), 0x1234);
        assert_eq!(r.read_i32().unwrap(), 0x12345678);
        assert_eq!(r.remaining(), 0);
    }

    #[test]
    fn test_out_of_bounds_read() {
        let mut r = PacketReader::new(vec![0x01, 0x02, 0x03]);
        let err = r.read_i32().unwrap_err();
        assert_eq!(err, CodecError::OutOfBounds { needed: 4, remaining: 3 });
        // Failed read leaves the cursor alone
        assert_eq!(r.remaining(), 3);
        assert_eq!(r.read_u16().unwrap(), 0x0201);
    }

    #[test]
    fn test_length_prefixed_string() {
        let mut w = PacketWriter::new();
        w.write_length_prefixed_string("Hero").unwrap();
        let bytes = w.into_bytes();
        assert_eq!(&bytes[..], &[4, 0, b'H', b'e', b'r', b'o']);

        let mut r = PacketReader::new(bytes);
        assert_eq!(r.read_length_prefixed_string().unwrap(), "Hero");
    }

    #[test]
    fn test_truncated_string_body() {
        // Declares 10 bytes, carries 2
        let mut r = PacketReader::new(vec![10, 0, b'h', b'i']);
        let err = r.read_length_prefixed_string().unwrap_err();
        assert_eq!(err, CodecError::OutOfBounds { needed: 12, remaining: 4 });
        assert_eq!(r.remaining(), 4);
    }

    #[test]
    fn test_string_too_long_for_prefix() {
        let long = "x".repeat(u16::MAX as usize + 1);
        let mut w = PacketWriter::new();
        assert!(matches!(
            w.write_length_prefixed_string(&long),
            Err(CodecError::ValueOutOfRange { .. })
        ));
        assert!(w.is_empty());
    }

    #[test]
    fn test_padded_string() {
        let mut w = PacketWriter::new();
        w.write_padded_string("Bob", 13).unwrap();
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 13);
        assert_eq!(&bytes[..3], b"Bob");
        assert!(bytes[3..].iter().all(|&b| b == 0));

        let mut w = PacketWriter::new();
        assert!(w.write_padded_string("ThisNameIsTooLong", 13).is_err());
    }

    #[test]
    fn test_count_out_of_range() {
        let mut w = PacketWriter::new();
        assert!(w.write_count_u8("macros", 255).is_ok());
        assert_eq!(
            w.write_count_u8("macros", 256).unwrap_err(),
            CodecError::ValueOutOfRange { field: "macros", value: 256, max: 255 }
        );
    }

    #[test]
    fn test_codec_error_converts_to_protocol_violation() {
        let err: ServerError = CodecError::OutOfBounds { needed: 4, remaining: 0 }.into();
        assert!(matches!(err, ServerError::ProtocolViolation(_)));
        assert!(err.is_session_fatal());
    }
}
