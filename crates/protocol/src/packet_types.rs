//! # Inbound Frames
//!
//! A frame is one logical packet as delivered by the transport: a 2-byte
//! opcode followed by the payload. [`PacketIn`] splits the opcode off and
//! hands the rest to handlers as a [`PacketReader`].

use bytes::Bytes;

use crate::codec::{PacketReader, Result};
use crate::opcodes::RecvOpcode;

/// One inbound frame with its opcode already read
#[derive(Debug, Clone)]
pub struct PacketIn {
    /// Raw opcode, kept even when it is not in [`RecvOpcode`]
    pub opcode: u16,
    /// Cursor positioned at the first payload byte
    pub body: PacketReader,
}

impl PacketIn {
    /// Split a frame into opcode and body
    ///
    /// # Returns
    /// `OutOfBounds` if the frame cannot hold an opcode
    pub fn from_frame(frame: impl Into<Bytes>) -> Result<Self> {
        let mut body = PacketReader::new(frame);
        let opcode = body.read_u16()?;
        Ok(Self { opcode, body })
    }

    /// Typed opcode, if known
    #[inline]
    pub fn kind(&self) -> Option<RecvOpcode> {
        RecvOpcode::from_u16(self.opcode)
    }

    /// Payload length after the opcode
    #[inline]
    pub fn len(&self) -> usize {
        self.body.remaining()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.body.remaining() == 0
    }
}
