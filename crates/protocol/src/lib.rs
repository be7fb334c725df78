//! # MServer Protocol Library
//!
//! Wire format of the game client protocol as seen by a channel server.
//!
//! ## Architecture
//!
//! ### 1. Codec ([`codec`])
//! Little-endian primitives over a byte cursor. Reads are bounds-checked and
//! fail with [`CodecError::OutOfBounds`]; writes reject values that do not fit
//! their width with [`CodecError::ValueOutOfRange`].
//!
//! ### 2. Opcodes ([`opcodes`])
//! Two-byte inbound and outbound opcode tables for the targeted client.
//!
//! ### 3. Frames and Structures ([`packet_types`], [`packet_structures`])
//! Inbound frame splitting and the fixed-layout records (key map, skill
//! macros, buddy entries) embedded in outbound payloads.
//!
//! ### 4. Builders ([`packet_builder`])
//! One function per outbound payload.
//!
//! ## Usage Example
//!
//! ```rust
//! use mserver_protocol::{build_cooldown, PacketIn, RecvOpcode};
//!
//! let frame = build_cooldown(1_101_004, 0);
//! assert_eq!(frame.len(), 8);
//!
//! let packet = PacketIn::from_frame(vec![0x18, 0x00]).unwrap();
//! assert_eq!(packet.kind(), Some(RecvOpcode::Pong));
//! ```

pub mod codec;
pub mod opcodes;
pub mod packet_builder;
pub mod packet_structures;
pub mod packet_types;
pub mod time;

pub use codec::*;
pub use opcodes::*;
pub use packet_builder::*;
pub use packet_structures::*;
pub use packet_types::*;
pub use time::*;
