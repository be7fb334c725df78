//! # Packet Builder
//!
//! Builder functions for server-to-client payloads. Every function returns a
//! finished frame (opcode included) ready for the transport.
//!
//! The layouts here are a contract with the client: a single misplaced byte
//! desynchronizes its reader, so every builder has a test pinning its bytes.

use bytes::Bytes;
use mserver_core::SeedSource;

use crate::codec::{PacketWriter, Result, WireFormat};
use crate::opcodes::{BuddyListOp, SendOpcode};
use crate::packet_structures::{BuddyEntry, KeyMap, SkillMacro, KEYMAP_SLOTS};
use crate::time::unix_to_windows_time;

#[inline]
fn start(opcode: SendOpcode, capacity: usize) -> PacketWriter {
    let mut w = PacketWriter::with_capacity(capacity + 2);
    w.write_u16(opcode.as_u16());
    w
}

/// Build the map-entry packet (CHANGE_MAP)
///
/// # Purpose
/// First packet a character receives on a channel: places it on its map and
/// carries the full character-data block.
///
/// # Packet Format
/// ```text
/// {u16 op}{i32 channel-1}{u8 1}{u8 1}{u16 0}{i32 seed}x3{char data}{i64 filetime}
/// ```
///
/// # Arguments
/// * `channel` - 1-based channel number
/// * `seeds` - Source of the three client RNG seeds
/// * `char_data` - Pre-encoded character-data block
/// * `unix_ms` - Server time in Unix milliseconds
pub fn build_enter_map(channel: u8, seeds: &dyn SeedSource, char_data: &[u8], unix_ms: i64) -> Bytes {
    let mut w = start(SendOpcode::ChangeMap, 30 + char_data.len());
    w.write_i32(i32::from(channel) - 1)
        .write_u8(1)
        .write_u8(1)
        .write_u16(0);
    for _ in 0..3 {
        w.write_i32(seeds.next_i32());
    }
    w.write_bytes(char_data);
    w.write_i64(unix_to_windows_time(unix_ms));
    w.into_bytes()
}

/// Build the key-binding table (KEYMAP)
///
/// # Packet Format
/// ```text
/// {u16 op}{u8 0}({u8 type}{i32 action})x90
/// ```
pub fn build_keymap(keymap: &KeyMap) -> Result<Bytes> {
    let mut w = start(SendOpcode::Keymap, 1 + KEYMAP_SLOTS * 5);
    w.write_u8(0);
    keymap.encode(&mut w)?;
    Ok(w.into_bytes())
}

/// Build the skill-macro list (SKILL_MACRO)
///
/// # Packet Format
/// ```text
/// {u16 op}{u8 count}({lpstring name}{u8 shout}{i32 skill}x3)*count
/// ```
///
/// # Returns
/// `ValueOutOfRange` if there are more than 255 macros or a name is too long
pub fn build_skill_macros(macros: &[SkillMacro]) -> Result<Bytes> {
    let mut w = start(SendOpcode::SkillMacro, 1 + macros.len() * 24);
    w.write_count_u8("skill macro count", macros.len())?;
    for m in macros {
        m.encode(&mut w)?;
    }
    Ok(w.into_bytes())
}

/// Build a cooldown update (COOLDOWN)
///
/// # Packet Format
/// ```text
/// {u16 op}{i32 skill}{i16 seconds}
/// ```
///
/// A `seconds` of 0 tells the client the cooldown has ended.
pub fn build_cooldown(skill_id: i32, seconds: i16) -> Bytes {
    let mut w = start(SendOpcode::Cooldown, 6);
    w.write_i32(skill_id).write_i16(seconds);
    w.into_bytes()
}

/// Build a full buddy list (BUDDY_LIST)
///
/// # Packet Format
/// ```text
/// {u16 op}{u8 subop}{u8 count}{entry}*count{i32 0}*count
/// ```
pub fn build_buddy_list(op: BuddyListOp, entries: &[BuddyEntry]) -> Result<Bytes> {
    let mut w = start(SendOpcode::BuddyList, 2 + entries.len() * 26);
    w.write_u8(op as u8);
    w.write_count_u8("buddy count", entries.len())?;
    for entry in entries {
        entry.encode(&mut w)?;
    }
    // Trailing per-entry flags the client expects but never reads meaningfully
    for _ in entries {
        w.write_i32(0);
    }
    Ok(w.into_bytes())
}

/// Build a pending buddy request (BUDDY_LIST / invite)
///
/// # Packet Format
/// ```text
/// {u16 op}{u8 9}{i32 from id}{lpstring from name}
/// ```
pub fn build_buddy_invite(from_id: i32, from_name: &str) -> Result<Bytes> {
    let mut w = start(SendOpcode::BuddyList, 7 + from_name.len());
    w.write_u8(BuddyListOp::Invite as u8).write_i32(from_id);
    w.write_length_prefixed_string(from_name)?;
    Ok(w.into_bytes())
}

/// Build a buddy presence update (BUDDY_LIST / channel change)
///
/// # Packet Format
/// ```text
/// {u16 op}{u8 0x14}{i32 buddy id}{u8 0}{i32 channel}
/// ```
///
/// `channel` is 0-based; -1 marks the buddy as offline.
pub fn build_buddy_channel_change(buddy_id: i32, channel: i32) -> Bytes {
    let mut w = start(SendOpcode::BuddyList, 10);
    w.write_u8(BuddyListOp::ChannelChange as u8)
        .write_i32(buddy_id)
        .write_u8(0)
        .write_i32(channel);
    w.into_bytes()
}

/// Build a keep-alive ping (PING)
pub fn build_ping() -> Bytes {
    start(SendOpcode::Ping, 0).into_bytes()
}
