//! # Packet Structures
//!
//! Fixed-layout records that appear inside outbound payloads. Each implements
//! [`WireFormat`] so that its layout lives in exactly one place.

use crate::codec::{CodecError, PacketReader, PacketWriter, Result, WireFormat};

/// Number of key slots the client keeps
pub const KEYMAP_SLOTS: usize = 90;

/// Width of a name field inside buddy entries
pub const NAME_FIELD_WIDTH: usize = 13;

// ============================================================================
// KEY BINDINGS
// ============================================================================

/// One bound key: what kind of thing it triggers and which one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct KeyBinding {
    /// Binding kind (skill, item, menu, ...)
    pub binding_type: u8,
    /// Skill id, item id or menu action
    pub action: i32,
}

impl KeyBinding {
    pub const fn new(binding_type: u8, action: i32) -> Self {
        Self { binding_type, action }
    }
}

/// The full 90-slot key table
///
/// Unbound slots are `None` in memory and `(0, 0)` on the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyMap {
    slots: [Option<KeyBinding>; KEYMAP_SLOTS],
}

impl Default for KeyMap {
    fn default() -> Self {
        Self {
            slots: [None; KEYMAP_SLOTS],
        }
    }
}

impl KeyMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: usize) -> Option<KeyBinding> {
        self.slots.get(key).copied().flatten()
    }

    /// Bind `key`; out-of-range keys are rejected
    pub fn bind(&mut self, key: usize, binding: KeyBinding) -> Result<()> {
        let slot = self.slots.get_mut(key).ok_or(CodecError::ValueOutOfRange {
            field: "key slot",
            value: key,
            max: KEYMAP_SLOTS - 1,
        })?;
        *slot = Some(binding);
        Ok(())
    }

    pub fn unbind(&mut self, key: usize) -> Option<KeyBinding> {
        self.slots.get_mut(key).and_then(Option::take)
    }

    pub fn slots(&self) -> &[Option<KeyBinding>; KEYMAP_SLOTS] {
        &self.slots
    }

    pub fn bound_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}

impl WireFormat for KeyMap {
    fn encode(&self, w: &mut PacketWriter) -> Result<()> {
        for slot in &self.slots {
            let binding = slot.unwrap_or_default();
            w.write_u8(binding.binding_type).write_i32(binding.action);
        }
        Ok(())
    }

    fn decode(r: &mut PacketReader) -> Result<Self> {
        let mut map = KeyMap::default();
        for slot in map.slots.iter_mut() {
            let binding_type = r.read_u8()?;
            let action = r.read_i32()?;
            *slot = if binding_type == 0 && action == 0 {
                None
            } else {
                Some(KeyBinding { binding_type, action })
            };
        }
        Ok(map)
    }
}

// ============================================================================
// SKILL MACROS
// ============================================================================

/// A named sequence of up to three skills cast with one key
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SkillMacro {
    pub name: String,
    /// Whether the macro name is shouted in chat when used
    pub shout: bool,
    /// Skill ids; 0 marks an empty step
    pub skills: [i32; 3],
}

impl SkillMacro {
    pub fn new(name: impl Into<String>, shout: bool, skills: [i32; 3]) -> Self {
        Self {
            name: name.into(),
            shout,
            skills,
        }
    }
}

impl WireFormat for SkillMacro {
    fn encode(&self, w: &mut PacketWriter) -> Result<()> {
        w.write_length_prefixed_string(&self.name)?;
        w.write_bool(self.shout);
        for skill in self.skills {
            w.write_i32(skill);
        }
        Ok(())
    }

    fn decode(r: &mut PacketReader) -> Result<Self> {
        let name = r.read_length_prefixed_string()?;
        let shout = r.read_bool()?;
        let skills = [r.read_i32()?, r.read_i32()?, r.read_i32()?];
        Ok(Self { name, shout, skills })
    }
}

// ============================================================================
// BUDDIES
// ============================================================================

/// One row of the buddy list as the client displays it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyEntry {
    pub character_id: i32,
    pub name: String,
    /// Channel the buddy is on, -1 when offline
    pub channel: i32,
}

impl WireFormat for BuddyEntry {
    fn encode(&self, w: &mut PacketWriter) -> Result<()> {
        w.write_i32(self.character_id);
        w.write_padded_string(&self.name, NAME_FIELD_WIDTH)?;
        // status: 0 = mutual buddy
        w.write_u8(0);
        w.write_i32(self.channel);
        Ok(())
    }

    fn decode(r: &mut PacketReader) -> Result<Self> {
        let character_id = r.read_i32()?;
        let raw = r.read_bytes(NAME_FIELD_WIDTH)?;
        let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
        let name = String::from_utf8_lossy(&raw[..end]).into_owned();
        r.skip(1)?;
        let channel = r.read_i32()?;
        Ok(Self { character_id, name, channel })
    }
}
