//! # Opcode Tables
//!
//! Two-byte opcodes for the targeted client version. Inbound values identify
//! client requests, outbound values prefix every payload the channel sends.
//!
//! Values are version-specific; only the symbolic names are stable.

/// Client-to-server opcodes understood by the channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum RecvOpcode {
    /// Client asks for the world list again while on the character list
    ServerlistRerequest = 0x04,
    /// Client backs out of the character list
    ExitCharlist = 0x0C,
    /// "View all characters" selection
    PickAllChar = 0x0E,
    /// Toggling the "view all characters" screen
    EnterExitViewAll = 0x0F,
    /// Character picked on the login server
    CharSelect = 0x13,
    /// New connection claims a character
    ///
    /// # Packet Format
    /// ```text
    /// {u16 opcode}{i32 character id}
    /// ```
    PlayerConnected = 0x14,
    /// Keep-alive reply
    Pong = 0x18,
    /// Client-side error report
    ///
    /// # Packet Format
    /// ```text
    /// {u16 opcode}{u16 len}{len bytes message}
    /// ```
    ClientError = 0x19,
    /// Cipher IV refresh; handled below this layer
    AesIvUpdateRequest = 0x1A,
    /// Return to the login screen
    Relog = 0x1C,
    /// Movement path
    MovePlayer = 0x26,
    /// Start an NPC conversation
    NpcTalk = 0x36,
    /// Continue an NPC conversation
    NpcTalkMore = 0x38,
}

impl RecvOpcode {
    pub fn from_u16(value: u16) -> Option<Self> {
        Some(match value {
            0x04 => Self::ServerlistRerequest,
            0x0C => Self::ExitCharlist,
            0x0E => Self::PickAllChar,
            0x0F => Self::EnterExitViewAll,
            0x13 => Self::CharSelect,
            0x14 => Self::PlayerConnected,
            0x18 => Self::Pong,
            0x19 => Self::ClientError,
            0x1A => Self::AesIvUpdateRequest,
            0x1C => Self::Relog,
            0x26 => Self::MovePlayer,
            0x36 => Self::NpcTalk,
            0x38 => Self::NpcTalkMore,
            _ => return None,
        })
    }

    #[inline]
    pub fn as_u16(self) -> u16 {
        self as u16
    }

    /// Opcodes the channel accepts and ignores
    ///
    /// The client sends these while its character list is still loading;
    /// answering them with nothing keeps the client from stalling.
    pub const NO_OPS: [RecvOpcode; 7] = [
        Self::ServerlistRerequest,
        Self::ExitCharlist,
        Self::PickAllChar,
        Self::EnterExitViewAll,
        Self::CharSelect,
        Self::Relog,
        Self::AesIvUpdateRequest,
    ];
}

/// Server-to-client opcodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum SendOpcode {
    Ping = 0x11,
    BuddyList = 0x3C,
    SkillMacro = 0x5B,
    ChangeMap = 0x5C,
    Cooldown = 0xDD,
    Keymap = 0x107,
}

impl SendOpcode {
    #[inline]
    pub fn as_u16(self) -> u16 {
        self as u16
    }
}

/// Sub-operations of [`SendOpcode::BuddyList`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum BuddyListOp {
    /// Full list replace
    Update = 0x07,
    /// Incoming buddy request
    Invite = 0x09,
    /// Buddy came online or changed channel
    ChannelChange = 0x14,
}
