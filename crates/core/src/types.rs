//! Core type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Character ID (32-bit signed, as stored by the character table)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CharacterId(pub i32);

impl CharacterId {
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl From<i32> for CharacterId {
    fn from(id: i32) -> Self {
        Self(id)
    }
}

impl fmt::Display for CharacterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccountId(pub i32);

impl AccountId {
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player skill ID (e.g. 1101004)
pub type SkillId = i32;

/// Mob skill ID (e.g. 200 for summon)
pub type MobSkillId = i16;

/// Per-connection session ID, assigned by the accept loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u32);

impl SessionId {
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    pub fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Persisted online state of an account
///
/// The login server writes `Migrating` before handing a client to a channel;
/// a channel only admits a character whose account carries that marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OnlineState {
    /// Not logged in anywhere
    Offline = 0,
    /// Logged in on the login server
    LoggedIn = 1,
    /// In transfer between servers
    Migrating = 2,
    /// Playing on a channel or in the shop
    InGame = 3,
}

impl OnlineState {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Offline),
            1 => Some(Self::LoggedIn),
            2 => Some(Self::Migrating),
            3 => Some(Self::InGame),
            _ => None,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

/// Account privilege tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Privilege {
    User = 0,
    Donor = 1,
    JuniorGm = 2,
    Gm = 3,
    SuperGm = 4,
    Admin = 5,
}

impl Privilege {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::User,
            1 => Self::Donor,
            2 => Self::JuniorGm,
            3 => Self::Gm,
            4 => Self::SuperGm,
            _ => Self::Admin,
        }
    }

    /// Anything above a plain user account
    pub fn is_staff(self) -> bool {
        self > Self::User
    }
}
