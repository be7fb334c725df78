//! Row types of the persistence schema
//!
//! One struct per table. The channel reads these and never owns the schema;
//! field names follow the column names.

use mserver_core::{AccountId, CharacterId, MobSkillId, OnlineState, SkillId};
use serde::{Deserialize, Serialize};

/// Inventory partitions
///
/// `CashShop` rows belong to the account rather than the character and are
/// merged into every character's inventory set on load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum InventoryType {
    Equipped = 0,
    Equip = 1,
    Use = 2,
    Setup = 3,
    Etc = 4,
    Cash = 5,
    CashShop = 6,
}

impl InventoryType {
    pub const ALL: [InventoryType; 7] = [
        Self::Equipped,
        Self::Equip,
        Self::Use,
        Self::Setup,
        Self::Etc,
        Self::Cash,
        Self::CashShop,
    ];

    pub fn from_u8(value: u8) -> Option<Self> {
        Self::ALL.get(value as usize).copied()
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }
}

// ============================================================================
// ACCOUNT & CHARACTER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountRow {
    pub id: AccountId,
    pub name: String,
    pub privilege: u8,
    pub online_state: OnlineState,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CharacterRow {
    pub id: CharacterId,
    pub account_id: AccountId,
    pub world: u8,
    pub name: String,
    pub gender: u8,
    pub skin: u8,
    pub face: i32,
    pub hair: i32,
    pub level: u8,
    pub job: i16,
    pub str: i16,
    pub dex: i16,
    pub int: i16,
    pub luk: i16,
    pub hp: i16,
    pub max_hp: i16,
    pub mp: i16,
    pub max_mp: i16,
    pub ap: i16,
    pub sp: i16,
    pub exp: i32,
    pub fame: i16,
    pub map: i32,
    pub spawn_point: u8,
    pub mesos: i32,
    pub buddy_slots: u8,
    pub visible: bool,
}

impl Default for CharacterRow {
    fn default() -> Self {
        Self {
            id: CharacterId(0),
            account_id: AccountId(0),
            world: 0,
            name: String::new(),
            gender: 0,
            skin: 0,
            face: 20000,
            hair: 30000,
            level: 1,
            job: 0,
            str: 4,
            dex: 4,
            int: 4,
            luk: 4,
            hp: 50,
            max_hp: 50,
            mp: 5,
            max_mp: 5,
            ap: 0,
            sp: 0,
            exp: 0,
            fame: 0,
            map: 0,
            spawn_point: 0,
            mesos: 0,
            buddy_slots: 20,
            visible: true,
        }
    }
}

// ============================================================================
// CHARACTER-OWNED TABLES
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItemRow {
    pub character_id: CharacterId,
    pub account_id: AccountId,
    pub inventory_type: InventoryType,
    pub position: i16,
    pub item_id: i32,
    pub quantity: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillEntryRow {
    pub character_id: CharacterId,
    pub skill_id: SkillId,
    pub level: u8,
    pub mastery: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CooldownRow {
    pub character_id: CharacterId,
    pub skill_id: SkillId,
    /// Seconds left when the character was saved
    pub remaining: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestStatusRow {
    /// Row id, referenced by [`QuestMobProgressRow::quest_status_id`]
    pub id: i32,
    pub character_id: CharacterId,
    pub quest_id: i16,
    pub state: u8,
    /// Completion time in Unix milliseconds, 0 if not completed
    pub completed: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestMobProgressRow {
    pub quest_status_id: i32,
    pub mob_id: i32,
    pub count: i16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyBindingRow {
    pub character_id: CharacterId,
    pub key: u8,
    pub binding_type: u8,
    pub action: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillMacroRow {
    pub character_id: CharacterId,
    pub position: u8,
    pub name: String,
    pub shout: bool,
    pub skill1: SkillId,
    pub skill2: SkillId,
    pub skill3: SkillId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuddyRow {
    pub owner: CharacterId,
    pub buddy_id: CharacterId,
    pub buddy_name: String,
    /// Request not yet accepted by the owner
    pub pending: bool,
}

/// Quest status with its mob-kill progress rows attached
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestRecord {
    pub status: QuestStatusRow,
    pub mob_progress: Vec<QuestMobProgressRow>,
}

/// Everything loaded for one character on entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterRecord {
    pub character: CharacterRow,
    pub account_name: String,
    pub privilege: u8,
    pub inventory: Vec<InventoryItemRow>,
    pub skills: Vec<SkillEntryRow>,
    pub cooldowns: Vec<CooldownRow>,
    pub quests: Vec<QuestRecord>,
    pub keymap: Vec<KeyBindingRow>,
    pub macros: Vec<SkillMacroRow>,
    pub buddies: Vec<BuddyRow>,
}

// ============================================================================
// SKILL DATA
// ============================================================================

/// One level of one player skill
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SkillEffectRow {
    pub skill_id: SkillId,
    pub level: u8,
    pub mob_count: u8,
    pub attack_count: u8,
    pub duration: i32,
    pub mp_con: i16,
    pub hp_con: i16,
    pub damage: i16,
    pub item_con: i32,
    pub item_con_count: u8,
    /// Bullet count or bullets consumed, depending on the skill
    pub bullet: i16,
    pub money_con: i16,
    pub x: i32,
    pub y: i32,
    pub speed: i16,
    pub jump: i16,
    pub watk: i16,
    pub wdef: i16,
    pub matk: i16,
    pub mdef: i16,
    pub acc: i16,
    pub avoid: i16,
    pub hp_r: i16,
    pub mp_r: i16,
    pub prop: i16,
    pub morph: i32,
    pub lt_x: i16,
    pub lt_y: i16,
    pub rb_x: i16,
    pub rb_y: i16,
    pub cooltime: i16,
}

/// One level of one mob skill
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MobSkillEffectRow {
    pub skill_id: MobSkillId,
    pub level: u8,
    pub duration: i32,
    pub mp_con: i16,
    pub x: i32,
    pub y: i32,
    pub prop: i16,
    pub cooltime: i16,
    pub lt_x: i16,
    pub lt_y: i16,
    pub rb_x: i16,
    pub rb_y: i16,
    pub max_hp_percent: i16,
    pub limit: i16,
    pub summon_effect: u8,
}

/// Monster spawned by a summon mob skill at a given level
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummonRow {
    pub level: u8,
    pub mob_index: u8,
    pub mob_id: i32,
}
