//! # Character
//!
//! The in-game character owned by a session. Built from a
//! [`CharacterRecord`] on entry; capabilities shared with other server kinds
//! are exposed through the traits in [`crate::capabilities`].

use std::collections::{BTreeMap, HashMap};

use mserver_core::{AccountId, CharacterId, Privilege, SkillId};
use mserver_protocol::{KeyBinding, KeyMap, SkillMacro, KEYMAP_SLOTS};
use mserver_storage::CharacterRecord;
use tokio::time::Instant;
use tracing::warn;

use crate::buddy::BuddyList;
use crate::inventory::Inventory;

/// Learned level of one skill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillEntry {
    pub level: u8,
    pub master_level: u8,
}

/// Progress of one quest
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestEntry {
    pub state: u8,
    /// Mob id to kills so far
    pub mob_progress: HashMap<i32, i16>,
    /// Unix milliseconds, 0 while incomplete
    pub completion_time: i64,
}

/// Buff currently applied to the character
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActiveBuff {
    pub level: u8,
    /// `None` for buffs that last until cancelled
    pub expires_at: Option<Instant>,
}

/// Base stats shown in the character window
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CharacterStats {
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
}

#[derive(Debug, Clone)]
pub struct Character {
    pub(crate) id: CharacterId,
    pub(crate) account_id: AccountId,
    pub(crate) account_name: String,
    pub(crate) world: u8,
    pub(crate) name: String,
    pub(crate) privilege: Privilege,
    pub(crate) visible: bool,
    pub(crate) map: i32,
    pub(crate) spawn_point: u8,
    pub(crate) stats: CharacterStats,
    pub(crate) mesos: i32,
    pub(crate) inventory: Inventory,
    pub(crate) skills: HashMap<SkillId, SkillEntry>,
    pub(crate) cooldowns: HashMap<SkillId, Instant>,
    /// Saved cooldowns (skill, seconds left) waiting to be re-armed
    pub(crate) saved_cooldowns: Vec<(SkillId, i16)>,
    pub(crate) buffs: BTreeMap<SkillId, ActiveBuff>,
    pub(crate) quests: HashMap<i16, QuestEntry>,
    pub(crate) keymap: KeyMap,
    pub(crate) macros: Vec<SkillMacro>,
    pub(crate) buddies: BuddyList,
}

impl Character {
    /// Assemble a character from its loaded rows
    pub fn from_record(record: CharacterRecord) -> Self {
        let row = record.character;
        let id = row.id;

        let mut keymap = KeyMap::new();
        for binding in &record.keymap {
            let key = binding.key as usize;
            if keymap.bind(key, KeyBinding::new(binding.binding_type, binding.action)).is_err() {
                warn!("Character {} has a binding for key {} (max {})", id, key, KEYMAP_SLOTS - 1);
            }
        }

        let quests = record
            .quests
            .iter()
            .map(|quest| {
                let entry = QuestEntry {
                    state: quest.status.state,
                    mob_progress: quest.mob_progress.iter().map(|p| (p.mob_id, p.count)).collect(),
                    completion_time: quest.status.completed,
                };
                (quest.status.quest_id, entry)
            })
            .collect();

        Self {
            id,
            account_id: row.account_id,
            account_name: record.account_name,
            world: row.world,
            name: row.name,
            privilege: Privilege::from_u8(record.privilege),
            visible: row.visible,
            map: row.map,
            spawn_point: row.spawn_point,
            stats: CharacterStats {
                gender: row.gender,
                skin: row.skin,
                face: row.face,
                hair: row.hair,
                level: row.level,
                job: row.job,
                str: row.str,
                dex: row.dex,
                int: row.int,
                luk: row.luk,
                hp: row.hp,
                max_hp: row.max_hp,
                mp: row.mp,
                max_mp: row.max_mp,
                ap: row.ap,
                sp: row.sp,
                exp: row.exp,
                fame: row.fame,
            },
            mesos: row.mesos,
            inventory: Inventory::from_rows(&record.inventory),
            skills: record
                .skills
                .iter()
                .map(|s| (s.skill_id, SkillEntry { level: s.level, master_level: s.mastery }))
                .collect(),
            cooldowns: HashMap::new(),
            saved_cooldowns: record.cooldowns.iter().map(|c| (c.skill_id, c.remaining)).collect(),
            buffs: BTreeMap::new(),
            quests,
            keymap,
            macros: record
                .macros
                .iter()
                .map(|m| SkillMacro::new(m.name.clone(), m.shout, [m.skill1, m.skill2, m.skill3]))
                .collect(),
            buddies: BuddyList::from_rows(row.buddy_slots, &record.buddies),
        }
    }

    pub fn id(&self) -> CharacterId {
        self.id
    }

    pub fn account_id(&self) -> AccountId {
        self.account_id
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    pub fn world(&self) -> u8 {
        self.world
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn privilege(&self) -> Privilege {
        self.privilege
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn map(&self) -> i32 {
        self.map
    }

    pub fn spawn_point(&self) -> u8 {
        self.spawn_point
    }

    pub fn stats(&self) -> &CharacterStats {
        &self.stats
    }

    pub fn skill(&self, skill: SkillId) -> Option<SkillEntry> {
        self.skills.get(&skill).copied()
    }

    pub fn skills(&self) -> &HashMap<SkillId, SkillEntry> {
        &self.skills
    }

    pub fn quests(&self) -> &HashMap<i16, QuestEntry> {
        &self.quests
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn macros(&self) -> &[SkillMacro] {
        &self.macros
    }

    /// Saved cooldowns not yet re-armed; empties the list
    pub fn take_saved_cooldowns(&mut self) -> Vec<(SkillId, i16)> {
        std::mem::take(&mut self.saved_cooldowns)
    }

    pub fn buff(&self, skill: SkillId) -> Option<ActiveBuff> {
        self.buffs.get(&skill).copied()
    }

    pub fn buffs(&self) -> impl Iterator<Item = (SkillId, ActiveBuff)> + '_ {
        self.buffs.iter().map(|(id, buff)| (*id, *buff))
    }

    pub fn apply_buff(&mut self, skill: SkillId, buff: ActiveBuff) {
        self.buffs.insert(skill, buff);
    }

    pub fn cancel_buff(&mut self, skill: SkillId) -> Option<ActiveBuff> {
        self.buffs.remove(&skill)
    }

    /// Make the character invisible to others on its map
    pub fn hide(&mut self) {
        self.visible = false;
    }

    pub fn set_position(&mut self, map: i32, spawn_point: u8) {
        self.map = map;
        self.spawn_point = spawn_point;
    }
}
