//! All levels of one skill

use std::collections::BTreeMap;

use mserver_core::{MobSkillId, SkillId};

use crate::effects::{MobSkillEffect, PlayerSkillEffect};
use crate::tables;

/// Every level of one player skill plus its classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkillStats {
    id: SkillId,
    levels: BTreeMap<u8, PlayerSkillEffect>,
    buff: bool,
    charged: bool,
}

impl SkillStats {
    /// Start an empty level set; classification comes from the static tables
    pub fn new(id: SkillId) -> Self {
        Self {
            id,
            levels: BTreeMap::new(),
            buff: tables::is_buff(id),
            charged: tables::is_charged(id),
        }
    }

    /// Returns `true` if an earlier row for the same level was replaced
    pub(crate) fn add_level(&mut self, effect: PlayerSkillEffect) -> bool {
        self.levels.insert(effect.level, effect).is_some()
    }

    pub fn id(&self) -> SkillId {
        self.id
    }

    pub fn is_buff(&self) -> bool {
        self.buff
    }

    pub fn is_charged(&self) -> bool {
        self.charged
    }

    pub fn level(&self, level: u8) -> Option<&PlayerSkillEffect> {
        self.levels.get(&level)
    }

    pub fn max_level(&self) -> u8 {
        self.levels.keys().next_back().copied().unwrap_or(0)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    /// Levels in ascending order
    pub fn levels(&self) -> impl Iterator<Item = &PlayerSkillEffect> {
        self.levels.values()
    }
}

/// Every level of one mob skill
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobSkillStats {
    id: MobSkillId,
    levels: BTreeMap<u8, MobSkillEffect>,
}

impl MobSkillStats {
    pub fn new(id: MobSkillId) -> Self {
        Self {
            id,
            levels: BTreeMap::new(),
        }
    }

    pub(crate) fn add_level(&mut self, effect: MobSkillEffect) -> bool {
        self.levels.insert(effect.level, effect).is_some()
    }

    pub fn id(&self) -> MobSkillId {
        self.id
    }

    pub fn level(&self, level: u8) -> Option<&MobSkillEffect> {
        self.levels.get(&level)
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn levels(&self) -> impl Iterator<Item = &MobSkillEffect> {
        self.levels.values()
    }
}
