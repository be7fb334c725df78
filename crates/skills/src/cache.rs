//! Process-wide effect cache
//!
//! Read-mostly map from skill id to [`SkillStats`] (and mob skill id to
//! [`MobSkillStats`]). Entries are filled by [`EffectCache::load_all`] at
//! startup or lazily per id. A failed or empty lookup is stored as `None`, so
//! later callers see the same absence without touching the store again.
//!
//! The tables sit behind `RwLock<Arc<_>>`: readers clone the `Arc` and work
//! lock-free on the DashMaps, [`EffectCache::refresh`] builds a new table set
//! and swaps it in one write.

use dashmap::DashMap;
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::{info, warn};

use mserver_core::{MobSkillId, SkillId};
use mserver_storage::SkillDataSource;

use crate::loader::{self, LoadedEffects};
use crate::stats::{MobSkillStats, SkillStats};

#[derive(Debug, Default)]
struct Tables {
    skills: DashMap<SkillId, Option<Arc<SkillStats>>>,
    mob_skills: DashMap<MobSkillId, Option<Arc<MobSkillStats>>>,
}

impl From<LoadedEffects> for Tables {
    fn from(loaded: LoadedEffects) -> Self {
        Self {
            skills: loaded
                .skills
                .into_iter()
                .map(|(id, stats)| (id, Some(Arc::new(stats))))
                .collect(),
            mob_skills: loaded
                .mob_skills
                .into_iter()
                .map(|(id, stats)| (id, Some(Arc::new(stats))))
                .collect(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EffectCacheStats {
    pub skills: usize,
    pub mob_skills: usize,
    /// Ids remembered as absent
    pub absent: usize,
}

pub struct EffectCache {
    source: Arc<dyn SkillDataSource>,
    tables: RwLock<Arc<Tables>>,
}

impl EffectCache {
    /// Create an empty cache over `source`
    pub fn new(source: Arc<dyn SkillDataSource>) -> Self {
        Self {
            source,
            tables: RwLock::new(Arc::new(Tables::default())),
        }
    }

    fn tables(&self) -> Arc<Tables> {
        self.tables.read().clone()
    }

    /// Bulk-load every skill and swap the result in
    ///
    /// # Returns
    /// `false` if the store failed; the previous contents stay in place
    pub fn load_all(&self) -> bool {
        match loader::load_all(self.source.as_ref()) {
            Ok(loaded) => {
                let tables = Tables::from(loaded);
                info!(
                    "Loaded {} skills and {} mob skills",
                    tables.skills.len(),
                    tables.mob_skills.len()
                );
                *self.tables.write() = Arc::new(tables);
                true
            }
            Err(e) => {
                warn!("Could not load all skill data: {}", e);
                false
            }
        }
    }

    /// Rebuild from the store, forgetting remembered absences
    pub fn refresh(&self) -> bool {
        self.load_all()
    }

    /// Stats for `skill`, loading them on first use
    pub fn skill(&self, skill: SkillId) -> Option<Arc<SkillStats>> {
        let tables = self.tables();
        if let Some(entry) = tables.skills.get(&skill) {
            return entry.clone();
        }

        let loaded = match loader::load_skill(self.source.as_ref(), skill) {
            Ok(stats) => stats.map(Arc::new),
            Err(e) => {
                warn!("Could not read data for skill {}: {}", skill, e);
                None
            }
        };
        // A concurrent loader may have won; keep whichever landed first
        let stats = tables.skills.entry(skill).or_insert(loaded).clone();
        stats
    }

    /// Whether `skill` has effect data
    ///
    /// Answers from the cache when it can, otherwise asks the store without
    /// loading the rows.
    pub fn skill_exists(&self, skill: SkillId) -> bool {
        let tables = self.tables();
        if let Some(entry) = tables.skills.get(&skill) {
            return entry.is_some();
        }
        match self.source.skill_exists(skill) {
            Ok(true) => true,
            Ok(false) => {
                tables.skills.entry(skill).or_insert(None);
                false
            }
            Err(e) => {
                warn!("Could not determine whether skill {} is valid: {}", skill, e);
                tables.skills.entry(skill).or_insert(None);
                false
            }
        }
    }

    pub fn mob_skill(&self, skill: MobSkillId) -> Option<Arc<MobSkillStats>> {
        let tables = self.tables();
        if let Some(entry) = tables.mob_skills.get(&skill) {
            return entry.clone();
        }

        let loaded = match loader::load_mob_skill(self.source.as_ref(), skill) {
            Ok(stats) => stats.map(Arc::new),
            Err(e) => {
                warn!("Could not read data for mob skill {}: {}", skill, e);
                None
            }
        };
        let stats = tables.mob_skills.entry(skill).or_insert(loaded).clone();
        stats
    }

    pub fn mob_skill_exists(&self, skill: MobSkillId) -> bool {
        let tables = self.tables();
        if let Some(entry) = tables.mob_skills.get(&skill) {
            return entry.is_some();
        }
        match self.source.mob_skill_exists(skill) {
            Ok(true) => true,
            Ok(false) => {
                tables.mob_skills.entry(skill).or_insert(None);
                false
            }
            Err(e) => {
                warn!("Could not determine whether mob skill {} is valid: {}", skill, e);
                tables.mob_skills.entry(skill).or_insert(None);
                false
            }
        }
    }

    pub fn stats(&self) -> EffectCacheStats {
        let tables = self.tables();
        let present_skills = tables.skills.iter().filter(|e| e.value().is_some()).count();
        let present_mobs = tables.mob_skills.iter().filter(|e| e.value().is_some()).count();
        EffectCacheStats {
            skills: present_skills,
            mob_skills: present_mobs,
            absent: tables.skills.len() - present_skills + tables.mob_skills.len() - present_mobs,
        }
    }
}
