//! Effect data loading
//!
//! Turns ordered storage rows into [`SkillStats`] / [`MobSkillStats`]. Rows
//! arrive sorted by skill id then level; a new stats object starts every time
//! the skill id changes. A second row for a level a skill already has
//! replaces the first, with a warning, so one bad row never costs the rest
//! of the table.
//!
//! Loader functions return errors. Swallowing them into "absent" is the
//! cache's job, not the loader's.

use std::collections::HashMap;

use mserver_core::{MobSkillId, SkillId};
use mserver_storage::{MobSkillEffectRow, SkillDataSource, SkillEffectRow};
use tracing::{debug, warn};

use crate::effects::{MobSkillEffect, PlayerSkillEffect, Summon};
use crate::error::Result;
use crate::stats::{MobSkillStats, SkillStats};
use crate::tables::MOB_SKILL_SUMMON;

/// Everything `load_all` produced
#[derive(Debug, Default)]
pub struct LoadedEffects {
    pub skills: HashMap<SkillId, SkillStats>,
    pub mob_skills: HashMap<MobSkillId, MobSkillStats>,
}

/// Group consecutive rows sharing a skill id
pub fn group_skill_rows(rows: &[SkillEffectRow]) -> Vec<SkillStats> {
    let mut grouped: Vec<SkillStats> = Vec::new();
    for row in rows {
        let effect = PlayerSkillEffect::from_row(row);
        let replaced = match grouped.last_mut() {
            Some(current) if current.id() == row.skill_id => current.add_level(effect),
            _ => {
                let mut stats = SkillStats::new(row.skill_id);
                stats.add_level(effect);
                grouped.push(stats);
                false
            }
        };
        if replaced {
            warn!("Skill {} has more than one row for level {}, keeping the last", row.skill_id, row.level);
        }
    }
    grouped
}

/// Group consecutive mob skill rows, fetching summons for the summon skill
pub fn group_mob_skill_rows(source: &dyn SkillDataSource, rows: &[MobSkillEffectRow]) -> Result<Vec<MobSkillStats>> {
    let mut grouped: Vec<MobSkillStats> = Vec::new();
    for row in rows {
        let effect = mob_effect(source, row)?;
        let replaced = match grouped.last_mut() {
            Some(current) if current.id() == row.skill_id => current.add_level(effect),
            _ => {
                let mut stats = MobSkillStats::new(row.skill_id);
                stats.add_level(effect);
                grouped.push(stats);
                false
            }
        };
        if replaced {
            warn!("Mob skill {} has more than one row for level {}, keeping the last", row.skill_id, row.level);
        }
    }
    Ok(grouped)
}

fn mob_effect(source: &dyn SkillDataSource, row: &MobSkillEffectRow) -> Result<MobSkillEffect> {
    let summons = if row.skill_id == MOB_SKILL_SUMMON {
        source.mob_summons(row.level)?.iter().map(Summon::from).collect()
    } else {
        Vec::new()
    };
    Ok(MobSkillEffect::from_row(row, summons))
}

/// Bulk-load every player and mob skill
pub fn load_all(source: &dyn SkillDataSource) -> Result<LoadedEffects> {
    let skill_rows = source.all_skill_rows()?;
    let skills: HashMap<SkillId, SkillStats> = group_skill_rows(&skill_rows)
        .into_iter()
        .map(|stats| (stats.id(), stats))
        .collect();

    let mob_rows = source.all_mob_skill_rows()?;
    let mob_skills: HashMap<MobSkillId, MobSkillStats> = group_mob_skill_rows(source, &mob_rows)?
        .into_iter()
        .map(|stats| (stats.id(), stats))
        .collect();

    debug!(
        "Grouped {} skill rows into {} skills, {} mob skill rows into {} mob skills",
        skill_rows.len(),
        skills.len(),
        mob_rows.len(),
        mob_skills.len()
    );
    Ok(LoadedEffects { skills, mob_skills })
}

/// Load one player skill
///
/// # Returns
/// `Ok(None)` if the store has no rows for `skill`
pub fn load_skill(source: &dyn SkillDataSource, skill: SkillId) -> Result<Option<SkillStats>> {
    let rows = source.skill_rows(skill)?;
    Ok(group_skill_rows(&rows).into_iter().next())
}

/// Load one mob skill
pub fn load_mob_skill(source: &dyn SkillDataSource, skill: MobSkillId) -> Result<Option<MobSkillStats>> {
    let rows = source.mob_skill_rows(skill)?;
    Ok(group_mob_skill_rows(source, &rows)?.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SkillError;
    use mserver_storage::{Dataset, MemoryStore, SummonRow};

    fn skill_row(skill_id: SkillId, level: u8) -> SkillEffectRow {
        SkillEffectRow {
            skill_id,
            level,
            mp_con: level as i16 * 2,
            ..Default::default()
        }
    }

    fn mob_row(skill_id: MobSkillId, level: u8) -> MobSkillEffectRow {
        MobSkillEffectRow {
            skill_id,
            level,
            ..Default::default()
        }
    }

    fn store() -> MemoryStore {
        let mut data = Dataset::new();
        data.skill_effects = vec![
            skill_row(1_101_004, 1),
            skill_row(1_101_004, 2),
            skill_row(1_101_004, 3),
            skill_row(2_121_001, 1),
            skill_row(1001, 1),
        ];
        data.mob_skill_effects = vec![mob_row(100, 1), mob_row(MOB_SKILL_SUMMON, 1), mob_row(MOB_SKILL_SUMMON, 2)];
        data.mob_skill_summons = vec![
            SummonRow { level: 1, mob_index: 1, mob_id: 8_500_004 },
            SummonRow { level: 1, mob_index: 0, mob_id: 8_500_003 },
            SummonRow { level: 2, mob_index: 0, mob_id: 9_300_001 },
        ];
        MemoryStore::new(data)
    }

    #[test]
    fn test_grouping_consecutive_rows() {
        let rows = vec![skill_row(1, 1), skill_row(1, 2), skill_row(2, 1), skill_row(3, 1), skill_row(3, 2)];
        let grouped = group_skill_rows(&rows);
        let shape: Vec<(SkillId, usize)> = grouped.iter().map(|s| (s.id(), s.level_count())).collect();
        assert_eq!(shape, vec![(1, 2), (2, 1), (3, 2)]);
    }

    #[test]
    fn test_duplicate_level_keeps_last_row() {
        let mut second = skill_row(1, 1);
        second.mp_con = 40;
        let grouped = group_skill_rows(&[skill_row(1, 1), second, skill_row(1, 2)]);
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped[0].level_count(), 2);
        assert_eq!(grouped[0].level(1).unwrap().mp_consume, 40);
    }

    #[test]
    fn test_duplicate_row_does_not_sink_load_all() {
        let store = store();
        store.with_data_mut(|data| {
            data.skill_effects.push(skill_row(2_001_002, 1));
            data.skill_effects.push(skill_row(2_001_002, 1));
            data.mob_skill_effects.push(mob_row(100, 1));
        });

        let loaded = load_all(&store).unwrap();
        assert_eq!(loaded.skills[&1_101_004].level_count(), 3);
        assert_eq!(loaded.skills[&2_001_002].level_count(), 1);
        assert_eq!(loaded.skills.len(), 4);
        assert_eq!(loaded.mob_skills[&100].level_count(), 1);
    }

    #[test]
    fn test_load_skill_with_three_levels() {
        let store = store();
        let stats = load_skill(&store, 1_101_004).unwrap().unwrap();
        assert!(stats.is_buff());
        assert!(!stats.is_charged());
        assert_eq!(stats.level_count(), 3);
        let levels: Vec<u8> = stats.levels().map(|e| e.level).collect();
        assert_eq!(levels, vec![1, 2, 3]);
        assert_eq!(stats.level(3).unwrap().mp_consume, 6);
        assert_eq!(stats.max_level(), 3);
    }

    #[test]
    fn test_load_missing_skill() {
        assert!(load_skill(&store(), 42).unwrap().is_none());
    }

    #[test]
    fn test_classification_ignores_row_contents() {
        let loaded = load_all(&store()).unwrap();
        assert!(loaded.skills[&2_121_001].is_charged());
        assert!(!loaded.skills[&2_121_001].is_buff());
        assert!(loaded.skills[&1001].is_buff());
        assert_eq!(loaded.skills.len(), 3);
    }

    #[test]
    fn test_summon_skill_loads_ordered_summons() {
        let store = store();
        let stats = load_mob_skill(&store, MOB_SKILL_SUMMON).unwrap().unwrap();
        let level1: Vec<i32> = stats.level(1).unwrap().summons.iter().map(|s| s.mob_id).collect();
        assert_eq!(level1, vec![8_500_003, 8_500_004]);
        assert_eq!(stats.level(2).unwrap().summons.len(), 1);

        // Other mob skills never query summons
        let plain = load_mob_skill(&store, 100).unwrap().unwrap();
        assert!(plain.level(1).unwrap().summons.is_empty());
    }

    #[test]
    fn test_load_all_propagates_store_failure() {
        let store = store();
        store.set_offline(true);
        assert!(matches!(load_all(&store), Err(SkillError::Storage(_))));
    }
}
