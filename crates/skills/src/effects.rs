//! Per-level effect records
//!
//! One record per (skill, level). Records are built once from storage rows and
//! shared read-only behind `Arc` afterwards.

use mserver_core::{Hitbox, Point, SkillId};
use mserver_storage::{MobSkillEffectRow, SkillEffectRow, SummonRow};

use tracing::warn;

use crate::tables;

/// How a skill uses ammunition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ammunition {
    /// Projectiles fired per cast (at least 1)
    PerCast(u8),
    /// Bullets removed from the stack per cast
    Consumed(i16),
}

/// Numeric parameters of one player skill at one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerSkillEffect {
    pub skill_id: SkillId,
    pub level: u8,
    pub mp_consume: i16,
    pub hp_consume: i16,
    /// Milliseconds
    pub duration: i32,
    pub x: i32,
    pub y: i32,
    pub damage: i16,
    pub hitbox: Hitbox,
    pub mob_count: u8,
    pub prop: i16,
    /// Seconds before the skill can be cast again
    pub cooltime: i16,
    pub watk: i16,
    pub wdef: i16,
    pub matk: i16,
    pub mdef: i16,
    pub acc: i16,
    pub avoid: i16,
    pub hp_recover_rate: i16,
    pub mp_recover_rate: i16,
    pub speed: i16,
    pub jump: i16,
    pub attack_count: u8,
    pub ammunition: Ammunition,
    pub item_consume: i32,
    pub item_consume_count: u8,
    pub money_consume: i16,
    pub morph: i32,
}

impl PlayerSkillEffect {
    pub fn from_row(row: &SkillEffectRow) -> Self {
        let ammunition = if tables::consumes_bullets(row.skill_id) {
            Ammunition::Consumed(row.bullet)
        } else {
            Ammunition::PerCast(per_cast(row))
        };

        Self {
            skill_id: row.skill_id,
            level: row.level,
            mp_consume: row.mp_con,
            hp_consume: row.hp_con,
            duration: row.duration,
            x: row.x,
            y: row.y,
            damage: row.damage,
            hitbox: Hitbox::new(Point::new(row.lt_x, row.lt_y), Point::new(row.rb_x, row.rb_y)),
            mob_count: row.mob_count,
            prop: row.prop,
            cooltime: row.cooltime,
            watk: row.watk,
            wdef: row.wdef,
            matk: row.matk,
            mdef: row.mdef,
            acc: row.acc,
            avoid: row.avoid,
            hp_recover_rate: row.hp_r,
            mp_recover_rate: row.mp_r,
            speed: row.speed,
            jump: row.jump,
            attack_count: row.attack_count,
            ammunition,
            item_consume: row.item_con,
            item_consume_count: row.item_con_count,
            money_consume: row.money_con,
            morph: row.morph,
        }
    }

    /// Projectiles per cast, 0 for consuming skills
    pub fn bullet_count(&self) -> u8 {
        match self.ammunition {
            Ammunition::PerCast(n) => n,
            Ammunition::Consumed(_) => 0,
        }
    }

    /// Bullets removed per cast, 0 for counting skills
    pub fn bullet_consume(&self) -> i16 {
        match self.ammunition {
            Ammunition::Consumed(n) => n,
            Ammunition::PerCast(_) => 0,
        }
    }
}

/// A monster spawned by a summon skill
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Summon {
    pub slot: u8,
    pub mob_id: i32,
}

impl From<&SummonRow> for Summon {
    fn from(row: &SummonRow) -> Self {
        Self {
            slot: row.mob_index,
            mob_id: row.mob_id,
        }
    }
}

/// Numeric parameters of one mob skill at one level
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MobSkillEffect {
    pub level: u8,
    pub mp_consume: i16,
    pub duration: i32,
    pub x: i32,
    pub y: i32,
    pub hitbox: Hitbox,
    pub prop: i16,
    pub cooltime: i16,
    pub max_hp_percent: i16,
    pub limit: i16,
    pub summon_effect: u8,
    /// Ordered by slot; empty unless this is the summon skill
    pub summons: Vec<Summon>,
}

impl MobSkillEffect {
    pub fn from_row(row: &MobSkillEffectRow, summons: Vec<Summon>) -> Self {
        Self {
            level: row.level,
            mp_consume: row.mp_con,
            duration: row.duration,
            x: row.x,
            y: row.y,
            hitbox: Hitbox::new(Point::new(row.lt_x, row.lt_y), Point::new(row.rb_x, row.rb_y)),
            prop: row.prop,
            cooltime: row.cooltime,
            max_hp_percent: row.max_hp_percent,
            limit: row.limit,
            summon_effect: row.summon_effect,
            summons,
        }
    }
}

/// Projectiles per cast, at least one; out-of-range counts are clamped
fn per_cast(row: &SkillEffectRow) -> u8 {
    match u8::try_from(row.bullet) {
        Ok(0) => 1,
        Ok(count) => count,
        Err(_) => {
            let clamped = row.bullet.clamp(1, i16::from(u8::MAX)) as u8;
            warn!(
                "Skill {} level {} has bullet count {}, using {}",
                row.skill_id, row.level, row.bullet, clamped
            );
            clamped
        }
    }
}
