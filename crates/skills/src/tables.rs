//! Static skill classification tables
//!
//! Which skills are buffs, which must be charged before release, and which
//! read their bullet column as ammunition consumed. These are client data
//! and are kept exactly as the client knows them.

use mserver_core::{MobSkillId, SkillId};

/// GM "hide" skill, cast automatically on staff characters
pub const HIDE: SkillId = 9101004;

/// Mob skill that spawns additional monsters
pub const MOB_SKILL_SUMMON: MobSkillId = 200;

/// Skills that apply a timed effect, sorted for binary search
pub const BUFF_SKILLS: &[SkillId] = &[
    1001, // Recovery
    1002, // Nimble Feet
    1004, // Monster Riding
    1005, // Echo Of Hero
    1001003, // Iron Body
    1101004, // Sword Booster
    1101005, // Axe Booster
    1101006, // Rage
    1101007, // Power Guard
    1111002, // Combo Attack
    1111007, // Armor Crash
    1121000, // Maple Warrior
    1121002, // Power Stance
    1121010, // Enrage
    1121011, // Hero's Will
    1201004, // Sword Booster
    1201005, // Bw Booster
    1201006, // Threaten
    1201007, // Power Guard
    1211003, // Fire Charge Sword
    1211004, // Fire Charge Bw
    1211005, // Ice Charge Sword
    1211006, // Blizzard Charge Bw
    1211007, // Thunder Charge Sword
    1211008, // Lightning Charge Bw
    1211009, // Magic Crash
    1221000, // Maple Warrior
    1221002, // Power Stance
    1221003, // Holy Charge Sword
    1221004, // Divine Charge Bw
    1221012, // Hero's Will
    1301004, // Spear Booster
    1301005, // Polearm Booster
    1301006, // Iron Will
    1301007, // Hyperbody
    1311007, // Power Crash
    1311008, // Dragon Blood
    1320008, // Beholder Healing
    1320009, // Beholder Buff
    1321000, // Maple Warrior
    1321002, // Power Stance
    1321007, // Beholder
    1321010, // Hero's Will
    2001002, // Magic Guard
    2001003, // Magic Armor
    2101001, // Meditation
    2101003, // Slow
    2111004, // Seal
    2111005, // Spell Booster
    2121000, // Maple Warrior
    2121002, // Mana Reflection
    2121004, // Infinity
    2121005, // Elquines
    2121008, // Hero's Will
    2201001, // Meditation
    2201003, // Slow
    2211004, // Seal
    2211005, // Spell Booster
    2221000, // Maple Warrior
    2221002, // Mana Reflection
    2221004, // Infinity
    2221005, // Ifrit
    2221008, // Hero's Will
    2301003, // Invincible
    2301004, // Bless
    2311001, // Dispel
    2311003, // Holy Symbol
    2311005, // Doom
    2311006, // Summon Dragon
    2321000, // Maple Warrior
    2321002, // Mana Reflection
    2321003, // Bahamut
    2321004, // Infinity
    2321005, // Holy Shield
    2321009, // Hero's Will
    3001003, // Focus
    3101002, // Bow Booster
    3101004, // Soul Arrow Bow
    3111002, // Puppet
    3111005, // Silver Hawk
    3121000, // Maple Warrior
    3121002, // Sharp Eyes
    3121006, // Phoenix
    3121008, // Concentrate
    3121009, // Hero's Will
    3201002, // Crossbow Booster
    3201004, // Soul Arrow Crossbow
    3211002, // Puppet
    3211005, // Golden Eagle
    3221000, // Maple Warrior
    3221002, // Sharp Eyes
    3221005, // Frostprey
    3221006, // Blind
    3221008, // Hero's Will
    4001003, // Dark Sight
    4101003, // Claw Booster
    4101004, // Haste
    4111001, // Meso Up
    4111002, // Shadow Partner
    4121000, // Maple Warrior
    4121004, // Ninja Ambush
    4121006, // Shadow Stars
    4121009, // Hero's Will
    4201002, // Dagger Booster
    4201003, // Haste
    4211003, // Pick Pocket
    4211005, // Meso Guard
    4221000, // Maple Warrior
    4221004, // Ninja Ambush
    4221008, // Hero's Will
    5111005, // Transformation (Buccaneer)
    5121003, // Super Transformation (Viper)
    5211001, // Pirate Octopus Summon
    5211002, // Pirate Bird Summon
    5220002, // Wrath Of The Octopi
    5221006, // BattleShip
    9001000, // Haste
    9101001, // Super Haste
    9101002, // Holy Symbol
    9101003, // Bless
    9101004, // Hide
    9101008, // Hyper Body
];

/// Skills that are charged up before they are released, sorted
pub const CHARGED_SKILLS: &[SkillId] = &[
    2121001, // Big Bang
    2221001, // Big Bang
    2321001, // Big Bang
    3121004, // Hurricane
    3221001, // Piercing Arrow
    5101004, // Corkscrew Blow
    5201002, // Gernard
    5221004, // Rapid Fire
];

/// Skills whose bullet column is the number of bullets consumed per cast
pub const BULLET_CONSUME_SKILLS: &[SkillId] = &[
    4111005, // Avenger
    4121006, // Shadow Stars
    5201001, // Invisible Shot
];

#[inline]
pub fn is_buff(skill: SkillId) -> bool {
    BUFF_SKILLS.binary_search(&skill).is_ok()
}

#[inline]
pub fn is_charged(skill: SkillId) -> bool {
    CHARGED_SKILLS.binary_search(&skill).is_ok()
}

#[inline]
pub fn consumes_bullets(skill: SkillId) -> bool {
    BULLET_CONSUME_SKILLS.binary_search(&skill).is_ok()
}
