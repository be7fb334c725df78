//! # Character Data Block
//!
//! The map-entry packet embeds a serialized snapshot of the character. Its
//! exact layout depends on the client build, so it sits behind
//! [`CharDataEncoder`]; [`BasicCharData`] is the layout this server ships.
//!
//! # Layout of `BasicCharData`
//!
//! ```text
//! {i32 id}{padded name 13}{stats}{i32 mesos}
//! {u8 tab count}({u8 type}{u8 count}({i16 pos}{i32 item}{i16 qty})*)*
//! {u16 skill count}({i32 id}{i32 level}{i32 master})*
//! {u16 cooldown count}({i32 skill}{i16 seconds})*
//! {u16 quest count}({i16 quest}{u8 state}{i64 completed}{u8 mobs}({i32 mob}{i16 kills})*)*
//! ```
//!
//! Collections are written in ascending key order so the block is
//! deterministic for a given character.

use mserver_protocol::{PacketWriter, Result, NAME_FIELD_WIDTH};
use mserver_storage::InventoryType;
use tokio::time::Instant;

use crate::capabilities::{Cooldownable, HasInventory};
use crate::character::Character;

pub trait CharDataEncoder: Send + Sync {
    fn encode(&self, character: &Character, w: &mut PacketWriter) -> Result<()>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BasicCharData;

impl BasicCharData {
    fn write_stats(character: &Character, w: &mut PacketWriter) {
        let s = character.stats();
        w.write_u8(s.gender)
            .write_u8(s.skin)
            .write_i32(s.face)
            .write_i32(s.hair)
            .write_u8(s.level)
            .write_i16(s.job)
            .write_i16(s.str)
            .write_i16(s.dex)
            .write_i16(s.int)
            .write_i16(s.luk)
            .write_i16(s.hp)
            .write_i16(s.max_hp)
            .write_i16(s.mp)
            .write_i16(s.max_mp)
            .write_i16(s.ap)
            .write_i16(s.sp)
            .write_i32(s.exp)
            .write_i16(s.fame)
            .write_i32(character.map())
            .write_u8(character.spawn_point());
    }

    fn write_inventory(character: &Character, w: &mut PacketWriter) -> Result<()> {
        let inventory = character.inventory();
        let tabs: Vec<_> = InventoryType::ALL
            .iter()
            .filter_map(|kind| inventory.tab(*kind).map(|tab| (*kind, tab)))
            .collect();
        w.write_count_u8("inventory tab count", tabs.len())?;
        for (kind, tab) in tabs {
            w.write_u8(kind.as_u8());
            w.write_count_u8("inventory item count", tab.len())?;
            for (position, item) in tab.iter() {
                w.write_i16(position).write_i32(item.item_id).write_i16(item.quantity);
            }
        }
        Ok(())
    }

    fn write_skills(character: &Character, w: &mut PacketWriter) -> Result<()> {
        let mut skills: Vec<_> = character.skills().iter().collect();
        skills.sort_by_key(|(id, _)| **id);
        w.write_count_u16("skill count", skills.len())?;
        for (id, entry) in skills {
            w.write_i32(*id)
                .write_i32(i32::from(entry.level))
                .write_i32(i32::from(entry.master_level));
        }

        let now = Instant::now();
        let mut cooling: Vec<_> = character
            .cooldowns
            .keys()
            .filter_map(|skill| character.cooldown_remaining(*skill, now).map(|left| (*skill, left)))
            .collect();
        cooling.sort_by_key(|(skill, _)| *skill);
        w.write_count_u16("cooldown count", cooling.len())?;
        for (skill, left) in cooling {
            let seconds = i16::try_from(left.as_secs()).unwrap_or(i16::MAX);
            w.write_i32(skill).write_i16(seconds);
        }
        Ok(())
    }

    fn write_quests(character: &Character, w: &mut PacketWriter) -> Result<()> {
        let mut quests: Vec<_> = character.quests().iter().collect();
        quests.sort_by_key(|(id, _)| **id);
        w.write_count_u16("quest count", quests.len())?;
        for (id, quest) in quests {
            w.write_i16(*id).write_u8(quest.state).write_i64(quest.completion_time);
            let mut mobs: Vec<_> = quest.mob_progress.iter().collect();
            mobs.sort_by_key(|(mob, _)| **mob);
            w.write_count_u8("quest mob count", mobs.len())?;
            for (mob, kills) in mobs {
                w.write_i32(*mob).write_i16(*kills);
            }
        }
        Ok(())
    }
}

impl CharDataEncoder for BasicCharData {
    fn encode(&self, character: &Character, w: &mut PacketWriter) -> Result<()> {
        w.write_i32(character.id().get());
        w.write_padded_string(character.name(), NAME_FIELD_WIDTH)?;
        Self::write_stats(character, w);
        w.write_i32(character.mesos());
        Self::write_inventory(character, w)?;
        Self::write_skills(character, w)?;
        Self::write_quests(character, w)?;
        Ok(())
    }
}
