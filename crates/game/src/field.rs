//! # Field Delegate
//!
//! Map-side collaborator: who stands on which map, where they are, and what
//! happens when they talk to an NPC. Movement paths and NPC scripts are
//! outside this crate; handlers only decode the frame header and hand the
//! rest of the cursor over.

use async_trait::async_trait;
use dashmap::DashMap;
use mserver_core::{CharacterId, Point, Result};
use mserver_protocol::PacketReader;
use tracing::debug;

use crate::character::Character;

#[async_trait]
pub trait FieldDelegate: Send + Sync {
    /// Show a character that just entered the channel on its map
    async fn spawn_player(&self, character: &Character);

    async fn remove_player(&self, character: CharacterId, map: i32);

    /// Apply a movement frame; `body` is positioned at the start position
    async fn move_player(&self, character: &mut Character, body: &mut PacketReader) -> Result<()>;

    /// Open a dialogue with the NPC whose object id is at the cursor
    async fn npc_talk(&self, character: &Character, body: &mut PacketReader) -> Result<()>;

    /// Continue an open dialogue: action byte, selection byte
    async fn npc_talk_more(&self, character: &Character, body: &mut PacketReader) -> Result<()>;
}

/// Map occupancy and last known positions, nothing more
#[derive(Debug, Default)]
pub struct BasicField {
    occupants: DashMap<CharacterId, (i32, Point)>,
}

impl BasicField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn map_of(&self, character: CharacterId) -> Option<i32> {
        self.occupants.get(&character).map(|entry| entry.0)
    }

    pub fn position_of(&self, character: CharacterId) -> Option<Point> {
        self.occupants.get(&character).map(|entry| entry.1)
    }

    pub fn population(&self, map: i32) -> usize {
        self.occupants.iter().filter(|entry| entry.0 == map).count()
    }
}

#[async_trait]
impl FieldDelegate for BasicField {
    async fn spawn_player(&self, character: &Character) {
        debug!("{} appears on map {}", character.name(), character.map());
        self.occupants.insert(character.id(), (character.map(), Point::default()));
    }

    async fn remove_player(&self, character: CharacterId, map: i32) {
        self.occupants.remove_if(&character, |_, (on, _)| *on == map);
    }

    async fn move_player(&self, character: &mut Character, body: &mut PacketReader) -> Result<()> {
        let x = body.read_i16()?;
        let y = body.read_i16()?;
        if let Some(mut entry) = self.occupants.get_mut(&character.id()) {
            entry.1 = Point::new(x, y);
        }
        Ok(())
    }

    async fn npc_talk(&self, character: &Character, body: &mut PacketReader) -> Result<()> {
        let npc = body.read_i32()?;
        debug!("{} talks to NPC object {} on map {}", character.name(), npc, character.map());
        Ok(())
    }

    async fn npc_talk_more(&self, character: &Character, body: &mut PacketReader) -> Result<()> {
        let action = body.read_u8()?;
        let selection = body.read_u8()?;
        debug!("{} continues NPC dialogue: action {} selection {}", character.name(), action, selection);
        Ok(())
    }
}
