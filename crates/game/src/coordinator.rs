//! # Channel Coordinator
//!
//! Interface to the other channels of the world. A real deployment forwards
//! these calls to the world server; [`LocalCoordinator`] serves a single
//! process where every channel shares one registry.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use mserver_core::{CharacterId, SkillId};
use mserver_protocol::build_buddy_channel_change;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::capabilities::HasBuddyList;
use crate::character::{ActiveBuff, Character};
use crate::registry::PlayerRegistry;

/// How long a stash waits for its character to arrive. Older stashes belong
/// to a character that went to another process, and are dropped.
pub const HANDOFF_WINDOW: Duration = Duration::from_secs(60);

/// Buff carried between channels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CarriedBuff {
    pub skill: SkillId,
    pub level: u8,
    /// `None` for buffs that last until cancelled
    pub expires_at: Option<Instant>,
}

#[derive(Debug)]
struct Stash {
    taken_at: Instant,
    buffs: Vec<CarriedBuff>,
}

#[async_trait]
pub trait ChannelCoordinator: Send + Sync {
    /// Re-apply buffs the character had on the channel it came from
    ///
    /// # Returns
    /// `true` if the character arrived from another channel (buffs or not),
    /// `false` for a fresh login
    async fn apply_buffs_from_last_channel(&self, character: &mut Character) -> bool;

    /// Park a character's buffs while it moves to another channel
    async fn stash_buffs(&self, character: &Character);

    /// Tell the character's buddies it is online on `channel` (1-based)
    async fn notify_online(&self, character: &Character, channel: u8);

    /// Tell `buddies` that `character` went offline
    async fn notify_offline(&self, character: CharacterId, buddies: &[CharacterId]);
}

/// Coordinator for channels running in one process
///
/// A stash only counts as a channel transfer while it is younger than the
/// handoff window. Stale stashes are purged whenever a new one is taken.
#[derive(Debug)]
pub struct LocalCoordinator {
    registry: PlayerRegistry,
    stashed: DashMap<CharacterId, Stash>,
    handoff_window: Duration,
}

impl LocalCoordinator {
    pub fn new(registry: PlayerRegistry) -> Self {
        Self::with_handoff_window(registry, HANDOFF_WINDOW)
    }

    pub fn with_handoff_window(registry: PlayerRegistry, handoff_window: Duration) -> Self {
        Self {
            registry,
            stashed: DashMap::new(),
            handoff_window,
        }
    }

    pub fn has_stash(&self, character: CharacterId) -> bool {
        self.stashed.contains_key(&character)
    }

    /// Drop stashes nobody came back for
    ///
    /// # Returns
    /// Number of stashes removed
    pub fn purge_stale(&self) -> usize {
        let now = Instant::now();
        let before = self.stashed.len();
        self.stashed
            .retain(|_, stash| now.duration_since(stash.taken_at) <= self.handoff_window);
        let purged = before.saturating_sub(self.stashed.len());
        if purged > 0 {
            debug!("Purged {} stale buff stashes", purged);
        }
        purged
    }

    fn presence(&self, buddy_of: CharacterId, buddies: &[CharacterId], channel: i32) -> usize {
        let frame = build_buddy_channel_change(buddy_of.get(), channel);
        buddies
            .iter()
            .filter(|buddy| self.registry.send_to(**buddy, frame.clone()))
            .count()
    }
}

#[async_trait]
impl ChannelCoordinator for LocalCoordinator {
    async fn apply_buffs_from_last_channel(&self, character: &mut Character) -> bool {
        let Some((_, stash)) = self.stashed.remove(&character.id()) else {
            return false;
        };
        let now = Instant::now();
        if now.duration_since(stash.taken_at) > self.handoff_window {
            debug!("Discarding stale buff stash of {}", character.name());
            return false;
        }

        let mut applied = 0;
        for buff in stash.buffs.iter().filter(|buff| buff.expires_at.map_or(true, |at| at > now)) {
            character.apply_buff(
                buff.skill,
                ActiveBuff {
                    level: buff.level,
                    expires_at: buff.expires_at,
                },
            );
            applied += 1;
        }
        debug!("Applied {} carried buffs to {}", applied, character.name());
        true
    }

    async fn stash_buffs(&self, character: &Character) {
        self.purge_stale();
        let now = Instant::now();
        let buffs: Vec<CarriedBuff> = character
            .buffs()
            .filter(|(_, buff)| buff.expires_at.map_or(true, |at| at > now))
            .map(|(skill, buff)| CarriedBuff {
                skill,
                level: buff.level,
                expires_at: buff.expires_at,
            })
            .collect();
        self.stashed.insert(character.id(), Stash { taken_at: now, buffs });
    }

    async fn notify_online(&self, character: &Character, channel: u8) {
        let ids = character.buddy_list().ids();
        let reached = self.presence(character.id(), &ids, i32::from(channel) - 1);
        debug!("{} online on channel {}, told {} buddies", character.name(), channel, reached);
    }

    async fn notify_offline(&self, character: CharacterId, buddies: &[CharacterId]) {
        self.presence(character, buddies, -1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::test_support::{character, dataset};
    use crate::registry::PlayerHandle;
    use crate::session::Outbound;
    use mserver_core::{OnlineState, SessionId};
    use mserver_protocol::PacketReader;

    #[tokio::test(start_paused = true)]
    async fn test_stash_then_apply() {
        let coordinator = LocalCoordinator::new(PlayerRegistry::new());
        let mut c = character();
        assert!(!coordinator.apply_buffs_from_last_channel(&mut c).await);

        let now = Instant::now();
        c.apply_buff(1_101_004, ActiveBuff { level: 3, expires_at: Some(now + Duration::from_secs(30)) });
        c.apply_buff(1_101_006, ActiveBuff { level: 1, expires_at: Some(now) });
        coordinator.stash_buffs(&c).await;
        assert!(coordinator.has_stash(c.id()));

        let mut arrived = character();
        assert!(coordinator.apply_buffs_from_last_channel(&mut arrived).await);
        assert_eq!(arrived.buff(1_101_004).unwrap().level, 3);
        assert!(arrived.buff(1_101_006).is_none());
        assert!(!coordinator.has_stash(arrived.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_transit_time_counts_against_buffs() {
        let coordinator = LocalCoordinator::new(PlayerRegistry::new());
        let mut c = character();
        let now = Instant::now();
        c.apply_buff(1_101_004, ActiveBuff { level: 3, expires_at: Some(now + Duration::from_secs(10)) });
        c.apply_buff(1_101_006, ActiveBuff { level: 2, expires_at: Some(now + Duration::from_secs(5)) });
        c.apply_buff(1_001_003, ActiveBuff { level: 1, expires_at: None });
        coordinator.stash_buffs(&c).await;

        tokio::time::advance(Duration::from_secs(8)).await;
        let mut arrived = character();
        assert!(coordinator.apply_buffs_from_last_channel(&mut arrived).await);

        let left = arrived.buff(1_101_004).unwrap().expires_at.unwrap() - Instant::now();
        assert!(left <= Duration::from_secs(2));
        // Ran out while moving
        assert!(arrived.buff(1_101_006).is_none());
        assert_eq!(arrived.buff(1_001_003).unwrap().expires_at, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_stash_is_a_fresh_login() {
        let coordinator = LocalCoordinator::new(PlayerRegistry::new());
        let mut c = character();
        c.apply_buff(1_001_003, ActiveBuff { level: 1, expires_at: None });
        coordinator.stash_buffs(&c).await;

        tokio::time::advance(HANDOFF_WINDOW + Duration::from_secs(1)).await;
        let mut relogged = character();
        assert!(!coordinator.apply_buffs_from_last_channel(&mut relogged).await);
        assert!(relogged.buff(1_001_003).is_none());
        assert!(!coordinator.has_stash(relogged.id()));
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_stash_purges_stale_ones() {
        let coordinator = LocalCoordinator::with_handoff_window(PlayerRegistry::new(), Duration::from_secs(5));
        let gone = character();
        coordinator.stash_buffs(&gone).await;
        tokio::time::advance(Duration::from_secs(6)).await;

        let mut record = dataset(0, OnlineState::Migrating).character_record(CharacterId(1)).unwrap();
        record.character.id = CharacterId(77);
        coordinator.stash_buffs(&Character::from_record(record)).await;
        assert!(!coordinator.has_stash(gone.id()));
        assert!(coordinator.has_stash(CharacterId(77)));
    }

    #[tokio::test]
    async fn test_presence_reaches_online_buddies() {
        let registry = PlayerRegistry::new();
        let (outbound, mut rx) = Outbound::channel();
        registry
            .register(PlayerHandle {
                character_id: CharacterId(2),
                name: "Pal".into(),
                session: SessionId(5),
                map: 0,
                outbound,
                buddies: vec![CharacterId(1)],
            })
            .unwrap();
        let coordinator = LocalCoordinator::new(registry);

        coordinator.notify_online(&character(), 2).await;
        let mut r = PacketReader::new(rx.try_recv().unwrap());
        r.skip(3).unwrap();
        assert_eq!(r.read_i32().unwrap(), 1);
        r.skip(1).unwrap();
        assert_eq!(r.read_i32().unwrap(), 1);

        coordinator.notify_offline(CharacterId(1), &[CharacterId(2), CharacterId(9)]).await;
        let mut r = PacketReader::new(rx.try_recv().unwrap());
        r.skip(8).unwrap();
        assert_eq!(r.read_i32().unwrap(), -1);
    }
}
