//! # Player Registry
//!
//! Channel-wide map of characters currently in game.
//!
//! # Thread Safety
//! Backed by a `DashMap`: registration of one character id is atomic with
//! respect to every other registration, and readers never see a
//! half-inserted handle.

use std::sync::Arc;

use bytes::Bytes;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use mserver_core::{CharacterId, Result, ServerError, SessionId};
use tracing::debug;

use crate::session::Outbound;

/// What the rest of the channel may know about an in-game character
#[derive(Debug, Clone)]
pub struct PlayerHandle {
    pub character_id: CharacterId,
    pub name: String,
    pub session: SessionId,
    pub map: i32,
    pub outbound: Outbound,
    /// Accepted buddies, for presence updates
    pub buddies: Vec<CharacterId>,
}

/// Player registry
///
/// Cheap to clone; clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct PlayerRegistry {
    players: Arc<DashMap<CharacterId, PlayerHandle>>,
}

impl PlayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the slot for a character
    ///
    /// # Returns
    /// `DoubleLogin` if the character is already registered; the existing
    /// handle is left untouched
    pub fn register(&self, handle: PlayerHandle) -> Result<()> {
        match self.players.entry(handle.character_id) {
            Entry::Occupied(existing) => Err(ServerError::DoubleLogin {
                character: *existing.key(),
            }),
            Entry::Vacant(slot) => {
                debug!("Registering {} ({}) for session {}", handle.name, handle.character_id, handle.session);
                slot.insert(handle);
                Ok(())
            }
        }
    }

    /// Release the slot, but only if `session` still owns it
    pub fn deregister(&self, character: CharacterId, session: SessionId) -> Option<PlayerHandle> {
        let removed = self.players.remove_if(&character, |_, h| h.session == session);
        if removed.is_some() {
            debug!("Deregistered {} (session {})", character, session);
        }
        removed.map(|(_, handle)| handle)
    }

    pub fn get(&self, character: CharacterId) -> Option<PlayerHandle> {
        self.players.get(&character).map(|entry| entry.clone())
    }

    pub fn contains(&self, character: CharacterId) -> bool {
        self.players.contains_key(&character)
    }

    /// Update the map a character is on
    pub fn set_map(&self, character: CharacterId, map: i32) -> bool {
        match self.players.get_mut(&character) {
            Some(mut handle) => {
                handle.map = map;
                true
            }
            None => false,
        }
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn online_ids(&self) -> Vec<CharacterId> {
        self.players.iter().map(|entry| *entry.key()).collect()
    }

    /// Send a frame to one character
    ///
    /// # Returns
    /// `false` if the character is not here or its connection is gone
    pub fn send_to(&self, character: CharacterId, frame: Bytes) -> bool {
        self.players
            .get(&character)
            .map(|handle| handle.outbound.send(frame))
            .unwrap_or(false)
    }

    /// Send a frame to everyone on the channel
    pub fn broadcast(&self, frame: &Bytes) -> usize {
        self.players
            .iter()
            .filter(|handle| handle.outbound.send(frame.clone()))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(id: i32, session: u32) -> (PlayerHandle, tokio::sync::mpsc::UnboundedReceiver<Bytes>) {
        let (outbound, rx) = Outbound::channel();
        let handle = PlayerHandle {
            character_id: CharacterId(id),
            name: format!("P{}", id),
            session: SessionId(session),
            map: 0,
            outbound,
            buddies: Vec::new(),
        };
        (handle, rx)
    }

    #[test]
    fn test_second_registration_rejected() {
        let registry = PlayerRegistry::new();
        let (first, _rx1) = handle(1, 10);
        let (second, _rx2) = handle(1, 11);
        registry.register(first).unwrap();
        assert!(matches!(registry.register(second), Err(ServerError::DoubleLogin { .. })));
        assert_eq!(registry.get(CharacterId(1)).unwrap().session, SessionId(10));
        assert_eq!(registry.player_count(), 1);
    }

    #[test]
    fn test_deregister_requires_owning_session() {
        let registry = PlayerRegistry::new();
        let (h, _rx) = handle(1, 10);
        registry.register(h).unwrap();

        assert!(registry.deregister(CharacterId(1), SessionId(99)).is_none());
        assert!(registry.contains(CharacterId(1)));
        assert!(registry.deregister(CharacterId(1), SessionId(10)).is_some());
        assert!(!registry.contains(CharacterId(1)));
    }

    #[test]
    fn test_send_and_broadcast() {
        let registry = PlayerRegistry::new();
        let (a, mut rx_a) = handle(1, 10);
        let (b, rx_b) = handle(2, 11);
        registry.register(a).unwrap();
        registry.register(b).unwrap();
        drop(rx_b);

        assert!(registry.send_to(CharacterId(1), Bytes::from_static(&[1])));
        assert!(!registry.send_to(CharacterId(2), Bytes::from_static(&[1])));
        assert!(!registry.send_to(CharacterId(3), Bytes::from_static(&[1])));
        assert_eq!(registry.broadcast(&Bytes::from_static(&[2])), 1);
        assert_eq!(rx_a.try_recv().unwrap(), Bytes::from_static(&[1]));
        assert_eq!(rx_a.try_recv().unwrap(), Bytes::from_static(&[2]));

        let mut ids = registry.online_ids();
        ids.sort();
        assert_eq!(ids, vec![CharacterId(1), CharacterId(2)]);
        assert!(registry.set_map(CharacterId(2), 5));
        assert_eq!(registry.get(CharacterId(2)).unwrap().map, 5);
    }
}
