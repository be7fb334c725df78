//! # Cooldown Manager
//!
//! Channel-wide table of active skill cooldowns, one timer task per
//! (character, skill) pair.
//!
//! # Exactly-once expiry
//!
//! Every entry carries a generation number. The timer only notifies if it
//! removes the entry with its own generation, and [`CooldownManager::remove`]
//! only suppresses the notification if it removes the entry before the
//! deadline. Both paths take the key's shard lock, so exactly one of them
//! wins:
//!
//! - `remove` before the deadline: entry gone, timer aborted, no event
//! - timer first: entry gone, one event, a later `remove` returns `false`
//! - `remove` at or after the deadline but before the timer ran: `remove`
//!   posts the event itself and the timer finds nothing to remove
//!
//! Replacing an entry aborts the old timer; a timer that already woke finds a
//! different generation and stays silent.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use mserver_core::{CharacterId, SkillId};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{Duration, Instant};
use tracing::debug;

use crate::session::SessionEvent;

type Key = (CharacterId, SkillId);

/// How a cancelled cooldown ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cancelled {
    Early,
    Expired,
}

struct CooldownEntry {
    generation: u64,
    expires_at: Instant,
    timer: JoinHandle<()>,
    notify: UnboundedSender<SessionEvent>,
}

/// Active cooldowns of every character on the channel
///
/// Cheap to clone; clones share the same table.
#[derive(Clone, Default)]
pub struct CooldownManager {
    entries: Arc<DashMap<Key, CooldownEntry>>,
    generation: Arc<AtomicU64>,
}

impl CooldownManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a cooldown, replacing any existing one for the pair
    ///
    /// # Arguments
    /// * `notify` - Event queue of the owning session; receives
    ///   [`SessionEvent::CooldownExpired`] once the cooldown ends
    ///
    /// Must be called from within a tokio runtime.
    pub fn add(&self, character: CharacterId, skill: SkillId, duration: Duration, notify: UnboundedSender<SessionEvent>) {
        let key = (character, skill);
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let expires_at = Instant::now() + duration;

        // Hold the shard lock while spawning so the timer cannot observe the
        // table before its own entry is in place
        match self.entries.entry(key) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                let timer = self.spawn_timer(key, generation, expires_at);
                let old = occupied.insert(CooldownEntry {
                    generation,
                    expires_at,
                    timer,
                    notify,
                });
                old.timer.abort();
                debug!("Cooldown {} for {} replaced", skill, character);
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                let timer = self.spawn_timer(key, generation, expires_at);
                vacant.insert(CooldownEntry {
                    generation,
                    expires_at,
                    timer,
                    notify,
                });
            }
        }
    }

    fn spawn_timer(&self, key: Key, generation: u64, expires_at: Instant) -> JoinHandle<()> {
        let entries = Arc::clone(&self.entries);
        tokio::spawn(async move {
            tokio::time::sleep_until(expires_at).await;
            if let Some((_, entry)) = entries.remove_if(&key, |_, e| e.generation == generation) {
                debug!("Cooldown {} for {} expired", key.1, key.0);
                let _ = entry.notify.send(SessionEvent::CooldownExpired { skill: key.1 });
            }
        })
    }

    /// Cancel a cooldown
    ///
    /// # Returns
    /// `false` if the pair had no active cooldown. If the deadline has
    /// already passed the expiry event is posted here instead of by the timer.
    pub fn remove(&self, character: CharacterId, skill: SkillId) -> bool {
        self.cancel(character, skill).is_some()
    }

    /// Cancel a cooldown, reporting whether it beat its deadline
    ///
    /// # Returns
    /// - `None` if the pair had no active cooldown
    /// - `Some(Cancelled::Early)` if it was removed before the deadline; no
    ///   event is posted, so telling the client is up to the caller
    /// - `Some(Cancelled::Expired)` if the deadline had passed; the expiry
    ///   event is posted here
    pub fn cancel(&self, character: CharacterId, skill: SkillId) -> Option<Cancelled> {
        let (_, entry) = self.entries.remove(&(character, skill))?;
        entry.timer.abort();
        if entry.expires_at <= Instant::now() {
            let _ = entry.notify.send(SessionEvent::CooldownExpired { skill });
            return Some(Cancelled::Expired);
        }
        Some(Cancelled::Early)
    }

    /// Drop every cooldown of `character` without notifying
    ///
    /// # Returns
    /// How many were cancelled
    pub fn cancel_all(&self, character: CharacterId) -> usize {
        let mut cancelled = 0;
        self.entries.retain(|(owner, _), entry| {
            if *owner == character {
                entry.timer.abort();
                cancelled += 1;
                false
            } else {
                true
            }
        });
        if cancelled > 0 {
            debug!("Cancelled {} cooldowns of {}", cancelled, character);
        }
        cancelled
    }

    /// Time left on a cooldown, `None` if it is not active
    pub fn remaining(&self, character: CharacterId, skill: SkillId) -> Option<Duration> {
        let entry = self.entries.get(&(character, skill))?;
        Some(entry.expires_at.saturating_duration_since(Instant::now()))
    }

    pub fn is_active(&self, character: CharacterId, skill: SkillId) -> bool {
        self.entries.contains_key(&(character, skill))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
