//! # Character Capabilities
//!
//! Narrow views over a [`Character`]. Code that only needs one facet (a buddy
//! service, an item handler, the cooldown bookkeeping) takes the trait rather
//! than the whole character, so other server kinds can provide their own
//! implementors.

use mserver_core::SkillId;
use tokio::time::{Duration, Instant};

use crate::buddy::BuddyList;
use crate::character::Character;
use crate::inventory::Inventory;

pub trait HasBuddyList {
    fn buddy_list(&self) -> &BuddyList;
    fn buddy_list_mut(&mut self) -> &mut BuddyList;
}

pub trait HasInventory {
    fn inventory(&self) -> &Inventory;
    fn inventory_mut(&mut self) -> &mut Inventory;
    fn mesos(&self) -> i32;

    /// Add `delta` mesos; fails without changing anything on overflow or if
    /// the balance would go negative
    fn gain_mesos(&mut self, delta: i32) -> bool;
}

/// Per-skill cooldown bookkeeping kept on the character
///
/// Timers live in [`crate::CooldownManager`]; this is the character's own
/// view of which skills are unusable and until when.
pub trait Cooldownable {
    fn add_cooldown(&mut self, skill: SkillId, until: Instant);

    /// Returns `true` if the skill had a cooldown
    fn remove_cooldown(&mut self, skill: SkillId) -> bool;

    fn cooldown_remaining(&self, skill: SkillId, now: Instant) -> Option<Duration>;

    fn is_cooling_down(&self, skill: SkillId, now: Instant) -> bool {
        self.cooldown_remaining(skill, now).is_some()
    }
}

impl HasBuddyList for Character {
    fn buddy_list(&self) -> &BuddyList {
        &self.buddies
    }

    fn buddy_list_mut(&mut self) -> &mut BuddyList {
        &mut self.buddies
    }
}

impl HasInventory for Character {
    fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    fn inventory_mut(&mut self) -> &mut Inventory {
        &mut self.inventory
    }

    fn mesos(&self) -> i32 {
        self.mesos
    }

    fn gain_mesos(&mut self, delta: i32) -> bool {
        match self.mesos.checked_add(delta) {
            Some(total) if total >= 0 => {
                self.mesos = total;
                true
            }
            _ => false,
        }
    }
}

impl Cooldownable for Character {
    fn add_cooldown(&mut self, skill: SkillId, until: Instant) {
        self.cooldowns.insert(skill, until);
    }

    fn remove_cooldown(&mut self, skill: SkillId) -> bool {
        self.cooldowns.remove(&skill).is_some()
    }

    fn cooldown_remaining(&self, skill: SkillId, now: Instant) -> Option<Duration> {
        self.cooldowns
            .get(&skill)
            .filter(|until| **until > now)
            .map(|until| *until - now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::test_support::character;

    #[test]
    fn test_mesos_never_negative() {
        let mut c = character();
        assert_eq!(c.mesos(), 1234);
        assert!(c.gain_mesos(-1234));
        assert_eq!(c.mesos(), 0);
        assert!(!c.gain_mesos(-1));
        assert_eq!(c.mesos(), 0);
        assert!(c.gain_mesos(i32::MAX));
        assert!(!c.gain_mesos(1));
    }

    #[test]
    fn test_cooldown_bookkeeping() {
        let mut c = character();
        let now = Instant::now();
        c.add_cooldown(5, now + Duration::from_secs(3));
        assert_eq!(c.cooldown_remaining(5, now), Some(Duration::from_secs(3)));
        assert!(!c.is_cooling_down(5, now + Duration::from_secs(3)));
        assert!(c.remove_cooldown(5));
        assert!(!c.remove_cooldown(5));
    }

    #[test]
    fn test_buddy_view() {
        let mut c = character();
        assert_eq!(c.buddy_list().len(), 1);
        assert_eq!(c.buddy_list().invites().len(), 1);
        c.buddy_list_mut().set_channel(mserver_core::CharacterId(2), Some(1));
        assert_eq!(c.buddy_list().entries()[0].channel, 0);
    }
}
