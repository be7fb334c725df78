//! Buddy lists

use std::collections::BTreeMap;

use mserver_core::CharacterId;
use mserver_protocol::BuddyEntry;
use mserver_storage::BuddyRow;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Buddy {
    pub id: CharacterId,
    pub name: String,
    /// 1-based channel the buddy is on, `None` while offline
    pub channel: Option<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyList {
    capacity: u8,
    buddies: BTreeMap<CharacterId, Buddy>,
    /// Requests waiting for an answer, in arrival order
    invites: Vec<(CharacterId, String)>,
}

impl BuddyList {
    pub fn new(capacity: u8) -> Self {
        Self {
            capacity,
            buddies: BTreeMap::new(),
            invites: Vec::new(),
        }
    }

    pub fn from_rows(capacity: u8, rows: &[BuddyRow]) -> Self {
        let mut list = Self::new(capacity);
        for row in rows {
            if row.pending {
                list.invites.push((row.buddy_id, row.buddy_name.clone()));
            } else {
                list.buddies.insert(
                    row.buddy_id,
                    Buddy {
                        id: row.buddy_id,
                        name: row.buddy_name.clone(),
                        channel: None,
                    },
                );
            }
        }
        list
    }

    pub fn capacity(&self) -> u8 {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.buddies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buddies.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buddies.len() >= self.capacity as usize
    }

    pub fn get(&self, id: CharacterId) -> Option<&Buddy> {
        self.buddies.get(&id)
    }

    pub fn ids(&self) -> Vec<CharacterId> {
        self.buddies.keys().copied().collect()
    }

    pub fn invites(&self) -> &[(CharacterId, String)] {
        &self.invites
    }

    /// Record where a buddy is; returns `false` if `id` is not on the list
    pub fn set_channel(&mut self, id: CharacterId, channel: Option<u8>) -> bool {
        match self.buddies.get_mut(&id) {
            Some(buddy) => {
                buddy.channel = channel;
                true
            }
            None => false,
        }
    }

    /// Rows as the client displays them
    pub fn entries(&self) -> Vec<BuddyEntry> {
        self.buddies
            .values()
            .map(|b| BuddyEntry {
                character_id: b.id.get(),
                name: b.name.clone(),
                channel: b.channel.map_or(-1, |c| i32::from(c) - 1),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i32, name: &str, pending: bool) -> BuddyRow {
        BuddyRow {
            owner: CharacterId(1),
            buddy_id: CharacterId(id),
            buddy_name: name.into(),
            pending,
        }
    }

    #[test]
    fn test_rows_split_into_buddies_and_invites() {
        let list = BuddyList::from_rows(2, &[row(2, "Ann", false), row(3, "Bo", true), row(4, "Cy", false)]);
        assert_eq!(list.len(), 2);
        assert!(list.is_full());
        assert_eq!(list.invites(), &[(CharacterId(3), "Bo".to_string())]);
    }

    #[test]
    fn test_entries_report_channel() {
        let mut list = BuddyList::from_rows(20, &[row(2, "Ann", false)]);
        assert_eq!(list.entries()[0].channel, -1);
        assert!(list.set_channel(CharacterId(2), Some(3)));
        assert_eq!(list.entries()[0].channel, 2);
        assert!(!list.set_channel(CharacterId(9), Some(1)));
    }
}
