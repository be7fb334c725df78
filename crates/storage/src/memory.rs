//! In-memory store
//!
//! Backs tests and single-process setups. It can be switched offline to
//! exercise persistence-failure paths, and counts the queries it serves.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tracing::debug;

use crate::dataset::Dataset;
use crate::error::{Result, StorageError};
use crate::rows::*;
use crate::source::{CharacterStore, SkillDataSource};
use mserver_core::{AccountId, CharacterId, MobSkillId, OnlineState, SkillId};

#[derive(Debug, Default)]
pub struct MemoryStore {
    data: RwLock<Dataset>,
    offline: AtomicBool,
    queries: AtomicUsize,
}

impl MemoryStore {
    pub fn new(data: Dataset) -> Self {
        Self {
            data: RwLock::new(data),
            offline: AtomicBool::new(false),
            queries: AtomicUsize::new(0),
        }
    }

    /// Make every following query fail with `Unavailable`
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Queries served (or refused) so far
    pub fn query_count(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }

    /// Mutate the tables in place
    pub fn with_data_mut<R>(&self, f: impl FnOnce(&mut Dataset) -> R) -> R {
        f(&mut *self.data.write())
    }

    /// Copy of the current tables
    pub fn snapshot(&self) -> Dataset {
        self.data.read().clone()
    }

    fn read<R>(&self, what: &str, f: impl FnOnce(&Dataset) -> R) -> Result<R> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!("{} query refused", what)));
        }
        debug!("store query: {}", what);
        Ok(f(&*self.data.read()))
    }

    fn write<R>(&self, what: &str, f: impl FnOnce(&mut Dataset) -> Result<R>) -> Result<R> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        if self.offline.load(Ordering::SeqCst) {
            return Err(StorageError::Unavailable(format!("{} update refused", what)));
        }
        f(&mut *self.data.write())
    }
}

impl SkillDataSource for MemoryStore {
    fn all_skill_rows(&self) -> Result<Vec<SkillEffectRow>> {
        self.read("skilldata", Dataset::all_skill_rows)
    }

    fn skill_rows(&self, skill: SkillId) -> Result<Vec<SkillEffectRow>> {
        self.read("skilldata by id", |d| d.skill_rows(skill))
    }

    fn skill_exists(&self, skill: SkillId) -> Result<bool> {
        self.read("skilldata exists", |d| d.skill_exists(skill))
    }

    fn all_mob_skill_rows(&self) -> Result<Vec<MobSkillEffectRow>> {
        self.read("mobskills", Dataset::all_mob_skill_rows)
    }

    fn mob_skill_rows(&self, skill: MobSkillId) -> Result<Vec<MobSkillEffectRow>> {
        self.read("mobskills by id", |d| d.mob_skill_rows(skill))
    }

    fn mob_skill_exists(&self, skill: MobSkillId) -> Result<bool> {
        self.read("mobskills exists", |d| d.mob_skill_exists(skill))
    }

    fn mob_summons(&self, level: u8) -> Result<Vec<SummonRow>> {
        self.read("mobskillsummons", |d| d.mob_summons(level))
    }
}

impl CharacterStore for MemoryStore {
    fn load_character(&self, id: CharacterId) -> Result<CharacterRecord> {
        self.read("characters", |d| d.character_record(id))?
    }

    fn online_state(&self, account: AccountId) -> Result<OnlineState> {
        self.read("accounts", |d| d.online_state(account))?
    }

    fn set_online_state(&self, account: AccountId, state: OnlineState) -> Result<()> {
        self.write("accounts", |d| d.set_online_state(account, state))
    }

    fn claim_in_game(&self, account: AccountId) -> Result<bool> {
        self.write("accounts claim", |d| d.claim_in_game(account))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        let mut data = Dataset::new();
        data.accounts.push(AccountRow {
            id: AccountId(1),
            name: "acc".into(),
            privilege: 0,
            online_state: OnlineState::LoggedIn,
        });
        data.skill_effects.push(SkillEffectRow { skill_id: 1001, level: 1, ..Default::default() });
        MemoryStore::new(data)
    }

    #[test]
    fn test_offline_store_refuses_queries() {
        let store = store();
        assert!(store.skill_exists(1001).unwrap());

        store.set_offline(true);
        assert!(matches!(store.skill_exists(1001), Err(StorageError::Unavailable(_))));
        assert!(store.set_online_state(AccountId(1), OnlineState::InGame).is_err());

        store.set_offline(false);
        assert_eq!(store.online_state(AccountId(1)).unwrap(), OnlineState::LoggedIn);
        assert_eq!(store.query_count(), 4);
    }

    #[test]
    fn test_online_state_write() {
        let store = store();
        store.set_online_state(AccountId(1), OnlineState::Migrating).unwrap();
        assert_eq!(store.online_state(AccountId(1)).unwrap(), OnlineState::Migrating);
    }

    #[test]
    fn test_concurrent_claims_admit_one() {
        let store = std::sync::Arc::new(store());
        store.set_online_state(AccountId(1), OnlineState::Migrating).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.claim_in_game(AccountId(1)).unwrap())
            })
            .collect();
        let winners = handles.into_iter().filter_map(|h| h.join().ok()).filter(|won| *won).count();
        assert_eq!(winners, 1);
        assert_eq!(store.online_state(AccountId(1)).unwrap(), OnlineState::InGame);
    }
}
