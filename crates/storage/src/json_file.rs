//! JSON file store
//!
//! Reads a whole [`Dataset`] from one JSON file at open time. Online-state
//! updates are written back through a temporary file and a rename, so a crash
//! mid-write leaves the previous file intact.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::dataset::Dataset;
use crate::error::Result;
use crate::memory::MemoryStore;
use crate::rows::*;
use crate::source::{CharacterStore, SkillDataSource};
use mserver_core::{AccountId, CharacterId, MobSkillId, OnlineState, SkillId};

/// File name looked up inside the data directory
pub const DATA_FILE_NAME: &str = "channel_data.json";

#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonFileStore {
    /// Open `data_dir/channel_data.json`
    ///
    /// # Returns
    /// `Io` if the file cannot be opened, `Corrupted` if it does not parse
    pub fn open(data_dir: &Path) -> Result<Self> {
        Self::open_file(data_dir.join(DATA_FILE_NAME))
    }

    pub fn open_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let data: Dataset = {
            let reader = BufReader::new(File::open(&path)?);
            serde_json::from_reader(reader)?
        };
        info!(
            "Loaded {} characters and {} skill rows from {:?}",
            data.characters.len(),
            data.skill_effects.len(),
            path
        );
        Ok(Self {
            path,
            inner: MemoryStore::new(data),
        })
    }

    /// Write `data` as a new store file
    pub fn create(path: impl Into<PathBuf>, data: Dataset) -> Result<Self> {
        let path = path.into();
        write_atomically(&path, &data)?;
        Ok(Self {
            path,
            inner: MemoryStore::new(data),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self) -> Result<()> {
        write_atomically(&self.path, &self.inner.snapshot())
    }
}

fn write_atomically(path: &Path, data: &Dataset) -> Result<()> {
    let tmp = path.with_extension("json.tmp");
    {
        let mut writer = BufWriter::new(File::create(&tmp)?);
        serde_json::to_writer_pretty(&mut writer, data)?;
        writer.flush()?;
    }
    fs::rename(&tmp, path)?;
    debug!("Flushed store to {:?}", path);
    Ok(())
}

impl SkillDataSource for JsonFileStore {
    fn all_skill_rows(&self) -> Result<Vec<SkillEffectRow>> {
        self.inner.all_skill_rows()
    }

    fn skill_rows(&self, skill: SkillId) -> Result<Vec<SkillEffectRow>> {
        self.inner.skill_rows(skill)
    }

    fn skill_exists(&self, skill: SkillId) -> Result<bool> {
        self.inner.skill_exists(skill)
    }

    fn all_mob_skill_rows(&self) -> Result<Vec<MobSkillEffectRow>> {
        self.inner.all_mob_skill_rows()
    }

    fn mob_skill_rows(&self, skill: MobSkillId) -> Result<Vec<MobSkillEffectRow>> {
        self.inner.mob_skill_rows(skill)
    }

    fn mob_skill_exists(&self, skill: MobSkillId) -> Result<bool> {
        self.inner.mob_skill_exists(skill)
    }

    fn mob_summons(&self, level: u8) -> Result<Vec<SummonRow>> {
        self.inner.mob_summons(level)
    }
}

impl CharacterStore for JsonFileStore {
    fn load_character(&self, id: CharacterId) -> Result<CharacterRecord> {
        self.inner.load_character(id)
    }

    fn online_state(&self, account: AccountId) -> Result<OnlineState> {
        self.inner.online_state(account)
    }

    fn set_online_state(&self, account: AccountId, state: OnlineState) -> Result<()> {
        self.inner.set_online_state(account, state)?;
        self.flush()
    }

    fn claim_in_game(&self, account: AccountId) -> Result<bool> {
        if !self.inner.claim_in_game(account)? {
            return Ok(false);
        }
        self.flush()?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StorageError;
    use tempfile::TempDir;

    fn sample() -> Dataset {
        let mut data = Dataset::new();
        data.accounts.push(AccountRow {
            id: AccountId(3),
            name: "acc3".into(),
            privilege: 3,
            online_state: OnlineState::Migrating,
        });
        data.characters.push(CharacterRow {
            id: CharacterId(30),
            account_id: AccountId(3),
            name: "Gm".into(),
            ..Default::default()
        });
        data
    }

    #[test]
    fn test_open_reads_dataset() {
        let dir = TempDir::new().unwrap();
        JsonFileStore::create(dir.path().join(DATA_FILE_NAME), sample()).unwrap();

        let store = JsonFileStore::open(dir.path()).unwrap();
        let record = store.load_character(CharacterId(30)).unwrap();
        assert_eq!(record.character.name, "Gm");
        assert_eq!(record.privilege, 3);
    }

    #[test]
    fn test_online_state_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DATA_FILE_NAME);
        let store = JsonFileStore::create(&path, sample()).unwrap();
        store.set_online_state(AccountId(3), OnlineState::InGame).unwrap();
        drop(store);

        let reopened = JsonFileStore::open_file(&path).unwrap();
        assert_eq!(reopened.online_state(AccountId(3)).unwrap(), OnlineState::InGame);
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_claim_in_game_is_flushed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(DATA_FILE_NAME);
        let store = JsonFileStore::create(&path, sample()).unwrap();
        assert!(store.claim_in_game(AccountId(3)).unwrap());
        assert!(!store.claim_in_game(AccountId(3)).unwrap());
        drop(store);

        let reopened = JsonFileStore::open_file(&path).unwrap();
        assert_eq!(reopened.online_state(AccountId(3)).unwrap(), OnlineState::InGame);
    }

    #[test]
    fn test_missing_and_corrupt_files() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(JsonFileStore::open(dir.path()), Err(StorageError::Io(_))));

        fs::write(dir.path().join(DATA_FILE_NAME), "{ not json").unwrap();
        assert!(matches!(JsonFileStore::open(dir.path()), Err(StorageError::Corrupted(_))));
    }
}
