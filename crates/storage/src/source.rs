//! Persistence collaborator interfaces
//!
//! Both traits are synchronous: implementations may block on I/O, so async
//! callers run them through `tokio::task::spawn_blocking`.

use crate::error::Result;
use crate::rows::{CharacterRecord, MobSkillEffectRow, SkillEffectRow, SummonRow};
use mserver_core::{AccountId, CharacterId, MobSkillId, OnlineState, SkillId};

/// Source of skill effect rows
pub trait SkillDataSource: Send + Sync {
    /// Every player skill row, ordered by skill id then level
    fn all_skill_rows(&self) -> Result<Vec<SkillEffectRow>>;

    /// Rows of one player skill, ordered by level
    fn skill_rows(&self, skill: SkillId) -> Result<Vec<SkillEffectRow>>;

    /// Whether any row exists for `skill`
    fn skill_exists(&self, skill: SkillId) -> Result<bool>;

    /// Every mob skill row, ordered by skill id then level
    fn all_mob_skill_rows(&self) -> Result<Vec<MobSkillEffectRow>>;

    fn mob_skill_rows(&self, skill: MobSkillId) -> Result<Vec<MobSkillEffectRow>>;

    fn mob_skill_exists(&self, skill: MobSkillId) -> Result<bool>;

    /// Summons for the summon mob skill at `level`, ordered by slot index
    fn mob_summons(&self, level: u8) -> Result<Vec<SummonRow>>;
}

/// Character and account state store
pub trait CharacterStore: Send + Sync {
    /// Load a character with all of its owned rows
    ///
    /// # Returns
    /// `StorageError::NotFound` if there is no character with `id`
    fn load_character(&self, id: CharacterId) -> Result<CharacterRecord>;

    /// Persisted online state of an account
    fn online_state(&self, account: AccountId) -> Result<OnlineState>;

    fn set_online_state(&self, account: AccountId, state: OnlineState) -> Result<()>;

    /// Move an account from `Migrating` to `InGame` in one step
    ///
    /// Two servers admitting the same account race on this call, and only
    /// one of them sees `true`. A database-backed store does this with a
    /// conditional update.
    ///
    /// # Returns
    /// `false` (state untouched) if the account was not `Migrating`
    fn claim_in_game(&self, account: AccountId) -> Result<bool>;
}
