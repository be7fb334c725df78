//! In-process table set
//!
//! [`Dataset`] holds every table as a plain row vector and answers the
//! queries the channel issues. Both stores in this crate are thin wrappers
//! around it.

use serde::{Deserialize, Serialize};

use crate::error::{Result, StorageError};
use crate::rows::*;
use mserver_core::{AccountId, CharacterId, MobSkillId, OnlineState, SkillId};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Dataset {
    pub accounts: Vec<AccountRow>,
    pub characters: Vec<CharacterRow>,
    pub inventory_items: Vec<InventoryItemRow>,
    pub skills: Vec<SkillEntryRow>,
    pub cooldowns: Vec<CooldownRow>,
    pub quest_statuses: Vec<QuestStatusRow>,
    pub quest_mob_progress: Vec<QuestMobProgressRow>,
    pub keymaps: Vec<KeyBindingRow>,
    pub skill_macros: Vec<SkillMacroRow>,
    pub buddies: Vec<BuddyRow>,
    pub skill_effects: Vec<SkillEffectRow>,
    pub mob_skill_effects: Vec<MobSkillEffectRow>,
    pub mob_skill_summons: Vec<SummonRow>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// Character row joined with its account, plus every owned row
    pub fn character_record(&self, id: CharacterId) -> Result<CharacterRecord> {
        let character = self
            .characters
            .iter()
            .find(|c| c.id == id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("character {}", id)))?;

        let account_id = character.account_id;
        let account = self.accounts.iter().find(|a| a.id == account_id);

        // Character-held partitions plus the account-wide cash shop
        let inventory = self
            .inventory_items
            .iter()
            .filter(|item| {
                (item.character_id == id && item.inventory_type <= InventoryType::Cash)
                    || (item.account_id == account_id && item.inventory_type == InventoryType::CashShop)
            })
            .cloned()
            .collect();

        let quests = self
            .quest_statuses
            .iter()
            .filter(|q| q.character_id == id)
            .map(|status| QuestRecord {
                mob_progress: self
                    .quest_mob_progress
                    .iter()
                    .filter(|p| p.quest_status_id == status.id)
                    .cloned()
                    .collect(),
                status: status.clone(),
            })
            .collect();

        let mut macros: Vec<SkillMacroRow> = self
            .skill_macros
            .iter()
            .filter(|m| m.character_id == id)
            .cloned()
            .collect();
        macros.sort_by_key(|m| m.position);

        Ok(CharacterRecord {
            account_name: account.map(|a| a.name.clone()).unwrap_or_default(),
            privilege: account.map(|a| a.privilege).unwrap_or(0),
            inventory,
            skills: owned_by(&self.skills, |r| r.character_id == id),
            cooldowns: owned_by(&self.cooldowns, |r| r.character_id == id),
            quests,
            keymap: owned_by(&self.keymaps, |r| r.character_id == id),
            macros,
            buddies: owned_by(&self.buddies, |r| r.owner == id),
            character,
        })
    }

    pub fn online_state(&self, account: AccountId) -> Result<OnlineState> {
        self.accounts
            .iter()
            .find(|a| a.id == account)
            .map(|a| a.online_state)
            .ok_or_else(|| StorageError::NotFound(format!("account {}", account)))
    }

    pub fn set_online_state(&mut self, account: AccountId, state: OnlineState) -> Result<()> {
        let row = self
            .accounts
            .iter_mut()
            .find(|a| a.id == account)
            .ok_or_else(|| StorageError::NotFound(format!("account {}", account)))?;
        row.online_state = state;
        Ok(())
    }

    /// Set `InGame` only if the account is `Migrating`
    pub fn claim_in_game(&mut self, account: AccountId) -> Result<bool> {
        let row = self
            .accounts
            .iter_mut()
            .find(|a| a.id == account)
            .ok_or_else(|| StorageError::NotFound(format!("account {}", account)))?;
        if row.online_state != OnlineState::Migrating {
            return Ok(false);
        }
        row.online_state = OnlineState::InGame;
        Ok(true)
    }

    pub fn all_skill_rows(&self) -> Vec<SkillEffectRow> {
        let mut rows = self.skill_effects.clone();
        rows.sort_by_key(|r| (r.skill_id, r.level));
        rows
    }

    pub fn skill_rows(&self, skill: SkillId) -> Vec<SkillEffectRow> {
        let mut rows = owned_by(&self.skill_effects, |r| r.skill_id == skill);
        rows.sort_by_key(|r| r.level);
        rows
    }

    pub fn skill_exists(&self, skill: SkillId) -> bool {
        self.skill_effects.iter().any(|r| r.skill_id == skill)
    }

    pub fn all_mob_skill_rows(&self) -> Vec<MobSkillEffectRow> {
        let mut rows = self.mob_skill_effects.clone();
        rows.sort_by_key(|r| (r.skill_id, r.level));
        rows
    }

    pub fn mob_skill_rows(&self, skill: MobSkillId) -> Vec<MobSkillEffectRow> {
        let mut rows = owned_by(&self.mob_skill_effects, |r| r.skill_id == skill);
        rows.sort_by_key(|r| r.level);
        rows
    }

    pub fn mob_skill_exists(&self, skill: MobSkillId) -> bool {
        self.mob_skill_effects.iter().any(|r| r.skill_id == skill)
    }

    pub fn mob_summons(&self, level: u8) -> Vec<SummonRow> {
        let mut rows = owned_by(&self.mob_skill_summons, |r| r.level == level);
        rows.sort_by_key(|r| r.mob_index);
        rows
    }
}

fn owned_by<T: Clone>(rows: &[T], pred: impl Fn(&T) -> bool) -> Vec<T> {
    rows.iter().filter(|r| pred(r)).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(cid: i32, aid: i32, inv: InventoryType, item_id: i32) -> InventoryItemRow {
        InventoryItemRow {
            character_id: CharacterId(cid),
            account_id: AccountId(aid),
            inventory_type: inv,
            position: 1,
            item_id,
            quantity: 1,
        }
    }

    fn dataset() -> Dataset {
        let mut data = Dataset::new();
        data.accounts.push(AccountRow {
            id: AccountId(10),
            name: "hero_account".into(),
            privilege: 0,
            online_state: OnlineState::Migrating,
        });
        data.characters.push(CharacterRow {
            id: CharacterId(1),
            account_id: AccountId(10),
            name: "Hero".into(),
            ..Default::default()
        });
        data
    }

    #[test]
    fn test_cash_shop_union_rule() {
        let mut data = dataset();
        data.inventory_items = vec![
            item(1, 10, InventoryType::Equip, 1_302_000),
            item(1, 10, InventoryType::Cash, 5_000_000),
            // Own cash-shop row
            item(1, 10, InventoryType::CashShop, 5_000_001),
            // Sibling character's cash-shop row on the same account
            item(2, 10, InventoryType::CashShop, 5_000_002),
            // Sibling character's regular item
            item(2, 10, InventoryType::Use, 2_000_000),
            // Other account's cash shop
            item(3, 11, InventoryType::CashShop, 5_000_003),
        ];

        let record = data.character_record(CharacterId(1)).unwrap();
        let mut ids: Vec<i32> = record.inventory.iter().map(|i| i.item_id).collect();
        ids.sort();
        assert_eq!(ids, vec![1_302_000, 5_000_000, 5_000_001, 5_000_002]);
    }

    #[test]
    fn test_quest_progress_joined_by_status_row() {
        let mut data = dataset();
        data.quest_statuses.push(QuestStatusRow {
            id: 77,
            character_id: CharacterId(1),
            quest_id: 1000,
            state: 1,
            completed: 0,
        });
        data.quest_mob_progress.push(QuestMobProgressRow { quest_status_id: 77, mob_id: 100100, count: 3 });
        data.quest_mob_progress.push(QuestMobProgressRow { quest_status_id: 78, mob_id: 100101, count: 9 });

        let record = data.character_record(CharacterId(1)).unwrap();
        assert_eq!(record.quests.len(), 1);
        assert_eq!(record.quests[0].mob_progress.len(), 1);
        assert_eq!(record.quests[0].mob_progress[0].mob_id, 100100);
        assert_eq!(record.account_name, "hero_account");
    }

    #[test]
    fn test_missing_character() {
        assert!(matches!(
            dataset().character_record(CharacterId(99)),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn test_skill_rows_sorted() {
        let mut data = Dataset::new();
        for (skill, level) in [(2, 1), (1, 2), (1, 1)] {
            data.skill_effects.push(SkillEffectRow { skill_id: skill, level, ..Default::default() });
        }
        let order: Vec<(i32, u8)> = data.all_skill_rows().iter().map(|r| (r.skill_id, r.level)).collect();
        assert_eq!(order, vec![(1, 1), (1, 2), (2, 1)]);
    }

    #[test]
    fn test_online_state_update() {
        let mut data = dataset();
        data.set_online_state(AccountId(10), OnlineState::InGame).unwrap();
        assert_eq!(data.online_state(AccountId(10)).unwrap(), OnlineState::InGame);
        assert!(data.set_online_state(AccountId(99), OnlineState::Offline).is_err());
    }

    #[test]
    fn test_claim_in_game_needs_migrating() {
        let mut data = dataset();
        data.set_online_state(AccountId(10), OnlineState::Migrating).unwrap();
        assert!(data.claim_in_game(AccountId(10)).unwrap());
        assert_eq!(data.online_state(AccountId(10)).unwrap(), OnlineState::InGame);

        // Second claimant loses and changes nothing
        assert!(!data.claim_in_game(AccountId(10)).unwrap());
        data.set_online_state(AccountId(10), OnlineState::LoggedIn).unwrap();
        assert!(!data.claim_in_game(AccountId(10)).unwrap());
        assert_eq!(data.online_state(AccountId(10)).unwrap(), OnlineState::LoggedIn);
        assert!(data.claim_in_game(AccountId(99)).is_err());
    }
}
