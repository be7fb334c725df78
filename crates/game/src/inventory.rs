//! Character inventories

use std::collections::{BTreeMap, HashMap};

use mserver_storage::{InventoryItemRow, InventoryType};

/// One stack of items in a slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Item {
    pub item_id: i32,
    pub quantity: i16,
}

/// Slot-indexed contents of one inventory partition
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryTab {
    slots: BTreeMap<i16, Item>,
}

impl InventoryTab {
    pub fn get(&self, position: i16) -> Option<&Item> {
        self.slots.get(&position)
    }

    pub fn put(&mut self, position: i16, item: Item) -> Option<Item> {
        self.slots.insert(position, item)
    }

    pub fn take(&mut self, position: i16) -> Option<Item> {
        self.slots.remove(&position)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Items in slot order
    pub fn iter(&self) -> impl Iterator<Item = (i16, &Item)> {
        self.slots.iter().map(|(pos, item)| (*pos, item))
    }
}

/// Every inventory partition of a character, cash shop included
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    tabs: HashMap<InventoryType, InventoryTab>,
}

impl Inventory {
    pub fn from_rows(rows: &[InventoryItemRow]) -> Self {
        let mut inventory = Self::default();
        for row in rows {
            inventory.tab_mut(row.inventory_type).put(
                row.position,
                Item {
                    item_id: row.item_id,
                    quantity: row.quantity,
                },
            );
        }
        inventory
    }

    pub fn tab(&self, kind: InventoryType) -> Option<&InventoryTab> {
        self.tabs.get(&kind)
    }

    pub fn tab_mut(&mut self, kind: InventoryType) -> &mut InventoryTab {
        self.tabs.entry(kind).or_default()
    }

    pub fn item_count(&self) -> usize {
        self.tabs.values().map(InventoryTab::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mserver_core::{AccountId, CharacterId};

    #[test]
    fn test_rows_partitioned_by_type() {
        let row = |inventory_type, position, item_id| InventoryItemRow {
            character_id: CharacterId(1),
            account_id: AccountId(1),
            inventory_type,
            position,
            item_id,
            quantity: 1,
        };
        let inventory = Inventory::from_rows(&[
            row(InventoryType::Equipped, -11, 1_302_000),
            row(InventoryType::Use, 3, 2_000_000),
            row(InventoryType::Use, 1, 2_000_001),
            row(InventoryType::CashShop, 1, 5_000_000),
        ]);

        assert_eq!(inventory.item_count(), 4);
        let usable: Vec<i16> = inventory.tab(InventoryType::Use).unwrap().iter().map(|(p, _)| p).collect();
        assert_eq!(usable, vec![1, 3]);
        assert!(inventory.tab(InventoryType::Etc).is_none());
        assert_eq!(inventory.tab(InventoryType::CashShop).unwrap().get(1).unwrap().item_id, 5_000_000);
    }
}
