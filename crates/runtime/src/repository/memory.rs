//! In-memory SnapshotRepository implementation.

use std::collections::HashMap;
use std::sync::RwLock;

use match_core::BattleSnapshot;

use super::{RepositoryError, Result, SnapshotRepository, check_slot};

/// In-memory implementation of SnapshotRepository for testing.
#[derive(Debug, Default)]
pub struct InMemorySnapshotRepo {
    slots: RwLock<HashMap<String, BattleSnapshot>>,
}

impl InMemorySnapshotRepo {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotRepository for InMemorySnapshotRepo {
    fn save(&self, slot: &str, snapshot: &BattleSnapshot) -> Result<()> {
        check_slot(slot)?;
        self.slots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .insert(slot.to_owned(), snapshot.clone());
        Ok(())
    }

    fn load(&self, slot: &str) -> Result<Option<BattleSnapshot>> {
        check_slot(slot)?;
        let slots = self.slots.read().map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(slots.get(slot).cloned())
    }

    fn exists(&self, slot: &str) -> bool {
        self.slots
            .read()
            .map(|slots| slots.contains_key(slot))
            .unwrap_or(false)
    }

    fn delete(&self, slot: &str) -> Result<()> {
        self.slots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?
            .remove(slot);
        Ok(())
    }

    fn list_slots(&self) -> Result<Vec<String>> {
        let slots = self.slots.read().map_err(|_| RepositoryError::LockPoisoned)?;
        let mut names: Vec<String> = slots.keys().cloned().collect();
        names.sort_unstable();
        Ok(names)
    }
}
