//! Persistence for battle snapshots.
//!
//! Snapshots are stored under short slot names. [`InMemorySnapshotRepo`]
//! backs tests; [`FileSnapshotRepository`] writes JSON with a SHA-256 digest
//! beside each file so a damaged save is refused instead of restored.

mod error;
mod file;
mod memory;

pub use error::{RepositoryError, Result};
pub use file::FileSnapshotRepository;
pub use memory::InMemorySnapshotRepo;

use match_core::BattleSnapshot;

/// Storage for settled battle snapshots keyed by slot name.
pub trait SnapshotRepository: Send + Sync {
    /// Stores `snapshot` under `slot`, replacing any previous save.
    fn save(&self, slot: &str, snapshot: &BattleSnapshot) -> Result<()>;

    /// Loads the snapshot in `slot`, if any.
    fn load(&self, slot: &str) -> Result<Option<BattleSnapshot>>;

    fn exists(&self, slot: &str) -> bool;

    /// Removes `slot`; missing slots are not an error.
    fn delete(&self, slot: &str) -> Result<()>;

    /// Every saved slot, sorted.
    fn list_slots(&self) -> Result<Vec<String>>;
}

/// Slot names double as file stems, so keep them to a safe alphabet.
pub(crate) fn check_slot(slot: &str) -> Result<()> {
    let valid = !slot.is_empty()
        && slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(RepositoryError::InvalidSlot(slot.to_owned()))
    }
}
