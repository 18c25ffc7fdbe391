//! File-based SnapshotRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use match_core::BattleSnapshot;
use sha2::{Digest, Sha256};

use super::{RepositoryError, Result, SnapshotRepository, check_slot};

/// File-based implementation of SnapshotRepository.
///
/// Each slot is stored as `{slot}.json` with its SHA-256 digest in
/// `{slot}.sha256`. Both files are written to a temporary path and renamed
/// into place.
pub struct FileSnapshotRepository {
    base_dir: PathBuf,
}

impl FileSnapshotRepository {
    /// Create a new file-based snapshot repository.
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir).map_err(RepositoryError::Io)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn snapshot_path(&self, slot: &str) -> PathBuf {
        self.base_dir.join(format!("{slot}.json"))
    }

    fn digest_path(&self, slot: &str) -> PathBuf {
        self.base_dir.join(format!("{slot}.sha256"))
    }
}

fn digest(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut temp_path = path.as_os_str().to_owned();
    temp_path.push(".tmp");
    let temp_path = PathBuf::from(temp_path);

    fs::write(&temp_path, bytes).map_err(RepositoryError::Io)?;
    fs::rename(&temp_path, path).map_err(RepositoryError::Io)?;
    Ok(())
}

impl SnapshotRepository for FileSnapshotRepository {
    fn save(&self, slot: &str, snapshot: &BattleSnapshot) -> Result<()> {
        check_slot(slot)?;
        let path = self.snapshot_path(slot);

        let bytes = serde_json::to_vec_pretty(snapshot)
            .map_err(|e| RepositoryError::Json(e.to_string()))?;

        // A crash between the writes leaves a digest mismatch for load to report.
        write_atomic(&self.digest_path(slot), digest(&bytes).as_bytes())?;
        write_atomic(&path, &bytes)?;

        tracing::debug!("Saved snapshot[{}] to {}", slot, path.display());

        Ok(())
    }

    fn load(&self, slot: &str) -> Result<Option<BattleSnapshot>> {
        check_slot(slot)?;
        let path = self.snapshot_path(slot);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path).map_err(RepositoryError::Io)?;
        let expected = fs::read_to_string(self.digest_path(slot)).map_err(RepositoryError::Io)?;
        let actual = digest(&bytes);
        if expected.trim() != actual {
            return Err(RepositoryError::CorruptedData(format!(
                "snapshot[{slot}] digest mismatch: expected {}, found {actual}",
                expected.trim()
            )));
        }

        let snapshot: BattleSnapshot =
            serde_json::from_slice(&bytes).map_err(|e| RepositoryError::Json(e.to_string()))?;

        tracing::debug!("Loaded snapshot[{}] from {}", slot, path.display());

        Ok(Some(snapshot))
    }

    fn exists(&self, slot: &str) -> bool {
        check_slot(slot).is_ok() && self.snapshot_path(slot).exists()
    }

    fn delete(&self, slot: &str) -> Result<()> {
        check_slot(slot)?;
        for path in [self.snapshot_path(slot), self.digest_path(slot)] {
            if path.exists() {
                fs::remove_file(&path).map_err(RepositoryError::Io)?;
            }
        }
        tracing::debug!("Deleted snapshot[{}]", slot);

        Ok(())
    }

    fn list_slots(&self) -> Result<Vec<String>> {
        let mut slots = Vec::new();

        let entries = fs::read_dir(&self.base_dir).map_err(RepositoryError::Io)?;

        for entry in entries {
            let entry = entry.map_err(RepositoryError::Io)?;
            let path = entry.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(slot) = filename.strip_suffix(".json")
                && check_slot(slot).is_ok()
            {
                slots.push(slot.to_owned());
            }
        }

        slots.sort_unstable();
        Ok(slots)
    }
}
