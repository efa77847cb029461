//! File-based SnapshotRepository implementation.

use std::fs;
use std::path::{Path, PathBuf};

use crate::repository::{RepositoryError, Result, SnapshotRepository};
use crate::snapshot::ComponentSnapshot;

/// Stores snapshots as individual bincode files named `snapshot_{step}.bin`.
pub struct FileSnapshotRepository {
    base_dir: PathBuf,
}

impl FileSnapshotRepository {
    pub fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(&base_dir)?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    fn snapshot_path(&self, step: u64) -> PathBuf {
        self.base_dir.join(format!("snapshot_{}.bin", step))
    }
}

impl SnapshotRepository for FileSnapshotRepository {
    fn save(&self, snapshot: &ComponentSnapshot) -> Result<()> {
        let path = self.snapshot_path(snapshot.step);
        let temp_path = path.with_extension("bin.tmp");

        let bytes = snapshot
            .encode()
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        fs::write(&temp_path, bytes)?;
        fs::rename(&temp_path, &path)?;

        tracing::debug!("Saved snapshot[{}] to {}", snapshot.step, path.display());

        Ok(())
    }

    fn load(&self, step: u64) -> Result<Option<ComponentSnapshot>> {
        let path = self.snapshot_path(step);

        if !path.exists() {
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        let snapshot = ComponentSnapshot::decode(&bytes)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        tracing::debug!("Loaded snapshot[{}] from {}", step, path.display());

        Ok(Some(snapshot))
    }

    fn exists(&self, step: u64) -> bool {
        self.snapshot_path(step).exists()
    }

    fn delete(&self, step: u64) -> Result<()> {
        let path = self.snapshot_path(step);

        if path.exists() {
            fs::remove_file(&path)?;
            tracing::debug!("Deleted snapshot[{}]", step);
        }

        Ok(())
    }

    fn list_steps(&self) -> Result<Vec<u64>> {
        let mut steps = Vec::new();

        for entry in fs::read_dir(&self.base_dir)? {
            let path = entry?.path();

            if let Some(filename) = path.file_name().and_then(|s| s.to_str())
                && let Some(step) = filename
                    .strip_prefix("snapshot_")
                    .and_then(|s| s.strip_suffix(".bin"))
                    .and_then(|s| s.parse::<u64>().ok())
            {
                steps.push(step);
            }
        }

        steps.sort_unstable();
        Ok(steps)
    }
}
