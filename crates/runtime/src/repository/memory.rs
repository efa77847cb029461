//! Bounded in-memory SnapshotRepository for rollback windows.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::config::RuntimeConfig;
use crate::repository::{RepositoryError, Result, SnapshotRepository};
use crate::snapshot::ComponentSnapshot;

/// In-memory ring of the most recent snapshots.
///
/// Holds at most `capacity` snapshots; saving past that evicts the oldest
/// steps first.
pub struct InMemorySnapshotRepo {
    snapshots: RwLock<BTreeMap<u64, ComponentSnapshot>>,
    capacity: usize,
}

impl InMemorySnapshotRepo {
    pub fn new(capacity: usize) -> Self {
        Self {
            snapshots: RwLock::new(BTreeMap::new()),
            capacity: capacity.max(1),
        }
    }

    /// Ring sized by `snapshot_history`.
    pub fn from_config(config: &RuntimeConfig) -> Self {
        Self::new(config.snapshot_history)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl SnapshotRepository for InMemorySnapshotRepo {
    fn save(&self, snapshot: &ComponentSnapshot) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.insert(snapshot.step, snapshot.clone());
        while snapshots.len() > self.capacity {
            snapshots.pop_first();
        }
        Ok(())
    }

    fn load(&self, step: u64) -> Result<Option<ComponentSnapshot>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.get(&step).cloned())
    }

    fn exists(&self, step: u64) -> bool {
        self.snapshots
            .read()
            .map(|snapshots| snapshots.contains_key(&step))
            .unwrap_or(false)
    }

    fn delete(&self, step: u64) -> Result<()> {
        let mut snapshots = self
            .snapshots
            .write()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        snapshots.remove(&step);
        Ok(())
    }

    fn list_steps(&self) -> Result<Vec<u64>> {
        let snapshots = self
            .snapshots
            .read()
            .map_err(|_| RepositoryError::LockPoisoned)?;
        Ok(snapshots.keys().copied().collect())
    }
}
