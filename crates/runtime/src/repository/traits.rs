//! Repository contract for rollback snapshots.

use crate::repository::Result;
use crate::snapshot::ComponentSnapshot;

/// Storage of component snapshots indexed by step.
pub trait SnapshotRepository: Send + Sync {
    /// Saves a snapshot under its own `step`, replacing any previous one.
    fn save(&self, snapshot: &ComponentSnapshot) -> Result<()>;

    fn load(&self, step: u64) -> Result<Option<ComponentSnapshot>>;

    fn exists(&self, step: u64) -> bool;

    fn delete(&self, step: u64) -> Result<()>;

    /// Stored steps in ascending order.
    fn list_steps(&self) -> Result<Vec<u64>>;

    /// The most recent snapshot taken at or before `step`.
    fn latest_at_or_before(&self, step: u64) -> Result<Option<ComponentSnapshot>> {
        let steps = self.list_steps()?;
        match steps.into_iter().rev().find(|stored| *stored <= step) {
            Some(stored) => self.load(stored),
            None => Ok(None),
        }
    }

    /// Deletes every snapshot newer than `step`; they describe a discarded timeline.
    fn delete_after(&self, step: u64) -> Result<usize> {
        let mut deleted = 0;
        for stored in self.list_steps()? {
            if stored > step {
                self.delete(stored)?;
                deleted += 1;
            }
        }
        Ok(deleted)
    }
}
