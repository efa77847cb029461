//! Repository layer for rollback snapshots.
//!
//! Repositories hold [`ComponentSnapshot`]s keyed by simulation step so a
//! component can be rolled back to a confirmed step and resimulated.
//!
//! [`ComponentSnapshot`]: crate::ComponentSnapshot

mod error;
mod file;
mod memory;
mod traits;

pub use error::{RepositoryError, Result};
pub use file::FileSnapshotRepository;
pub use memory::InMemorySnapshotRepo;
pub use traits::SnapshotRepository;
