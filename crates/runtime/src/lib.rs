//! Owner-side runtime for effect-core.
//!
//! Provides the concrete [`AbilityComponent`] effects are applied to, its
//! configuration, and repositories for the snapshots used to roll a
//! component back and resimulate it when predictions are corrected.
//!
//! Modules:
//! - [`component`]: the owner component and its step contract
//! - [`attributes`], [`abilities`]: the state effects modify
//! - [`snapshot`]: rollback snapshots and state digests
//! - [`repository`]: snapshot storage (in-memory ring, bincode files)
//! - [`config`]: TOML-loadable settings
pub mod abilities;
pub mod attributes;
pub mod component;
pub mod config;
pub mod error;
pub mod repository;
pub mod snapshot;

pub use abilities::AbilitySet;
pub use attributes::{Attribute, AttributeSet};
pub use component::AbilityComponent;
pub use config::{ConfigLoader, RuntimeConfig};
pub use error::{Result, RuntimeError};
pub use repository::{
    FileSnapshotRepository, InMemorySnapshotRepo, RepositoryError, SnapshotRepository,
};
pub use snapshot::{ComponentSnapshot, StateDigest};

pub use effect_core;
