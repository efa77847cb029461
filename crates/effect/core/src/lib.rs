//! Deterministic lifecycle of timed gameplay effects.
//!
//! `effect-core` defines what an effect is ([`EffectDefinition`]), how one
//! application of it runs ([`EffectInstance`]: delay, tag gates, periodic
//! ticks, stacking, supersession, predicted vs confirmed timing) and what it
//! needs from the entity it is applied to ([`EffectOwner`]). Owners drive
//! their instances through the helpers in [`registry`], which keep every
//! step replay-deterministic.
pub mod config;
pub mod definition;
pub mod error;
pub mod gate;
pub mod hooks;
pub mod instance;
pub mod modifier;
pub mod owner;
pub mod registry;
#[cfg(feature = "serde")]
pub mod snapshot;
pub mod tag;
pub mod types;

#[cfg(test)]
mod testing;

pub use config::EffectConfig;
pub use definition::EffectDefinition;
pub use error::{EffectError, ErrorSeverity, InitializeError, RegistryError, SnapshotError};
pub use gate::{ActiveTags, TagGate};
pub use hooks::{EffectHooks, NoopHooks};
pub use instance::{EffectApplication, EffectInstance};
pub use modifier::{AttributeModifier, ModifierFlags, ModifierOp};
pub use owner::EffectOwner;
pub use registry::ActiveEffects;
#[cfg(feature = "serde")]
pub use snapshot::{EffectsSnapshot, InstanceSnapshot};
pub use tag::{Tag, TagContainer};
pub use types::{EffectId, EffectState, SourceId};
