//! Versioned snapshots of an owner's active effects.
//!
//! Snapshots carry definitions and runtime fields but not hooks, which are
//! behavior rather than state. Restoring asks the caller for the hooks of
//! each effect tag.
//!
//! Encoding uses bincode, whose output is a pure function of the value, so two
//! registries in the same state always encode to the same bytes.

use std::sync::Arc;

use crate::config::EffectConfig;
use crate::definition::EffectDefinition;
use crate::error::SnapshotError;
use crate::hooks::EffectHooks;
use crate::instance::{EffectInstance, RestoredParts};
use crate::registry::ActiveEffects;
use crate::tag::Tag;
use crate::types::{EffectId, EffectState, SourceId};

/// Runtime state of one instance.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InstanceSnapshot {
    pub id: EffectId,
    pub definition: EffectDefinition,
    pub source: Option<SourceId>,
    pub state: EffectState,
    pub initialized: bool,
    pub started: bool,
    pub completed: bool,
    pub negate_at_end: bool,
    pub current_duration: f64,
    pub start_time: f64,
    pub end_time: f64,
    pub prev_period_phase: f64,
    pub client_application_time: f64,
    pub confirmed: bool,
}

impl InstanceSnapshot {
    pub fn capture(instance: &EffectInstance) -> Self {
        Self {
            id: instance.id(),
            definition: instance.definition().clone(),
            source: instance.source(),
            state: instance.state(),
            initialized: instance.is_initialized(),
            started: instance.has_started(),
            completed: instance.is_completed(),
            negate_at_end: instance.negates_at_end(),
            current_duration: instance.current_duration(),
            start_time: instance.start_time(),
            end_time: instance.end_time(),
            prev_period_phase: instance.prev_period_phase(),
            client_application_time: instance.client_application_time(),
            confirmed: instance.is_confirmed(),
        }
    }

    pub fn into_instance(self, hooks: Arc<dyn EffectHooks>) -> EffectInstance {
        let parts = RestoredParts {
            source: self.source,
            state: self.state,
            initialized: self.initialized,
            started: self.started,
            completed: self.completed,
            negate_at_end: self.negate_at_end,
            current_duration: self.current_duration,
            start_time: self.start_time,
            end_time: self.end_time,
            prev_period_phase: self.prev_period_phase,
            client_application_time: self.client_application_time,
            confirmed: self.confirmed,
        };
        EffectInstance::restore_parts(self.id, self.definition, hooks, parts)
    }
}

/// Every instance of one registry, in id order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EffectsSnapshot {
    pub version: u16,
    pub capacity: usize,
    pub instances: Vec<InstanceSnapshot>,
}

impl EffectsSnapshot {
    pub fn capture(effects: &ActiveEffects) -> Self {
        Self {
            version: EffectConfig::SNAPSHOT_VERSION,
            capacity: effects.capacity(),
            instances: effects.iter().map(InstanceSnapshot::capture).collect(),
        }
    }

    /// Rebuilds the registry, binding each instance to `hooks_for(effect_tag)`.
    pub fn restore<F>(self, mut hooks_for: F) -> Result<ActiveEffects, SnapshotError>
    where
        F: FnMut(&Tag) -> Arc<dyn EffectHooks>,
    {
        self.check_version()?;
        let mut effects = ActiveEffects::new(self.capacity);
        for snapshot in self.instances {
            let hooks = hooks_for(&snapshot.definition.effect_tag);
            effects.restore(snapshot.into_instance(hooks));
        }
        Ok(effects)
    }

    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Self =
            bincode::deserialize(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        snapshot.check_version()?;
        Ok(snapshot)
    }

    fn check_version(&self) -> Result<(), SnapshotError> {
        if self.version != EffectConfig::SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: self.version,
                expected: EffectConfig::SNAPSHOT_VERSION,
            });
        }
        Ok(())
    }
}
