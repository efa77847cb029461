//! Registry of an owner's active effect instances.
//!
//! Instances are keyed by [`EffectId`] and always iterated in ascending id
//! order so that ticking, supersession and dispel resolve identically on
//! every replay.
//!
//! Lifecycle calls need the owner mutably while the instance being driven
//! lives inside that owner's registry. The drive helpers in this module
//! resolve that by checking the instance out of the registry for the
//! duration of the call and checking it back in afterwards. While checked
//! out, an instance is invisible to sibling scans (stack sharing, tag
//! preservation, dispel).

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::EffectConfig;
use crate::definition::EffectDefinition;
use crate::error::RegistryError;
use crate::instance::EffectInstance;
use crate::owner::EffectOwner;
use crate::tag::{Tag, TagContainer};
use crate::types::{EffectId, EffectState};

/// Ordered, bounded collection of effect instances owned by one component.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveEffects {
    effects: BTreeMap<EffectId, EffectInstance>,
    capacity: usize,
}

impl ActiveEffects {
    pub fn new(capacity: usize) -> Self {
        Self {
            effects: BTreeMap::new(),
            capacity,
        }
    }

    pub fn from_config(config: &EffectConfig) -> Self {
        Self::new(config.max_active_effects)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Registers a new instance.
    pub fn insert(&mut self, instance: EffectInstance) -> Result<(), RegistryError> {
        let id = instance.id();
        if self.effects.contains_key(&id) {
            return Err(RegistryError::DuplicateId { id });
        }
        if self.effects.len() >= self.capacity {
            warn!(
                effect = %instance.effect_tag(),
                max = self.capacity,
                "active effect registry is full"
            );
            return Err(RegistryError::Full { max: self.capacity });
        }
        self.effects.insert(id, instance);
        Ok(())
    }

    pub fn contains(&self, id: EffectId) -> bool {
        self.effects.contains_key(&id)
    }

    pub fn get(&self, id: EffectId) -> Option<&EffectInstance> {
        self.effects.get(&id)
    }

    pub fn get_mut(&mut self, id: EffectId) -> Option<&mut EffectInstance> {
        self.effects.get_mut(&id)
    }

    /// Checks an instance out of the registry.
    ///
    /// Pair with [`ActiveEffects::restore`]; the drive helpers in this
    /// module do both.
    pub fn take(&mut self, id: EffectId) -> Option<EffectInstance> {
        self.effects.remove(&id)
    }

    /// Checks an instance back in. Capacity was already accounted for on insert.
    pub fn restore(&mut self, instance: EffectInstance) {
        self.effects.insert(instance.id(), instance);
    }

    /// Destroys an instance. Only ended instances may be destroyed.
    pub fn remove(&mut self, id: EffectId) -> Result<EffectInstance, RegistryError> {
        match self.effects.get(&id) {
            Some(instance) if instance.state() == EffectState::Ended => {}
            Some(_) | None => return Err(RegistryError::NotFound { id }),
        }
        self.effects
            .remove(&id)
            .ok_or(RegistryError::NotFound { id })
    }

    /// Drops every ended instance and returns how many were dropped.
    pub fn remove_ended(&mut self) -> usize {
        let before = self.effects.len();
        self.effects
            .retain(|_, instance| instance.state() != EffectState::Ended);
        before - self.effects.len()
    }

    pub fn clear(&mut self) {
        self.effects.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectInstance> {
        self.effects.values()
    }

    pub fn ids(&self) -> Vec<EffectId> {
        self.effects.keys().copied().collect()
    }

    fn started(&self) -> impl Iterator<Item = &EffectInstance> {
        self.iter()
            .filter(|instance| instance.state() == EffectState::Started)
    }

    // ========================================================================
    // Sibling queries
    // ========================================================================

    /// Returns true if a started instance carries exactly this effect tag.
    pub fn has_started_with_tag(&self, tag: &Tag) -> bool {
        self.started().any(|instance| instance.effect_tag() == tag)
    }

    /// Returns true if any started instance other than `exclude` counts on `stack`.
    pub fn has_started_on_stack(&self, stack: &Tag, exclude: EffectId) -> bool {
        self.started().any(|instance| {
            instance.id() != exclude && instance.definition().stack_attribute() == Some(stack)
        })
    }

    /// The subset of `tags` still granted by started instances other than `exclude`.
    pub fn granted_by_started(&self, tags: &TagContainer, exclude: EffectId) -> TagContainer {
        self.started()
            .filter(|instance| instance.id() != exclude)
            .flat_map(|instance| instance.definition().granted_tags.iter())
            .filter(|tag| tags.contains(tag))
            .cloned()
            .collect()
    }

    /// Started instances sharing `tag` that a newly started `id` replaces.
    pub fn superseded_by(&self, id: EffectId, tag: &Tag) -> Vec<EffectId> {
        self.started()
            .filter(|instance| instance.id() != id && instance.effect_tag() == tag)
            .map(EffectInstance::id)
            .collect()
    }

    /// Started instances the `dispeller` definition removes when it starts.
    pub fn dispel_targets(&self, dispeller: &EffectDefinition) -> Vec<EffectId> {
        if dispeller.dispel_tags.is_empty() {
            return Vec::new();
        }
        self.started()
            .filter(|instance| {
                let definition = instance.definition();
                definition.metadata.has_any(&dispeller.dispel_tags)
                    && (dispeller.dispel_granted_filter.is_empty()
                        || definition
                            .granted_tags
                            .has_any(&dispeller.dispel_granted_filter))
            })
            .map(EffectInstance::id)
            .collect()
    }

    /// Predicted, unconfirmed instances past their grace window at `clock`.
    pub fn overdue_predictions(&self, clock: f64) -> Vec<EffectId> {
        self.iter()
            .filter(|instance| instance.is_confirmation_overdue(clock))
            .map(EffectInstance::id)
            .collect()
    }
}

impl Default for ActiveEffects {
    fn default() -> Self {
        Self::new(EffectConfig::DEFAULT_MAX_ACTIVE_EFFECTS)
    }
}

// ============================================================================
// Drive helpers
// ============================================================================

/// Runs `step` on a checked-out instance, then resolves same-tag supersession.
fn drive<F>(owner: &mut dyn EffectOwner, id: EffectId, step: F) -> Result<(), RegistryError>
where
    F: FnOnce(&mut EffectInstance, &mut dyn EffectOwner),
{
    let mut instance = owner
        .active_effects_mut()
        .take(id)
        .ok_or(RegistryError::NotFound { id })?;

    step(&mut instance, &mut *owner);

    let supersede = instance.take_supersession();
    let tag = instance.effect_tag().clone();
    owner.active_effects_mut().restore(instance);

    if supersede {
        resolve_supersession(owner, id, &tag);
    }
    Ok(())
}

/// Ticks one registered instance.
pub fn tick_effect(
    owner: &mut dyn EffectOwner,
    id: EffectId,
    dt: f64,
) -> Result<(), RegistryError> {
    drive(owner, id, |instance, owner| instance.tick(owner, dt))
}

/// Ticks every registered instance in ascending id order.
///
/// Instances registered during the pass (by hooks) are not ticked until the next one.
pub fn tick_all(owner: &mut dyn EffectOwner, dt: f64) {
    for id in owner.active_effects().ids() {
        // Missing ids were removed by an earlier instance's hooks this pass.
        let _ = tick_effect(owner, id, dt);
    }
}

/// Runs the start/expiry check of one registered instance.
pub fn check_effect(owner: &mut dyn EffectOwner, id: EffectId) -> Result<(), RegistryError> {
    drive(owner, id, |instance, owner| instance.check_state(owner))
}

/// Explicitly ends one registered instance. Ending an ended instance is a no-op.
pub fn end_effect(owner: &mut dyn EffectOwner, id: EffectId) -> Result<(), RegistryError> {
    drive(owner, id, |instance, owner| instance.end_effect(owner))
}

/// Ends every started instance sharing `tag` other than the one that just started.
pub fn resolve_supersession(owner: &mut dyn EffectOwner, id: EffectId, tag: &Tag) {
    for superseded in owner.active_effects().superseded_by(id, tag) {
        debug!(effect = %tag, id = %superseded, by = %id, "effect superseded");
        let _ = end_effect(owner, superseded);
    }
}

/// Ends every started instance the starting `dispeller` definition dispels.
///
/// Owners typically call this from [`EffectOwner::dispel_effects`]. The
/// dispelling instance is checked out while it starts, so it never
/// dispels itself.
pub fn dispel(owner: &mut dyn EffectOwner, dispeller: &EffectDefinition) {
    for target in owner.active_effects().dispel_targets(dispeller) {
        debug!(effect = %dispeller.effect_tag, target = %target, "dispelling effect");
        let _ = end_effect(owner, target);
    }
}
