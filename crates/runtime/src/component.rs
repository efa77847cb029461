//! The owner component effects are applied to.
//!
//! [`AbilityComponent`] holds one entity's attributes, active tags,
//! abilities, simulation clock and active effects, and implements
//! [`EffectOwner`] so effect instances can drive it. All state changes happen
//! inside [`AbilityComponent::apply_effect`], [`AbilityComponent::tick`],
//! [`AbilityComponent::cancel_effect`] and [`AbilityComponent::rollback`].
//!
//! # Step contract
//!
//! One call to [`AbilityComponent::tick`] is one simulation step:
//!
//! 1. the clock advances by `dt`;
//! 2. every registered instance is ticked in ascending id order, and a
//!    same-tag supersession triggered by an instance that started this step
//!    is resolved right after that instance;
//! 3. ended instances are dropped when `remove_ended_effects` is set.
//!
//! Replaying the same calls from a [`ComponentSnapshot`] reproduces the same
//! [`StateDigest`].

use std::collections::BTreeMap;
use std::sync::Arc;

use effect_core::registry;
use effect_core::{
    ActiveEffects, ActiveTags, AttributeModifier, EffectApplication, EffectDefinition,
    EffectHooks, EffectId, EffectInstance, EffectOwner, EffectsSnapshot, ModifierFlags,
    NoopHooks, SourceId, Tag, TagContainer,
};
use tracing::{debug, trace, warn};

use crate::abilities::AbilitySet;
use crate::attributes::{Attribute, AttributeSet};
use crate::config::RuntimeConfig;
use crate::error::{Result, RuntimeError};
use crate::repository::SnapshotRepository;
use crate::snapshot::{ComponentSnapshot, StateDigest};

/// An entity's effect-facing state.
#[derive(Debug)]
pub struct AbilityComponent {
    config: RuntimeConfig,
    step: u64,
    clock: f64,
    next_id: EffectId,
    attributes: AttributeSet,
    tags: TagContainer,
    abilities: AbilitySet,
    effects: ActiveEffects,
    hooks: BTreeMap<Tag, Arc<dyn EffectHooks>>,
}

impl AbilityComponent {
    pub fn new(config: RuntimeConfig) -> Self {
        let effects = ActiveEffects::from_config(&config.effects);
        Self {
            config,
            step: 0,
            clock: 0.0,
            next_id: EffectId(1),
            attributes: AttributeSet::new(),
            tags: TagContainer::new(),
            abilities: AbilitySet::new(),
            effects,
            hooks: BTreeMap::new(),
        }
    }

    // ========================================================================
    // Setup and queries
    // ========================================================================

    pub fn config(&self) -> &RuntimeConfig {
        &self.config
    }

    /// Number of steps ticked so far.
    pub fn step(&self) -> u64 {
        self.step
    }

    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn define_attribute(&mut self, tag: impl Into<Tag>, attribute: Attribute) {
        self.attributes.define(tag, attribute);
    }

    pub fn attribute(&self, tag: &Tag) -> Option<f64> {
        self.attributes.value(tag)
    }

    pub fn attributes(&self) -> &AttributeSet {
        &self.attributes
    }

    /// Hooks used by every effect carrying exactly `effect_tag`, including
    /// instances restored by a rollback.
    pub fn register_hooks(&mut self, effect_tag: impl Into<Tag>, hooks: Arc<dyn EffectHooks>) {
        self.hooks.insert(effect_tag.into(), hooks);
    }

    /// Adds a tag that no effect granted (stuns from outside the effect system, ...).
    pub fn add_tag(&mut self, tag: impl Into<Tag>) {
        self.tags.insert(tag.into());
    }

    pub fn remove_tag(&mut self, tag: &Tag) {
        self.tags.remove(tag);
    }

    /// Hierarchical tag query.
    pub fn has_tag(&self, tag: &Tag) -> bool {
        self.tags.has_tag(tag)
    }

    pub fn tags(&self) -> &TagContainer {
        &self.tags
    }

    pub fn abilities(&self) -> &AbilitySet {
        &self.abilities
    }

    pub fn abilities_mut(&mut self) -> &mut AbilitySet {
        &mut self.abilities
    }

    pub fn effects(&self) -> &ActiveEffects {
        &self.effects
    }

    pub fn effect(&self, id: EffectId) -> Option<&EffectInstance> {
        self.effects.get(id)
    }

    // ========================================================================
    // Effect operations
    // ========================================================================

    /// Creates, registers and checks a new instance of `definition`.
    ///
    /// A zero-delay effect starts inside this call; an instant one also ends
    /// inside it.
    pub fn apply_effect(
        &mut self,
        definition: EffectDefinition,
        application: EffectApplication,
    ) -> Result<EffectId> {
        let id = self.next_id;
        let hooks = self.hooks_for(&definition.effect_tag);
        let mut instance = EffectInstance::new(id, definition, hooks);
        instance.initialize(Some(&*self), application)?;
        self.effects.insert(instance)?;
        self.next_id = id.next();

        debug!(id = %id, clock = self.clock, "effect applied");
        registry::check_effect(self, id)?;
        Ok(id)
    }

    /// Advances the component by one simulation step.
    pub fn tick(&mut self, dt: f64) {
        self.step += 1;
        self.clock += dt;

        registry::tick_all(self, dt);

        if self.config.remove_ended_effects {
            let removed = self.effects.remove_ended();
            if removed > 0 {
                trace!(step = self.step, removed, "dropped ended effects");
            }
        }
    }

    /// Ends an effect explicitly.
    ///
    /// Cancelling an effect that already ended, or was already dropped, does
    /// nothing. Only ids this component never issued are rejected.
    pub fn cancel_effect(&mut self, id: EffectId) -> Result<()> {
        if id.0 == 0 || id >= self.next_id {
            return Err(RuntimeError::UnknownEffect { id });
        }
        if self.effects.contains(id) {
            debug!(id = %id, "cancelling effect");
            registry::end_effect(self, id)?;
        }
        Ok(())
    }

    /// Replaces an effect's predicted timing with timing confirmed by the authority.
    pub fn confirm_effect(&mut self, id: EffectId, start_time: f64, end_time: f64) -> Result<()> {
        let instance = self
            .effects
            .get_mut(id)
            .ok_or(RuntimeError::UnknownEffect { id })?;
        instance.confirm_timing(start_time, end_time);
        Ok(())
    }

    /// Predicted effects the authority has not confirmed within their grace window.
    ///
    /// This is a signal for the reconciliation layer; nothing is corrected here.
    pub fn overdue_predictions(&self) -> Vec<EffectId> {
        let overdue = self.effects.overdue_predictions(self.clock);
        for id in &overdue {
            if let Some(instance) = self.effects.get(*id) {
                warn!(
                    id = %id,
                    effect = %instance.effect_tag(),
                    deadline = instance.confirmation_deadline(),
                    clock = self.clock,
                    "predicted effect not confirmed within grace window"
                );
            }
        }
        overdue
    }

    // ========================================================================
    // Rollback
    // ========================================================================

    pub fn save(&self) -> ComponentSnapshot {
        ComponentSnapshot {
            step: self.step,
            clock: self.clock,
            next_id: self.next_id,
            attributes: self.attributes.clone(),
            tags: self.tags.clone(),
            abilities: self.abilities.clone(),
            effects: EffectsSnapshot::capture(&self.effects),
        }
    }

    /// Puts the component back to the state captured in `snapshot`.
    ///
    /// Restored instances are re-bound to the hooks registered for their tag.
    pub fn rollback(&mut self, snapshot: ComponentSnapshot) -> Result<()> {
        let hooks = &self.hooks;
        let effects = snapshot
            .effects
            .restore(|tag| hooks_for(hooks, tag))?;

        debug!(
            from_step = self.step,
            to_step = snapshot.step,
            clock = snapshot.clock,
            "rolling back component"
        );

        self.step = snapshot.step;
        self.clock = snapshot.clock;
        self.next_id = snapshot.next_id;
        self.attributes = snapshot.attributes;
        self.tags = snapshot.tags;
        self.abilities = snapshot.abilities;
        self.effects = effects;
        Ok(())
    }

    pub fn save_to(&self, repository: &dyn SnapshotRepository) -> Result<()> {
        repository.save(&self.save())?;
        Ok(())
    }

    /// Rolls back to the newest stored snapshot at or before `step` and
    /// discards the stored snapshots of the abandoned timeline.
    pub fn rollback_to(&mut self, repository: &dyn SnapshotRepository, step: u64) -> Result<()> {
        let snapshot = repository
            .latest_at_or_before(step)?
            .ok_or(RuntimeError::MissingSnapshot { step })?;
        let restored_step = snapshot.step;
        self.rollback(snapshot)?;
        repository.delete_after(restored_step)?;
        Ok(())
    }

    /// Digest of the full component state.
    pub fn state_digest(&self) -> Result<StateDigest> {
        Ok(self.save().digest()?)
    }

    fn hooks_for(&self, effect_tag: &Tag) -> Arc<dyn EffectHooks> {
        hooks_for(&self.hooks, effect_tag)
    }
}

fn hooks_for(hooks: &BTreeMap<Tag, Arc<dyn EffectHooks>>, effect_tag: &Tag) -> Arc<dyn EffectHooks> {
    hooks
        .get(effect_tag)
        .cloned()
        .unwrap_or_else(|| Arc::new(NoopHooks))
}

impl Default for AbilityComponent {
    fn default() -> Self {
        Self::new(RuntimeConfig::default())
    }
}

impl ActiveTags for AbilityComponent {
    fn has_active_tag(&self, tag: &Tag) -> bool {
        self.tags.has_tag(tag)
    }
}

impl EffectOwner for AbilityComponent {
    fn clock(&self) -> f64 {
        self.clock
    }

    fn apply_modifier(
        &mut self,
        modifier: &AttributeModifier,
        flags: ModifierFlags,
        source: Option<SourceId>,
    ) {
        match self.attributes.apply(modifier, flags) {
            Some(value) => trace!(
                attribute = %modifier.attribute,
                op = %modifier.op,
                delta = modifier.value,
                ?flags,
                ?source,
                value,
                "applied modifier"
            ),
            None => trace!(
                attribute = %modifier.attribute,
                ?flags,
                "modifier had no target"
            ),
        }
    }

    fn add_active_tag(&mut self, tag: &Tag) {
        self.tags.insert(tag.clone());
    }

    fn remove_active_tag(&mut self, tag: &Tag) {
        self.tags.remove(tag);
    }

    fn grant_ability(&mut self, ability: &Tag) {
        self.abilities.grant(ability);
    }

    fn remove_granted_ability(&mut self, ability: &Tag) {
        self.abilities.revoke(ability);
    }

    fn end_active_abilities(&mut self, ability: &Tag) {
        let ended = self.abilities.end_matching(ability);
        if ended > 0 {
            debug!(ability = %ability, ended, "cancelled active abilities");
        }
    }

    fn attribute_exists(&self, attribute: &Tag) -> bool {
        self.attributes.contains(attribute)
    }

    fn attribute_value(&self, attribute: &Tag) -> f64 {
        self.attributes.value(attribute).unwrap_or_default()
    }

    fn dispel_effects(&mut self, definition: &EffectDefinition) {
        registry::dispel(self, definition);
    }

    fn active_effects(&self) -> &ActiveEffects {
        &self.effects
    }

    fn active_effects_mut(&mut self) -> &mut ActiveEffects {
        &mut self.effects
    }
}
