//! The collaborator surface an effect instance drives.
//!
//! The owner is the component that holds attributes, tags, abilities, the
//! simulation clock and the registry of active effects. Effect instances
//! never store a reference to it; every lifecycle call borrows it for the
//! duration of that call.
//!
//! All methods are synchronous and are assumed total over valid input: the
//! core does not retry or inspect the outcome of a collaborator call.

use crate::definition::EffectDefinition;
use crate::gate::ActiveTags;
use crate::modifier::{AttributeModifier, ModifierFlags};
use crate::registry::ActiveEffects;
use crate::tag::Tag;
use crate::types::SourceId;

/// Owner-side operations consumed by [`crate::EffectInstance`].
pub trait EffectOwner: ActiveTags {
    /// Monotonic simulation time. Never wall-clock.
    fn clock(&self) -> f64;

    fn apply_modifier(
        &mut self,
        modifier: &AttributeModifier,
        flags: ModifierFlags,
        source: Option<SourceId>,
    );

    fn add_active_tag(&mut self, tag: &Tag);

    fn remove_active_tag(&mut self, tag: &Tag);

    fn grant_ability(&mut self, ability: &Tag);

    fn remove_granted_ability(&mut self, ability: &Tag);

    /// Ends every running ability matching `ability`.
    fn end_active_abilities(&mut self, ability: &Tag);

    fn attribute_exists(&self, attribute: &Tag) -> bool;

    fn attribute_value(&self, attribute: &Tag) -> f64;

    /// Ends effects the starting `definition` dispels.
    ///
    /// Called once per start, after tags and abilities are granted and
    /// before any modifier is applied.
    fn dispel_effects(&mut self, definition: &EffectDefinition);

    /// Registry of active instances, iterated in stable id order.
    fn active_effects(&self) -> &ActiveEffects;

    fn active_effects_mut(&mut self) -> &mut ActiveEffects;
}
