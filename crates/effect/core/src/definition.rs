//! Authored effect templates.
//!
//! A definition is immutable once an instance has been created from it; each
//! instance owns its own copy.

use crate::config::EffectConfig;
use crate::modifier::AttributeModifier;
use crate::tag::{Tag, TagContainer};

/// Template describing what an effect does and when it is allowed to run.
///
/// # Classification
///
/// - **Instant** (`instant == true`): modifiers are applied once when the
///   effect starts, then it ends within the same call. Nothing is reverted.
/// - **Duration** (`duration > 0`): active until the owner clock reaches
///   `start + duration`.
/// - **Infinite** (`duration == 0`, not instant): active until a gate,
///   cancellation, dispel or supersession ends it.
///
/// Any of the non-instant kinds become *periodic* when `period > 0`; their
/// modifiers are then re-applied on every period boundary instead of being
/// held for the lifetime of the effect.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectDefinition {
    /// Identity of the effect. Reapplying an effect with the same tag
    /// supersedes the running instance.
    pub effect_tag: Tag,

    pub instant: bool,

    /// Seconds between application and start.
    pub delay: f64,

    /// Seconds the effect lasts; zero means infinite for non-instant effects.
    pub duration: f64,

    /// Seconds between periodic ticks; zero disables periodic behavior.
    pub period: f64,

    /// Fire one periodic tick as soon as the effect starts.
    pub period_tick_at_start: bool,

    /// Seconds a locally predicted application may stay unconfirmed.
    pub client_grace_time: f64,

    /// Attribute holding the stack count shared by every effect naming it.
    ///
    /// Incremented by one when an effect starts and reset to zero when the
    /// last started effect naming it ends. Different effect tags may share
    /// one stack attribute.
    pub stack_attribute: Option<Tag>,

    /// Classification tags (buff, debuff, school, ...) used by dispels.
    pub metadata: TagContainer,

    /// Starting this effect dispels started effects whose metadata has any of these.
    pub dispel_tags: TagContainer,

    /// If non-empty, only effects granting at least one of these tags are dispelled.
    pub dispel_granted_filter: TagContainer,

    /// Tags added to the owner while the effect runs.
    pub granted_tags: TagContainer,

    /// Owner must have one of these to start.
    pub application_must_have: TagContainer,

    /// Owner must have none of these to start.
    pub application_must_not_have: TagContainer,

    /// Owner must have one of these to start and to stay active.
    pub must_have: TagContainer,

    /// Owner must have none of these to start and to stay active.
    pub must_not_have: TagContainer,

    pub granted_abilities: TagContainer,

    pub removed_abilities: TagContainer,

    /// Periodic ticks are skipped while the owner has any of these. Duration still runs.
    pub pause_periodic_tags: TagContainer,

    /// Active abilities matching these are ended when the effect starts.
    pub cancel_abilities_on_activation: TagContainer,

    pub modifiers: Vec<AttributeModifier>,
}

impl EffectDefinition {
    /// Creates an instant effect with no content.
    pub fn new(effect_tag: impl Into<Tag>) -> Self {
        Self {
            effect_tag: effect_tag.into(),
            instant: true,
            delay: 0.0,
            duration: 0.0,
            period: 0.0,
            period_tick_at_start: false,
            client_grace_time: EffectConfig::DEFAULT_CLIENT_GRACE_TIME,
            stack_attribute: None,
            metadata: TagContainer::new(),
            dispel_tags: TagContainer::new(),
            dispel_granted_filter: TagContainer::new(),
            granted_tags: TagContainer::new(),
            application_must_have: TagContainer::new(),
            application_must_not_have: TagContainer::new(),
            must_have: TagContainer::new(),
            must_not_have: TagContainer::new(),
            granted_abilities: TagContainer::new(),
            removed_abilities: TagContainer::new(),
            pause_periodic_tags: TagContainer::new(),
            cancel_abilities_on_activation: TagContainer::new(),
            modifiers: Vec::new(),
        }
    }

    /// Makes the effect last `duration` seconds (non-instant).
    #[must_use]
    pub fn with_duration(mut self, duration: f64) -> Self {
        self.instant = false;
        self.duration = duration.max(0.0);
        self
    }

    /// Makes the effect last until something ends it (non-instant).
    #[must_use]
    pub fn infinite(mut self) -> Self {
        self.instant = false;
        self.duration = 0.0;
        self
    }

    /// Makes the effect periodic (non-instant).
    ///
    /// A period of zero or less makes the effect non-periodic. Positive
    /// periods below [`EffectConfig::MIN_PERIOD`] are raised to it.
    #[must_use]
    pub fn with_period(mut self, period: f64) -> Self {
        if period > 0.0 {
            self.instant = false;
            self.period = period.max(EffectConfig::MIN_PERIOD);
        } else {
            self.period = 0.0;
        }
        self
    }

    #[must_use]
    pub fn with_period_tick_at_start(mut self) -> Self {
        self.period_tick_at_start = true;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: f64) -> Self {
        self.delay = delay.max(0.0);
        self
    }

    #[must_use]
    pub fn with_client_grace_time(mut self, grace: f64) -> Self {
        self.client_grace_time = grace.max(0.0);
        self
    }

    #[must_use]
    pub fn with_stack_attribute(mut self, attribute: impl Into<Tag>) -> Self {
        self.stack_attribute = Some(attribute.into());
        self
    }

    #[must_use]
    pub fn with_modifier(mut self, modifier: AttributeModifier) -> Self {
        self.modifiers.push(modifier);
        self
    }

    #[must_use]
    pub fn with_metadata(mut self, tags: TagContainer) -> Self {
        self.metadata = tags;
        self
    }

    #[must_use]
    pub fn with_dispel(mut self, dispel_tags: TagContainer, granted_filter: TagContainer) -> Self {
        self.dispel_tags = dispel_tags;
        self.dispel_granted_filter = granted_filter;
        self
    }

    #[must_use]
    pub fn with_granted_tags(mut self, tags: TagContainer) -> Self {
        self.granted_tags = tags;
        self
    }

    #[must_use]
    pub fn with_application_must_have(mut self, tags: TagContainer) -> Self {
        self.application_must_have = tags;
        self
    }

    #[must_use]
    pub fn with_application_must_not_have(mut self, tags: TagContainer) -> Self {
        self.application_must_not_have = tags;
        self
    }

    #[must_use]
    pub fn with_must_have(mut self, tags: TagContainer) -> Self {
        self.must_have = tags;
        self
    }

    #[must_use]
    pub fn with_must_not_have(mut self, tags: TagContainer) -> Self {
        self.must_not_have = tags;
        self
    }

    #[must_use]
    pub fn with_granted_abilities(mut self, tags: TagContainer) -> Self {
        self.granted_abilities = tags;
        self
    }

    #[must_use]
    pub fn with_removed_abilities(mut self, tags: TagContainer) -> Self {
        self.removed_abilities = tags;
        self
    }

    #[must_use]
    pub fn with_pause_periodic_tags(mut self, tags: TagContainer) -> Self {
        self.pause_periodic_tags = tags;
        self
    }

    #[must_use]
    pub fn with_cancel_abilities_on_activation(mut self, tags: TagContainer) -> Self {
        self.cancel_abilities_on_activation = tags;
        self
    }

    pub fn is_periodic(&self) -> bool {
        !self.instant && self.period > 0.0
    }

    pub fn is_infinite(&self) -> bool {
        !self.instant && self.duration == 0.0
    }

    /// The stack attribute, if one is set and names something.
    pub fn stack_attribute(&self) -> Option<&Tag> {
        self.stack_attribute.as_ref().filter(|tag| tag.is_valid())
    }

    /// Returns true if applying this definition can have any observable result.
    pub fn is_valid(&self) -> bool {
        !self.granted_tags.is_empty()
            || !self.granted_abilities.is_empty()
            || !self.removed_abilities.is_empty()
            || !self.modifiers.is_empty()
            || !self.must_have.is_empty()
            || !self.must_not_have.is_empty()
            || !self.metadata.is_empty()
            || !self.dispel_granted_filter.is_empty()
    }
}

impl Default for EffectDefinition {
    fn default() -> Self {
        Self::new(Tag::empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_definitions_are_instant() {
        let definition = EffectDefinition::new("Effect.Heal");
        assert!(definition.instant);
        assert!(!definition.is_periodic());
        assert!(!definition.is_infinite());
    }

    #[test]
    fn period_makes_effect_non_instant_and_is_clamped() {
        let definition = EffectDefinition::new("Effect.Burn").with_period(0.001);
        assert!(!definition.instant);
        assert!(definition.is_periodic());
        assert_eq!(definition.period, EffectConfig::MIN_PERIOD);
    }

    #[test]
    fn zero_period_is_not_periodic() {
        let definition = EffectDefinition::new("Effect.Aura")
            .with_duration(2.0)
            .with_period(0.0);
        assert!(!definition.is_periodic());
        assert_eq!(definition.period, 0.0);
        assert!(!definition.instant);
    }

    #[test]
    fn infinite_has_zero_duration() {
        let definition = EffectDefinition::new("Effect.Aura").with_duration(3.0).infinite();
        assert!(definition.is_infinite());
    }

    #[test]
    fn empty_stack_attribute_is_ignored() {
        let definition = EffectDefinition::new("Effect.Bleed").with_stack_attribute("");
        assert!(definition.stack_attribute().is_none());
    }

    #[test]
    fn validity_requires_observable_content() {
        assert!(!EffectDefinition::new("Effect.Nothing").is_valid());
        assert!(EffectDefinition::new("Effect.Heal")
            .with_modifier(AttributeModifier::add("Attribute.Health", 10.0))
            .is_valid());
        assert!(EffectDefinition::new("Effect.Tagged")
            .with_granted_tags(["State.Shielded"].into_iter().collect())
            .is_valid());
    }
}
