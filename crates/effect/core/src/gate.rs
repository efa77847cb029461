//! Tag gates deciding whether an effect may start or keep running.
//!
//! Gates are pure predicates over the owner's active tags. Empty must-have
//! sets are vacuously satisfied and empty must-not-have sets are vacuously
//! clear.

use crate::definition::EffectDefinition;
use crate::tag::{Tag, TagContainer};

/// Read access to an owner's active tag set.
pub trait ActiveTags {
    /// Returns true if any active tag matches `tag` (hierarchically).
    fn has_active_tag(&self, tag: &Tag) -> bool;
}

impl ActiveTags for TagContainer {
    fn has_active_tag(&self, tag: &Tag) -> bool {
        self.has_tag(tag)
    }
}

/// Stateless tag-gate evaluator.
#[derive(Clone, Copy, Debug, Default)]
pub struct TagGate;

impl TagGate {
    /// Returns true if the owner has at least one tag of `tags`.
    pub fn has_any<A: ActiveTags + ?Sized>(active: &A, tags: &TagContainer) -> bool {
        tags.iter().any(|tag| active.has_active_tag(tag))
    }

    /// Must-have check: empty sets pass, otherwise one tag must be present.
    pub fn requires<A: ActiveTags + ?Sized>(active: &A, must_have: &TagContainer) -> bool {
        must_have.is_empty() || Self::has_any(active, must_have)
    }

    /// Must-not-have check: passes when none of the tags are present.
    pub fn excludes<A: ActiveTags + ?Sized>(active: &A, must_not_have: &TagContainer) -> bool {
        !Self::has_any(active, must_not_have)
    }

    /// Maintenance gate, evaluated every step.
    pub fn admits_maintenance<A: ActiveTags + ?Sized>(
        definition: &EffectDefinition,
        active: &A,
    ) -> bool {
        Self::requires(active, &definition.must_have)
            && Self::excludes(active, &definition.must_not_have)
    }

    /// Application gate, evaluated once when the effect starts.
    ///
    /// Both the application and the maintenance sets must pass. The two
    /// must-have sets are checked independently: one tag from each.
    pub fn admits_application<A: ActiveTags + ?Sized>(
        definition: &EffectDefinition,
        active: &A,
    ) -> bool {
        Self::requires(active, &definition.application_must_have)
            && Self::excludes(active, &definition.application_must_not_have)
            && Self::admits_maintenance(definition, active)
    }

    /// Periodic ticks are paused while the owner has any pause tag.
    pub fn pauses_periodic<A: ActiveTags + ?Sized>(
        definition: &EffectDefinition,
        active: &A,
    ) -> bool {
        Self::has_any(active, &definition.pause_periodic_tags)
    }
}
