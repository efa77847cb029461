//! Numeric attribute store of an ability component.
//!
//! Instant and periodic changes alter the base value. Modifiers held by a
//! running effect are aggregated on top of it, so reverting one removes its
//! contribution exactly even when the current value was clamped.

use std::collections::BTreeMap;

use effect_core::{AttributeModifier, ModifierFlags, ModifierOp, Tag};
use serde::{Deserialize, Serialize};

/// One attribute: base value, held modifier aggregate and optional clamp.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub base: f64,
    pub current: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
    held_add: f64,
    held_multiplier: f64,
}

impl Attribute {
    pub fn new(base: f64) -> Self {
        Self {
            base,
            current: base,
            min: None,
            max: None,
            held_add: 0.0,
            held_multiplier: 1.0,
        }
    }

    #[must_use]
    pub fn with_clamp(mut self, min: f64, max: f64) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self.base = self.clamp(self.base);
        self.recompute();
        self
    }

    fn clamp(&self, value: f64) -> f64 {
        let value = self.min.map_or(value, |min| value.max(min));
        self.max.map_or(value, |max| value.min(max))
    }

    fn recompute(&mut self) {
        self.current = self.clamp((self.base + self.held_add) * self.held_multiplier);
    }

    fn change_base(&mut self, op: ModifierOp, value: f64) {
        let next = match op {
            ModifierOp::Add => self.base + value,
            ModifierOp::Multiply => self.base * value,
        };
        self.base = self.clamp(next);
    }

    fn hold(&mut self, op: ModifierOp, value: f64) {
        match op {
            ModifierOp::Add => self.held_add += value,
            ModifierOp::Multiply => self.held_multiplier *= value,
        }
    }
}

/// Attributes keyed by tag, iterated in tag order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeSet {
    attributes: BTreeMap<Tag, Attribute>,
}

impl AttributeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an attribute.
    pub fn define(&mut self, tag: impl Into<Tag>, attribute: Attribute) {
        self.attributes.insert(tag.into(), attribute);
    }

    pub fn contains(&self, tag: &Tag) -> bool {
        self.attributes.contains_key(tag)
    }

    pub fn get(&self, tag: &Tag) -> Option<&Attribute> {
        self.attributes.get(tag)
    }

    pub fn value(&self, tag: &Tag) -> Option<f64> {
        self.attributes.get(tag).map(|attribute| attribute.current)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Tag, &Attribute)> {
        self.attributes.iter()
    }

    /// Applies `modifier`, reversed when `flags` has [`ModifierFlags::NEGATING`].
    ///
    /// [`ModifierFlags::BASE`] and [`ModifierFlags::PERIODIC`] change the base
    /// value; anything else is held until negated.
    ///
    /// Returns the new current value, or `None` when the attribute does not
    /// exist or the modifier cannot be reversed (a zero multiplier).
    pub fn apply(&mut self, modifier: &AttributeModifier, flags: ModifierFlags) -> Option<f64> {
        let attribute = self.attributes.get_mut(&modifier.attribute)?;
        let (op, value) = if flags.contains(ModifierFlags::NEGATING) {
            let inverse = modifier.inverted()?;
            (inverse.op, inverse.value)
        } else {
            (modifier.op, modifier.value)
        };

        if flags.intersects(ModifierFlags::BASE | ModifierFlags::PERIODIC) {
            attribute.change_base(op, value);
        } else {
            attribute.hold(op, value);
        }
        attribute.recompute();
        Some(attribute.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn health() -> Tag {
        Tag::new("Attribute.Health")
    }

    #[test]
    fn add_and_its_negation_cancel_out() {
        let mut set = AttributeSet::new();
        set.define(health(), Attribute::new(100.0));
        let modifier = AttributeModifier::add(health(), 15.0);

        assert_eq!(set.apply(&modifier, ModifierFlags::empty()), Some(115.0));
        assert_eq!(set.apply(&modifier, ModifierFlags::NEGATING), Some(100.0));
    }

    #[test]
    fn multiply_negates_by_division() {
        let mut set = AttributeSet::new();
        set.define("Attribute.Speed", Attribute::new(300.0));
        let modifier = AttributeModifier::multiply("Attribute.Speed", 1.5);

        assert_eq!(set.apply(&modifier, ModifierFlags::empty()), Some(450.0));
        assert_eq!(set.apply(&modifier, ModifierFlags::NEGATING), Some(300.0));
    }

    #[test]
    fn zero_multiplier_cannot_be_negated() {
        let mut set = AttributeSet::new();
        set.define("Attribute.Speed", Attribute::new(300.0));
        let freeze = AttributeModifier::multiply("Attribute.Speed", 0.0);

        assert_eq!(set.apply(&freeze, ModifierFlags::empty()), Some(0.0));
        assert_eq!(set.apply(&freeze, ModifierFlags::NEGATING), None);
        assert_eq!(set.value(&Tag::new("Attribute.Speed")), Some(0.0));
    }

    #[test]
    fn values_are_clamped() {
        let mut set = AttributeSet::new();
        set.define(health(), Attribute::new(90.0).with_clamp(0.0, 100.0));

        assert_eq!(
            set.apply(&AttributeModifier::add(health(), 50.0), ModifierFlags::empty()),
            Some(100.0)
        );
        assert_eq!(
            set.apply(&AttributeModifier::add(health(), -500.0), ModifierFlags::PERIODIC),
            Some(0.0)
        );
        assert_eq!(set.get(&health()).unwrap().base, 0.0);
    }

    #[test]
    fn reverting_a_clamped_hold_restores_the_previous_value() {
        let mut set = AttributeSet::new();
        set.define(health(), Attribute::new(90.0).with_clamp(0.0, 100.0));
        let fortify = AttributeModifier::add(health(), 50.0);

        assert_eq!(set.apply(&fortify, ModifierFlags::empty()), Some(100.0));
        assert_eq!(set.apply(&fortify, ModifierFlags::NEGATING), Some(90.0));
    }

    #[test]
    fn base_changes_survive_reverting_a_hold() {
        let mut set = AttributeSet::new();
        set.define(health(), Attribute::new(80.0).with_clamp(0.0, 100.0));
        let fortify = AttributeModifier::add(health(), 30.0);

        assert_eq!(set.apply(&fortify, ModifierFlags::empty()), Some(100.0));
        assert_eq!(
            set.apply(&AttributeModifier::add(health(), -20.0), ModifierFlags::BASE),
            Some(90.0)
        );
        assert_eq!(set.apply(&fortify, ModifierFlags::NEGATING), Some(60.0));
        assert_eq!(set.get(&health()).unwrap().base, 60.0);
    }

    #[test]
    fn unknown_attribute_is_ignored() {
        let mut set = AttributeSet::new();
        let modifier = AttributeModifier::add("Attribute.Mana", 5.0);
        assert_eq!(set.apply(&modifier, ModifierFlags::empty()), None);
        assert!(!set.contains(&Tag::new("Attribute.Mana")));
    }
}
