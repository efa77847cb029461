//! Attribute modifiers carried by effect definitions.

use bitflags::bitflags;

use crate::tag::Tag;

/// How a modifier combines with the attribute value.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ModifierOp {
    /// `value += delta`
    #[default]
    Add,
    /// `value *= delta`
    Multiply,
}

/// A signed numeric change to one attribute.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AttributeModifier {
    pub attribute: Tag,
    pub value: f64,
    pub op: ModifierOp,
}

impl AttributeModifier {
    pub fn new(attribute: impl Into<Tag>, value: f64, op: ModifierOp) -> Self {
        Self {
            attribute: attribute.into(),
            value,
            op,
        }
    }

    pub fn add(attribute: impl Into<Tag>, value: f64) -> Self {
        Self::new(attribute, value, ModifierOp::Add)
    }

    pub fn multiply(attribute: impl Into<Tag>, value: f64) -> Self {
        Self::new(attribute, value, ModifierOp::Multiply)
    }

    /// Returns the modifier that undoes this one.
    ///
    /// A zero multiplier cannot be undone and yields `None`.
    pub fn inverted(&self) -> Option<Self> {
        let value = match self.op {
            ModifierOp::Add => -self.value,
            ModifierOp::Multiply if self.value == 0.0 => return None,
            ModifierOp::Multiply => self.value.recip(),
        };
        Some(Self {
            attribute: self.attribute.clone(),
            value,
            op: self.op,
        })
    }
}

bitflags! {
    /// How an owner should treat an applied modifier.
    ///
    /// No flags means a plain, maintained application.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ModifierFlags: u8 {
        /// Applied by a periodic tick.
        const PERIODIC = 1 << 0;
        /// Reverses a previous application.
        const NEGATING = 1 << 1;
        /// Permanent change to the base value, as applied by instant effects.
        const BASE = 1 << 2;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_inverts_to_negated_delta() {
        let modifier = AttributeModifier::add("Attribute.Speed", 150.0);
        let inverse = modifier.inverted().unwrap();
        assert_eq!(inverse.value, -150.0);
        assert_eq!(inverse.op, ModifierOp::Add);
    }

    #[test]
    fn multiply_inverts_to_reciprocal() {
        let modifier = AttributeModifier::multiply("Attribute.Speed", 4.0);
        assert_eq!(modifier.inverted().unwrap().value, 0.25);
        assert!(AttributeModifier::multiply("Attribute.Speed", 0.0)
            .inverted()
            .is_none());
    }

    #[test]
    fn op_parses_from_snake_case() {
        assert_eq!("multiply".parse::<ModifierOp>().unwrap(), ModifierOp::Multiply);
        assert_eq!(ModifierOp::Add.to_string(), "add");
    }
}
