use std::fmt;

/// Registry-assigned identifier of one effect application.
///
/// Identifiers are allocated by the owner, monotonically, and never reused
/// within one simulation run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectId(pub u32);

impl EffectId {
    pub const fn next(self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier of the component that applied an effect.
///
/// Forwarded untouched to every modifier application so owners can attribute
/// damage, threat and similar to the instigator.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SourceId(pub u32);

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "src#{}", self.0)
    }
}

/// Lifecycle state of an effect instance.
///
/// Only ever advances `Initialized → Started → Ended`; `Initialized → Ended`
/// is taken when the effect is rejected or cancelled before it starts.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    strum::Display,
    strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum EffectState {
    /// Created but not active yet (delayed effects wait here).
    #[default]
    Initialized,
    /// Active and ticking.
    Started,
    /// Terminal.
    Ended,
}
