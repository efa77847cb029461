//! Customization points of the effect lifecycle.
//!
//! Hooks are the only way to extend what an effect does. They are shared
//! (`Arc`) between instances of the same effect and receive the instance and
//! its owner on every call, so any per-instance state belongs in the owner's
//! attributes or tags, where it is snapshotted and replayed like everything
//! else.
//!
//! # Call order
//!
//! - `on_start`: after grants, dispel and start-time modifiers, before the
//!   optional tick-at-start and before the instance enters `Started`.
//! - `on_tick`: first thing every step, right after the duration is accumulated.
//! - `on_period_tick`: on every period boundary, whether or not the dynamic
//!   condition allowed the modifiers through.
//! - `on_end`: last step of finalization, only for effects that started.

use std::fmt;

use crate::instance::EffectInstance;
use crate::owner::EffectOwner;

/// Overridable lifecycle hooks. Every method has a no-op default.
pub trait EffectHooks: fmt::Debug + Send + Sync {
    fn on_start(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner) {}

    fn on_end(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner) {}

    fn on_tick(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner, _dt: f64) {}

    fn on_period_tick(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner) {}

    /// Gates modifier application on periodic ticks without ending the effect.
    ///
    /// A sprint that drains stamina only while the owner is actually moving
    /// is the typical use. Defaults to always true.
    fn dynamic_condition(&self, _effect: &EffectInstance, _owner: &dyn EffectOwner) -> bool {
        true
    }
}

/// Hooks that do nothing.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopHooks;

impl EffectHooks for NoopHooks {}
