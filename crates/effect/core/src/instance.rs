//! The effect lifecycle state machine.
//!
//! An [`EffectInstance`] is one application of an [`EffectDefinition`] to an
//! owner. It is created by the owner, initialized once, then driven by one
//! [`EffectInstance::tick`] per simulation step until it reaches
//! [`EffectState::Ended`].
//!
//! # Replay
//!
//! Every decision reads only the definition, the instance's own fields and
//! the owner (clock, tags, attributes, registry). Re-running the same steps
//! from a snapshot therefore produces the same side effects, and
//! [`EffectInstance::end_effect`] is guarded so an instance re-ticked past
//! its own end does nothing.
//!
//! # Side effects
//!
//! Starting grants tags and abilities, removes abilities, cancels running
//! abilities, asks the owner to dispel, and applies modifiers. Ending reverts
//! exactly what starting applied, once. Instant effects apply once and never
//! revert.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, error, trace, warn};

use crate::definition::EffectDefinition;
use crate::error::InitializeError;
use crate::gate::TagGate;
use crate::hooks::{EffectHooks, NoopHooks};
use crate::modifier::{AttributeModifier, ModifierFlags};
use crate::owner::EffectOwner;
use crate::tag::Tag;
use crate::types::{EffectId, EffectState, SourceId};

/// Parameters of one application, supplied by the owner at initialization.
///
/// Confirmed times come from the authority. When present (and non-zero) they
/// replace the locally predicted `clock + delay` / `start + duration`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EffectApplication {
    pub source: Option<SourceId>,
    pub confirmed_start: Option<f64>,
    pub confirmed_end: Option<f64>,
}

impl EffectApplication {
    /// A locally predicted application.
    pub fn predicted() -> Self {
        Self::default()
    }

    /// An application whose timing is dictated by the authority.
    pub fn confirmed(start_time: f64, end_time: f64) -> Self {
        Self {
            source: None,
            confirmed_start: Some(start_time),
            confirmed_end: Some(end_time),
        }
    }

    #[must_use]
    pub fn with_source(mut self, source: SourceId) -> Self {
        self.source = Some(source);
        self
    }

    fn start(&self) -> Option<f64> {
        self.confirmed_start.filter(|time| *time != 0.0)
    }

    fn end(&self) -> Option<f64> {
        self.confirmed_end.filter(|time| *time != 0.0)
    }
}

/// One running application of an effect.
///
/// Equality is identity: two instances are equal when they carry the same
/// registry id and effect tag.
#[derive(Clone, Debug)]
pub struct EffectInstance {
    id: EffectId,
    definition: EffectDefinition,
    hooks: Arc<dyn EffectHooks>,
    source: Option<SourceId>,

    state: EffectState,
    initialized: bool,
    started: bool,
    completed: bool,
    negate_at_end: bool,

    current_duration: f64,
    start_time: f64,
    end_time: f64,
    prev_period_phase: f64,

    client_application_time: f64,
    confirmed: bool,

    supersede_pending: bool,
}

impl EffectInstance {
    pub fn new(id: EffectId, definition: EffectDefinition, hooks: Arc<dyn EffectHooks>) -> Self {
        Self {
            id,
            definition,
            hooks,
            source: None,
            state: EffectState::Initialized,
            initialized: false,
            started: false,
            completed: false,
            negate_at_end: false,
            current_duration: 0.0,
            start_time: 0.0,
            end_time: 0.0,
            prev_period_phase: 0.0,
            client_application_time: 0.0,
            confirmed: false,
            supersede_pending: false,
        }
    }

    /// Creates an instance with [`NoopHooks`].
    pub fn with_default_hooks(id: EffectId, definition: EffectDefinition) -> Self {
        Self::new(id, definition, Arc::new(NoopHooks))
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn id(&self) -> EffectId {
        self.id
    }

    pub fn definition(&self) -> &EffectDefinition {
        &self.definition
    }

    pub fn effect_tag(&self) -> &Tag {
        &self.definition.effect_tag
    }

    pub fn hooks(&self) -> &Arc<dyn EffectHooks> {
        &self.hooks
    }

    pub fn source(&self) -> Option<SourceId> {
        self.source
    }

    pub fn state(&self) -> EffectState {
        self.state
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// True once the start gate passed and start-time side effects were applied.
    pub fn has_started(&self) -> bool {
        self.started
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// True when ending will reverse the start-time modifiers.
    pub fn negates_at_end(&self) -> bool {
        self.negate_at_end
    }

    /// Seconds this instance has been ticked for.
    pub fn current_duration(&self) -> f64 {
        self.current_duration
    }

    pub fn total_duration(&self) -> f64 {
        self.definition.duration
    }

    pub fn start_time(&self) -> f64 {
        self.start_time
    }

    pub fn end_time(&self) -> f64 {
        self.end_time
    }

    pub fn prev_period_phase(&self) -> f64 {
        self.prev_period_phase
    }

    /// Owner clock at the moment this instance was initialized.
    pub fn client_application_time(&self) -> f64 {
        self.client_application_time
    }

    /// True when start/end times come from the authority.
    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    /// Clock value after which an unconfirmed prediction is overdue.
    pub fn confirmation_deadline(&self) -> f64 {
        self.client_application_time + self.definition.client_grace_time
    }

    /// Returns true if this is a live, unconfirmed prediction past its grace window.
    pub fn is_confirmation_overdue(&self, clock: f64) -> bool {
        self.initialized
            && !self.confirmed
            && self.state != EffectState::Ended
            && clock > self.confirmation_deadline()
    }

    // ========================================================================
    // Owner-side adjustments
    // ========================================================================

    /// Overwrites predicted timing with timing confirmed by the authority.
    ///
    /// A zero time is unset and keeps the prediction. A timed effect whose
    /// confirmed end falls before its start runs for its full duration.
    pub fn confirm_timing(&mut self, start_time: f64, end_time: f64) {
        let confirmed = EffectApplication::confirmed(start_time, end_time);
        let start = confirmed.start().unwrap_or(self.start_time);
        let mut end = match (confirmed.start(), confirmed.end()) {
            (_, Some(end)) => end,
            (Some(start), None) => start + self.definition.duration,
            (None, None) => self.end_time,
        };
        if self.definition.duration > 0.0 && end < start {
            warn!(
                effect = %self.definition.effect_tag,
                id = %self.id,
                start_time = start,
                end_time = end,
                "confirmed end precedes start"
            );
            end = start + self.definition.duration;
        }

        debug!(
            effect = %self.definition.effect_tag,
            id = %self.id,
            predicted_start = self.start_time,
            predicted_end = self.end_time,
            start_time = start,
            end_time = end,
            "confirmed effect timing"
        );
        self.start_time = start;
        self.end_time = end;
        self.confirmed = true;
    }

    /// Replaces the hooks, e.g. after restoring an instance from a snapshot.
    pub fn rebind_hooks(&mut self, hooks: Arc<dyn EffectHooks>) {
        self.hooks = hooks;
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Binds the instance to its owner's clock and computes its timing.
    ///
    /// Without an owner the instance stays inert: it is never ticked and
    /// never starts.
    pub fn initialize(
        &mut self,
        owner: Option<&dyn EffectOwner>,
        application: EffectApplication,
    ) -> Result<(), InitializeError> {
        let Some(owner) = owner else {
            error!(
                effect = %self.definition.effect_tag,
                id = %self.id,
                "effect initialized without an owner"
            );
            return Err(InitializeError::MissingOwner { id: self.id });
        };

        let clock = owner.clock();
        self.source = application.source;
        self.client_application_time = clock;

        self.start_time = application
            .start()
            .unwrap_or(clock + self.definition.delay);
        self.end_time = application
            .end()
            .unwrap_or(self.start_time + self.definition.duration);
        self.confirmed = application.start().is_some() || application.end().is_some();
        self.initialized = true;

        Ok(())
    }

    /// Starts the effect, or ends it straight away if the application gate fails.
    pub fn start_effect(&mut self, owner: &mut dyn EffectOwner) {
        if self.completed {
            return;
        }

        if !TagGate::admits_application(&self.definition, &*owner) {
            debug!(
                effect = %self.definition.effect_tag,
                id = %self.id,
                "application gate rejected effect"
            );
            self.end_effect(owner);
            return;
        }

        self.started = true;

        for tag in &self.definition.granted_tags {
            owner.add_active_tag(tag);
        }
        for ability in &self.definition.granted_abilities {
            owner.grant_ability(ability);
        }
        for ability in &self.definition.removed_abilities {
            owner.remove_granted_ability(ability);
        }
        for ability in &self.definition.cancel_abilities_on_activation {
            owner.end_active_abilities(ability);
        }
        owner.dispel_effects(&self.definition);

        if self.definition.instant {
            self.apply_modifiers(owner, ModifierFlags::BASE);
            self.end_effect(owner);
            return;
        }

        if let Some(stack) = self.stack_attribute_on(&*owner) {
            let increment = AttributeModifier::add(stack, 1.0);
            owner.apply_modifier(&increment, ModifierFlags::empty(), self.source);
        }

        // Flat (non-periodic) effects hold their modifiers until they end.
        if self.definition.period == 0.0 {
            self.negate_at_end = true;
            self.apply_modifiers(owner, ModifierFlags::empty());
        }

        let hooks = Arc::clone(&self.hooks);
        hooks.on_start(self, owner);

        if self.definition.period_tick_at_start && self.definition.period > 0.0 {
            self.period_tick(owner);
        }

        if !self.completed {
            self.transition(EffectState::Started);
            self.supersede_pending = true;
        }
    }

    /// Finalizes the effect. Safe to call any number of times.
    pub fn end_effect(&mut self, owner: &mut dyn EffectOwner) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.transition(EffectState::Ended);

        if !self.started {
            return;
        }

        if let Some(stack) = self.stack_attribute_on(&*owner) {
            let shared = owner
                .active_effects()
                .has_started_on_stack(&stack, self.id);
            if !shared {
                let reset = AttributeModifier::add(stack.clone(), owner.attribute_value(&stack));
                owner.apply_modifier(&reset, ModifierFlags::NEGATING, self.source);
            }
        }

        if self.negate_at_end {
            self.apply_modifiers(owner, ModifierFlags::NEGATING);
        }

        if !self.definition.instant {
            self.remove_tags_from_owner(owner);
            for ability in &self.definition.removed_abilities {
                owner.grant_ability(ability);
            }
            for ability in &self.definition.granted_abilities {
                owner.remove_granted_ability(ability);
            }
        }

        let hooks = Arc::clone(&self.hooks);
        hooks.on_end(self, owner);
    }

    /// Advances the instance by one simulation step.
    pub fn tick(&mut self, owner: &mut dyn EffectOwner, dt: f64) {
        if !self.initialized || self.completed {
            return;
        }

        self.current_duration += dt;
        let hooks = Arc::clone(&self.hooks);
        hooks.on_tick(self, owner, dt);

        if !TagGate::admits_maintenance(&self.definition, &*owner) {
            debug!(
                effect = %self.definition.effect_tag,
                id = %self.id,
                "maintenance gate ended effect"
            );
            self.end_effect(owner);
        }

        if self.definition.period > 0.0
            && self.state == EffectState::Started
            && !self.is_period_paused(&*owner)
        {
            // A wrap of `clock mod period` means a period boundary was crossed
            // since the previous step, whatever the step size.
            let phase = owner.clock() % self.definition.period;
            if phase < self.prev_period_phase {
                self.period_tick(owner);
            }
            self.prev_period_phase = phase;
        }

        self.check_state(owner);
    }

    /// Fires one periodic tick.
    pub fn period_tick(&mut self, owner: &mut dyn EffectOwner) {
        let hooks = Arc::clone(&self.hooks);
        if hooks.dynamic_condition(self, &*owner) {
            trace!(
                effect = %self.definition.effect_tag,
                id = %self.id,
                clock = owner.clock(),
                "periodic tick"
            );
            self.apply_modifiers(owner, ModifierFlags::PERIODIC);
        }
        hooks.on_period_tick(self, owner);
    }

    /// Starts a due instance or expires an elapsed one.
    pub fn check_state(&mut self, owner: &mut dyn EffectOwner) {
        if !self.initialized {
            return;
        }
        match self.state {
            EffectState::Initialized => {
                if owner.clock() >= self.start_time {
                    self.start_effect(owner);
                }
            }
            EffectState::Started => {
                if self.definition.duration != 0.0 && owner.clock() >= self.end_time {
                    self.end_effect(owner);
                }
            }
            EffectState::Ended => {}
        }
    }

    pub fn is_period_paused(&self, owner: &dyn EffectOwner) -> bool {
        TagGate::pauses_periodic(&self.definition, owner)
    }

    /// Consumes the "just started" marker used to supersede same-tag instances.
    pub(crate) fn take_supersession(&mut self) -> bool {
        std::mem::take(&mut self.supersede_pending)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn transition(&mut self, next: EffectState) {
        if next <= self.state {
            return;
        }
        debug!(
            effect = %self.definition.effect_tag,
            id = %self.id,
            from = %self.state,
            to = %next,
            "effect state transition"
        );
        self.state = next;
    }

    fn apply_modifiers(&self, owner: &mut dyn EffectOwner, flags: ModifierFlags) {
        for modifier in &self.definition.modifiers {
            owner.apply_modifier(modifier, flags, self.source);
        }
    }

    /// Removes granted tags that no other started instance still grants.
    fn remove_tags_from_owner(&self, owner: &mut dyn EffectOwner) {
        if self.definition.granted_tags.is_empty() {
            return;
        }
        let still_granted = owner
            .active_effects()
            .granted_by_started(&self.definition.granted_tags, self.id);
        for tag in self.definition.granted_tags.difference(&still_granted).iter() {
            owner.remove_active_tag(tag);
        }
    }

    fn stack_attribute_on(&self, owner: &dyn EffectOwner) -> Option<Tag> {
        self.definition
            .stack_attribute()
            .filter(|stack| owner.attribute_exists(stack))
            .cloned()
    }

    #[cfg(feature = "serde")]
    pub(crate) fn restore_parts(
        id: EffectId,
        definition: EffectDefinition,
        hooks: Arc<dyn EffectHooks>,
        parts: RestoredParts,
    ) -> Self {
        Self {
            id,
            definition,
            hooks,
            source: parts.source,
            state: parts.state,
            initialized: parts.initialized,
            started: parts.started,
            completed: parts.completed,
            negate_at_end: parts.negate_at_end,
            current_duration: parts.current_duration,
            start_time: parts.start_time,
            end_time: parts.end_time,
            prev_period_phase: parts.prev_period_phase,
            client_application_time: parts.client_application_time,
            confirmed: parts.confirmed,
            supersede_pending: false,
        }
    }
}

/// Runtime fields carried by a snapshot, minus identity, definition and hooks.
#[cfg(feature = "serde")]
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RestoredParts {
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

impl PartialEq for EffectInstance {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.definition.effect_tag == other.definition.effect_tag
    }
}

impl Eq for EffectInstance {}

impl fmt::Display for EffectInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[id: {}] [tag: {}] (state {}) (duration: {:.3}) (current: {:.3})",
            self.id.0,
            self.definition.effect_tag,
            self.state,
            self.definition.duration,
            self.current_duration
        )
    }
}
