//! In-memory owner and recording hooks shared by the unit tests.

use std::collections::BTreeMap;
use std::sync::Mutex;

use crate::definition::EffectDefinition;
use crate::gate::ActiveTags;
use crate::hooks::EffectHooks;
use crate::instance::EffectInstance;
use crate::modifier::{AttributeModifier, ModifierFlags, ModifierOp};
use crate::owner::EffectOwner;
use crate::registry::{self, ActiveEffects};
use crate::tag::{Tag, TagContainer};
use crate::types::EffectId;

pub fn tags(names: &[&str]) -> TagContainer {
    names.iter().copied().collect()
}

#[derive(Clone, Debug, PartialEq)]
pub struct TestOwner {
    pub clock: f64,
    pub tags: TagContainer,
    pub attributes: BTreeMap<Tag, f64>,
    pub applications: Vec<(AttributeModifier, ModifierFlags)>,
    pub granted_abilities: TagContainer,
    pub active_abilities: TagContainer,
    pub dispel_calls: usize,
    pub effects: ActiveEffects,
    next_id: EffectId,
}

impl TestOwner {
    pub fn new() -> Self {
        Self {
            clock: 0.0,
            tags: TagContainer::new(),
            attributes: BTreeMap::new(),
            applications: Vec::new(),
            granted_abilities: TagContainer::new(),
            active_abilities: TagContainer::new(),
            dispel_calls: 0,
            effects: ActiveEffects::default(),
            next_id: EffectId(1),
        }
    }

    pub fn with_attribute(mut self, name: &str, value: f64) -> Self {
        self.attributes.insert(Tag::new(name), value);
        self
    }

    pub fn attribute(&self, name: &str) -> f64 {
        self.attributes.get(&Tag::new(name)).copied().unwrap_or_default()
    }

    pub fn allocate_id(&mut self) -> EffectId {
        let id = self.next_id;
        self.next_id = id.next();
        id
    }
}

impl ActiveTags for TestOwner {
    fn has_active_tag(&self, tag: &Tag) -> bool {
        self.tags.has_active_tag(tag)
    }
}

impl EffectOwner for TestOwner {
    fn clock(&self) -> f64 {
        self.clock
    }

    fn apply_modifier(
        &mut self,
        modifier: &AttributeModifier,
        flags: ModifierFlags,
        _source: Option<crate::types::SourceId>,
    ) {
        self.applications.push((modifier.clone(), flags));
        let effective = if flags.contains(ModifierFlags::NEGATING) {
            match modifier.inverted() {
                Some(inverse) => inverse,
                None => return,
            }
        } else {
            modifier.clone()
        };
        if let Some(value) = self.attributes.get_mut(&effective.attribute) {
            match effective.op {
                ModifierOp::Add => *value += effective.value,
                ModifierOp::Multiply => *value *= effective.value,
            }
        }
    }

    fn add_active_tag(&mut self, tag: &Tag) {
        self.tags.insert(tag.clone());
    }

    fn remove_active_tag(&mut self, tag: &Tag) {
        self.tags.remove(tag);
    }

    fn grant_ability(&mut self, ability: &Tag) {
        self.granted_abilities.insert(ability.clone());
    }

    fn remove_granted_ability(&mut self, ability: &Tag) {
        self.granted_abilities.remove(ability);
    }

    fn end_active_abilities(&mut self, ability: &Tag) {
        self.active_abilities = self
            .active_abilities
            .iter()
            .filter(|active| !active.matches(ability))
            .cloned()
            .collect();
    }

    fn attribute_exists(&self, attribute: &Tag) -> bool {
        self.attributes.contains_key(attribute)
    }

    fn attribute_value(&self, attribute: &Tag) -> f64 {
        self.attributes.get(attribute).copied().unwrap_or_default()
    }

    fn dispel_effects(&mut self, definition: &EffectDefinition) {
        self.dispel_calls += 1;
        registry::dispel(self, definition);
    }

    fn active_effects(&self) -> &ActiveEffects {
        &self.effects
    }

    fn active_effects_mut(&mut self) -> &mut ActiveEffects {
        &mut self.effects
    }
}

/// Hooks that count calls by name.
#[derive(Debug, Default)]
pub struct RecordingHooks {
    calls: Mutex<Vec<&'static str>>,
    deny: bool,
}

impl RecordingHooks {
    /// Hooks whose dynamic condition always fails.
    pub fn denying() -> Self {
        Self {
            calls: Mutex::default(),
            deny: true,
        }
    }

    pub fn count(&self, name: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|call| **call == name)
            .count()
    }

    fn record(&self, name: &'static str) {
        self.calls.lock().unwrap().push(name);
    }
}

impl EffectHooks for RecordingHooks {
    fn on_start(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner) {
        self.record("start");
    }

    fn on_end(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner) {
        self.record("end");
    }

    fn on_tick(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner, _dt: f64) {
        self.record("tick");
    }

    fn on_period_tick(&self, _effect: &EffectInstance, _owner: &mut dyn EffectOwner) {
        self.record("period_tick");
    }

    fn dynamic_condition(&self, _effect: &EffectInstance, _owner: &dyn EffectOwner) -> bool {
        !self.deny
    }
}
