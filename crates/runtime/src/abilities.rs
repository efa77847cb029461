//! Granted and running abilities of an ability component.
//!
//! Activation itself (targeting, costs, cooldowns) lives outside this crate;
//! the component only tracks which abilities may run and which are running,
//! so effects can grant, revoke and cancel them.

use effect_core::{Tag, TagContainer};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AbilitySet {
    granted: TagContainer,
    active: TagContainer,
}

impl AbilitySet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&mut self, ability: &Tag) {
        self.granted.insert(ability.clone());
    }

    /// Revokes a grant. A running instance of the ability is not interrupted.
    pub fn revoke(&mut self, ability: &Tag) {
        self.granted.remove(ability);
    }

    pub fn is_granted(&self, ability: &Tag) -> bool {
        self.granted.contains(ability)
    }

    pub fn is_active(&self, ability: &Tag) -> bool {
        self.active.contains(ability)
    }

    /// Marks a granted ability as running. Returns false if it is not granted.
    pub fn activate(&mut self, ability: &Tag) -> bool {
        if !self.is_granted(ability) {
            return false;
        }
        self.active.insert(ability.clone());
        true
    }

    /// Ends every running ability matching `query` and returns how many ended.
    pub fn end_matching(&mut self, query: &Tag) -> usize {
        let before = self.active.len();
        self.active = self
            .active
            .iter()
            .filter(|ability| !ability.matches(query))
            .cloned()
            .collect();
        before - self.active.len()
    }

    pub fn granted(&self) -> &TagContainer {
        &self.granted
    }

    pub fn active(&self) -> &TagContainer {
        &self.active
    }
}
