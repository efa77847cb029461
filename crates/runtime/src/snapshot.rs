//! Rollback snapshots of a whole ability component and their digest.

use std::fmt;

use effect_core::{EffectId, EffectsSnapshot, SnapshotError, TagContainer};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::abilities::AbilitySet;
use crate::attributes::AttributeSet;

/// Everything needed to put a component back to the state it had after `step`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ComponentSnapshot {
    pub step: u64,
    pub clock: f64,
    pub next_id: EffectId,
    pub attributes: AttributeSet,
    pub tags: TagContainer,
    pub abilities: AbilitySet,
    pub effects: EffectsSnapshot,
}

impl ComponentSnapshot {
    pub fn encode(&self) -> Result<Vec<u8>, SnapshotError> {
        bincode::serialize(self).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, SnapshotError> {
        bincode::deserialize(bytes).map_err(|e| SnapshotError::Decode(e.to_string()))
    }

    /// SHA-256 over the bincode encoding.
    ///
    /// bincode output depends only on the value, so two components that went
    /// through the same steps produce the same digest.
    pub fn digest(&self) -> Result<StateDigest, SnapshotError> {
        let bytes = self.encode()?;
        Ok(StateDigest(Sha256::digest(&bytes).into()))
    }
}

/// Commitment to a component's full state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StateDigest(pub [u8; 32]);

impl StateDigest {
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for StateDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}
