/// Effect system constants and tunable parameters.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EffectConfig {
    /// Maximum number of instances an owner's registry holds at once.
    pub max_active_effects: usize,
}

impl EffectConfig {
    // ===== compile-time constants =====
    /// Version tag written into every serialized effect snapshot.
    pub const SNAPSHOT_VERSION: u16 = 1;
    /// Smallest period a periodic effect may use. Shorter periods are raised to this.
    pub const MIN_PERIOD: f64 = 0.01;
    /// Seconds a predicted effect may stay unconfirmed before it is reported overdue.
    pub const DEFAULT_CLIENT_GRACE_TIME: f64 = 1.0;

    // ===== runtime-tunable defaults =====
    pub const DEFAULT_MAX_ACTIVE_EFFECTS: usize = 64;

    pub fn new() -> Self {
        Self {
            max_active_effects: Self::DEFAULT_MAX_ACTIVE_EFFECTS,
        }
    }

    pub fn with_max_active_effects(max_active_effects: usize) -> Self {
        Self { max_active_effects }
    }
}

impl Default for EffectConfig {
    fn default() -> Self {
        Self::new()
    }
}
