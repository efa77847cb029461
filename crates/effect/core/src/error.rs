//! Common error infrastructure for effect-core.
//!
//! Lifecycle operations never fail: gate violations and repeated
//! finalization are ordinary state transitions. The errors here cover the
//! few places where a caller handed the core something it cannot work with.

use crate::types::EffectId;

/// How a caller should react to an error.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum ErrorSeverity {
    /// Retrying after the owner frees room may succeed.
    Recoverable,
    /// The request itself is wrong.
    Validation,
    /// Owner and registry disagree.
    Internal,
}

pub trait EffectError: core::fmt::Display + core::fmt::Debug {
    fn severity(&self) -> ErrorSeverity;

    /// Stable identifier of the variant, for logs and telemetry.
    fn error_code(&self) -> &'static str;
}

/// Raised when an instance cannot be initialized.
///
/// The instance stays inert: ticking it is a no-op and it never starts.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum InitializeError {
    #[error("effect {id} has no owner to initialize against")]
    MissingOwner { id: EffectId },
}

impl EffectError for InitializeError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::MissingOwner { .. } => "EFFECT_MISSING_OWNER",
        }
    }
}

/// Errors raised by the active-effect registry.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("active effect registry is full (max: {max})")]
    Full { max: usize },

    #[error("effect {id} is already registered")]
    DuplicateId { id: EffectId },

    #[error("effect {id} is not registered")]
    NotFound { id: EffectId },
}

impl EffectError for RegistryError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Full { .. } => ErrorSeverity::Recoverable,
            Self::NotFound { .. } => ErrorSeverity::Validation,
            Self::DuplicateId { .. } => ErrorSeverity::Internal,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Full { .. } => "REGISTRY_FULL",
            Self::DuplicateId { .. } => "REGISTRY_DUPLICATE_ID",
            Self::NotFound { .. } => "REGISTRY_NOT_FOUND",
        }
    }
}

/// Errors raised while encoding or decoding effect snapshots.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SnapshotError {
    #[error("failed to encode effect snapshot: {0}")]
    Encode(String),

    #[error("failed to decode effect snapshot: {0}")]
    Decode(String),

    #[error("unsupported snapshot version {found} (expected {expected})")]
    UnsupportedVersion { found: u16, expected: u16 },
}

impl EffectError for SnapshotError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Encode(_) => ErrorSeverity::Internal,
            Self::Decode(_) | Self::UnsupportedVersion { .. } => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Encode(_) => "SNAPSHOT_ENCODE",
            Self::Decode(_) => "SNAPSHOT_DECODE",
            Self::UnsupportedVersion { .. } => "SNAPSHOT_UNSUPPORTED_VERSION",
        }
    }
}
