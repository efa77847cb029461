//! Unified error type surfaced by the effect runtime.
//!
//! Wraps failures from effect-core, repositories and configuration loading so
//! callers can bubble them up with consistent context.

use effect_core::{
    EffectError, EffectId, ErrorSeverity, InitializeError, RegistryError, SnapshotError,
};
use thiserror::Error;

pub use crate::repository::RepositoryError;

pub type Result<T> = std::result::Result<T, RuntimeError>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error(transparent)]
    Initialize(#[from] InitializeError),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error("invalid runtime configuration")]
    Config(#[source] anyhow::Error),

    #[error("effect {id} is not active")]
    UnknownEffect { id: EffectId },

    #[error("no snapshot recorded for step {step}")]
    MissingSnapshot { step: u64 },
}

impl EffectError for RuntimeError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Initialize(e) => e.severity(),
            Self::Registry(e) => e.severity(),
            Self::Snapshot(e) => e.severity(),
            Self::Repository(_) => ErrorSeverity::Recoverable,
            Self::Config(_) | Self::UnknownEffect { .. } | Self::MissingSnapshot { .. } => {
                ErrorSeverity::Validation
            }
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Initialize(e) => e.error_code(),
            Self::Registry(e) => e.error_code(),
            Self::Snapshot(e) => e.error_code(),
            Self::Repository(_) => "RUNTIME_REPOSITORY",
            Self::Config(_) => "RUNTIME_CONFIG",
            Self::UnknownEffect { .. } => "RUNTIME_UNKNOWN_EFFECT",
            Self::MissingSnapshot { .. } => "RUNTIME_MISSING_SNAPSHOT",
        }
    }
}
