//! Crate-wide error kinds.
//!
//! Mirrors the error kinds of `logical_entanglement`, `quantum_zkp`, and
//! `crypto_adapter` from the original C core, collapsed into a single enum
//! (`thiserror`, as `nexus-core` and `rust/qcore_vcs` use for their own
//! error types) since every subsystem here shares one process.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("operation attempted before init")]
    NotInitialized,

    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("buffer too small, {required} bytes required")]
    BufferTooSmall { required: usize },

    #[error("entropy source failed")]
    EntropyFailure,

    #[error("internal primitive error: {0}")]
    Internal(String),

    #[error("key has expired")]
    Expired,

    #[error("dependency edge would create a cycle")]
    Cycle,

    #[error("entanglement verification detected tampering")]
    Tampered,
}

pub type CoreResult<T> = Result<T, CoreError>;

/// Tri-state outcome of a verification predicate (§7): adversarial
/// rejection is never an `Err` — only operational failure is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Accepted,
    Rejected,
}

impl VerifyOutcome {
    pub fn is_accepted(self) -> bool {
        matches!(self, VerifyOutcome::Accepted)
    }
}

impl From<bool> for VerifyOutcome {
    fn from(accepted: bool) -> Self {
        if accepted {
            VerifyOutcome::Accepted
        } else {
            VerifyOutcome::Rejected
        }
    }
}
