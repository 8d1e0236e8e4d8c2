//! Placement error types.

use thiserror::Error;

use storgrid_core::{AccessDenied, ProviderKind};

/// Errors that abort a placement attempt.
///
/// An unsatisfiable request is not an error: `Selector::select` returns
/// `Ok(None)`. `NoFeasibleSelection` exists for callers that want to
/// surface that outcome to an end user.
#[derive(Debug, Error)]
pub enum PlacementError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    /// Already-deployed replicas use provider kinds that must never mix.
    #[error(
        "internal consistency fault: resource '{resource}' is deployed with incompatible provider kinds {existing} and {found}"
    )]
    InternalConsistency {
        resource: String,
        existing: ProviderKind,
        found: ProviderKind,
    },

    #[error("insufficient eligible storage pools for requested replication")]
    NoFeasibleSelection,
}

pub type PlacementResult<T> = Result<T, PlacementError>;
