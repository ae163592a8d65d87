//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, local failures (validation, lifecycle
/// invariants). Network and gateway failures belong to the gateway layer.
/// None of these ever reach the network: an operation rejected here leaves
/// local state unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A line quantity was zero or negative.
    #[error("invalid quantity: {0} (must be a positive integer)")]
    InvalidQuantity(i64),

    /// A positional line reference did not exist.
    #[error("index {index} out of range for {len} line(s)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Attempted mutation of an entity in a terminal state.
    #[error("immutable state: {0}")]
    ImmutableState(String),

    /// Finalize requested on a header that is already finalized.
    #[error("adjustment {0} is already finalized")]
    AlreadyFinalized(u64),

    /// A value failed validation (e.g. malformed input).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found (domain-level).
    #[error("not found")]
    NotFound,

    /// No signed-in user is available to act on behalf of.
    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn immutable(msg: impl Into<String>) -> Self {
        Self::ImmutableState(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn not_found() -> Self {
        Self::NotFound
    }

    /// Whether this error came from local input validation (never a network call).
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuantity(_) | Self::IndexOutOfRange { .. } | Self::Validation(_)
        )
    }
}
