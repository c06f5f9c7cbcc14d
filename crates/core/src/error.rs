//! Errors raised by catalogue, reservation and account rules.

use thiserror::Error;

pub type DomainResult<T> = Result<T, DomainError>;

/// A business rule refused the operation.
///
/// The payload is the message shown to the caller, so it must never carry
/// secrets. Token and login failures are `AuthError` in `innkeep-auth`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Caller input is unusable as given: empty hotel name, check-out before
    /// check-in, a password that is too short.
    #[error("rejected input: {0}")]
    Validation(String),

    /// Internally inconsistent state, e.g. a booking priced against the
    /// wrong hotel or a poisoned store lock.
    #[error("broken invariant: {0}")]
    InvariantViolation(String),

    /// A path segment that should be a hotel, booking or user id is not.
    #[error("bad id: {0}")]
    InvalidId(String),

    #[error("no such record")]
    NotFound,

    /// Valid request that clashes with what is stored: a taken identifier,
    /// a full night, an already-cancelled booking.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invariant(msg: impl Into<String>) -> Self {
        Self::InvariantViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }
}
