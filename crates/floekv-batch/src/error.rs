use crate::handler::HandlerError;
use std::fmt;
use thiserror::Error as ThisError;

///
/// BatchError
///
/// Runtime error surface of the mutation batch. Every failing operation
/// leaves the batch in its pre-call state; none of these are retried
/// internally.
///

#[derive(Debug, ThisError)]
pub enum BatchError {
    #[error("corrupt batch: {message}")]
    Corrupt { message: String },

    #[error("capacity exceeded: appending {len} bytes would exceed max_bytes {max_bytes}")]
    CapacityExceeded { len: usize, max_bytes: usize },

    #[error("entry too large for the wire format: {len} bytes (limit {limit})")]
    EntryTooLarge { len: usize, limit: usize },

    #[error("illegal state: {message}")]
    IllegalState { message: String },

    #[error("iteration handler failed: {0}")]
    Handler(#[from] HandlerError),
}

impl BatchError {
    /// Construct a corruption error for a malformed serialized batch.
    pub(crate) fn corrupt(message: impl Into<String>) -> Self {
        Self::Corrupt {
            message: message.into(),
        }
    }

    /// Construct an illegal-state error (save-point stack underflow).
    pub(crate) fn illegal_state(message: impl Into<String>) -> Self {
        Self::IllegalState {
            message: message.into(),
        }
    }

    /// Return a stable error kind independent of message text.
    #[must_use]
    pub const fn kind(&self) -> BatchErrorKind {
        match self {
            Self::Corrupt { .. } => BatchErrorKind::Corrupt,
            Self::CapacityExceeded { .. } => BatchErrorKind::CapacityExceeded,
            Self::EntryTooLarge { .. } => BatchErrorKind::EntryTooLarge,
            Self::IllegalState { .. } => BatchErrorKind::IllegalState,
            Self::Handler(_) => BatchErrorKind::Handler,
        }
    }
}

///
/// BatchErrorKind
///
/// Stable error-kind taxonomy for batch failures.
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BatchErrorKind {
    Corrupt,
    CapacityExceeded,
    EntryTooLarge,
    IllegalState,
    Handler,
}

impl BatchErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Corrupt => "corrupt",
            Self::CapacityExceeded => "capacity_exceeded",
            Self::EntryTooLarge => "entry_too_large",
            Self::IllegalState => "illegal_state",
            Self::Handler => "handler",
        }
    }
}

impl fmt::Display for BatchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
