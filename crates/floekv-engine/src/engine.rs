use crate::merge::MergeError;
use floekv_batch::{entry::EntryKind, error::BatchError};
use std::fmt;
use thiserror::Error as ThisError;

///
/// ApplyError
///
/// Failure applying a serialized batch to an engine. Application is all or
/// nothing: on any error the engine's visible state is unchanged.
///

#[derive(Debug, ThisError)]
pub enum ApplyError {
    #[error("corrupt batch payload: {0}")]
    Corrupt(BatchError),

    #[error("unsupported entry kind for this engine: {kind}")]
    Unsupported { kind: EntryKind },

    #[error("merge operator failed: {0}")]
    Merge(#[from] MergeError),
}

impl ApplyError {
    /// Return a stable error kind independent of message text.
    #[must_use]
    pub const fn kind(&self) -> ApplyErrorKind {
        match self {
            Self::Corrupt(_) => ApplyErrorKind::Corrupt,
            Self::Unsupported { .. } => ApplyErrorKind::Unsupported,
            Self::Merge(_) => ApplyErrorKind::Merge,
        }
    }
}

///
/// ApplyErrorKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApplyErrorKind {
    Corrupt,
    Unsupported,
    Merge,
}

impl ApplyErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Corrupt => "corrupt",
            Self::Unsupported => "unsupported",
            Self::Merge => "merge",
        }
    }
}

impl fmt::Display for ApplyErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

///
/// StorageEngine
///
/// Narrow collaborator interface consumed by batch producers: hand over a
/// serialized batch and the engine applies every entry as one indivisible
/// unit, writing only the WAL-eligible prefix to its durability log.
///

pub trait StorageEngine {
    fn apply_atomically(&mut self, serialized: &[u8]) -> Result<(), ApplyError>;
}
