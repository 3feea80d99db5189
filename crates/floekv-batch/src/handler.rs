use crate::entry::Entry;
use std::error::Error as StdError;
use thiserror::Error as ThisError;

///
/// HandlerError
///
/// Error signaled by a replay callback. Aborts the iteration in progress
/// and propagates to the caller of `iterate`, preserving the original
/// cause when one was supplied.
///

#[derive(Debug, ThisError)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl HandlerError {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    #[must_use]
    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

///
/// Handler
///
/// Replay callback for `MutationBatch::iterate`. Entries are dispatched in
/// insertion order, one call per entry; `should_continue` is polled after
/// each dispatched entry and halts iteration early, without error, when it
/// returns false.
///

pub trait Handler {
    fn handle(&mut self, entry: Entry<'_>) -> Result<(), HandlerError>;

    fn should_continue(&self) -> bool {
        true
    }
}
