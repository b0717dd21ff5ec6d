use thiserror::Error;

/// A required request field was missing or empty.
///
/// Raised before any side effect; never retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),
}

/// Errors from transcript store operations (used by the port in parley-core).
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query error: {0}")]
    Query(String),

    #[error("corrupt conversation document: {0}")]
    Decode(String),
}

/// A write to the output sink failed, usually because the client went away.
#[derive(Debug, Error)]
#[error("transport error: {0}")]
pub struct TransportError(pub String);

/// Errors surfaced by chat service operations before any reply bytes exist.
///
/// Once a turn has started streaming, failures are reported through the
/// stream itself and summarised in the turn outcome instead.
#[derive(Debug, Error)]
pub enum ChatError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
