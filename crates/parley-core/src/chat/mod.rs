//! Chat turn coordination and read paths.
//!
//! - `TurnCoordinator`: runs one turn from validation to commit
//! - `ConversationCatalog`: per-user conversation summaries
//! - `ChatService`: the façade the transport layer talks to
//! - `FragmentSink`: where streamed reply fragments are written

pub mod catalog;
pub mod coordinator;
pub mod service;
pub mod sink;

use parley_types::error::ValidationError;

/// Reject an empty required field, naming it by its wire name.
pub(crate) fn require(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(())
    }
}
