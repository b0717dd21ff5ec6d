//! FragmentSink trait definition.

use parley_types::error::TransportError;

/// Destination for streamed reply fragments (the HTTP response body in
/// production).
///
/// The coordinator calls `flush` after every `write`; a fragment counts as
/// delivered only once both succeed.
pub trait FragmentSink: Send {
    fn write(
        &mut self,
        fragment: &str,
    ) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;

    fn flush(&mut self) -> impl std::future::Future<Output = Result<(), TransportError>> + Send;
}
