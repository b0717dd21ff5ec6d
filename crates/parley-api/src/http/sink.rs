//! Fragment sink backed by the streaming response body.

use axum::body::Bytes;
use tokio::sync::mpsc;

use parley_core::chat::sink::FragmentSink;
use parley_types::error::TransportError;

/// Forwards fragments to the response body through a bounded channel.
///
/// The receiving half is the body stream; once the client goes away the body
/// is dropped and every further write fails.
pub struct ChannelSink {
    tx: mpsc::Sender<Bytes>,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<Bytes>) -> Self {
        Self { tx }
    }
}

impl FragmentSink for ChannelSink {
    async fn write(&mut self, fragment: &str) -> Result<(), TransportError> {
        self.tx
            .send(Bytes::copy_from_slice(fragment.as_bytes()))
            .await
            .map_err(|_| TransportError("response body closed".to_string()))
    }

    // Each body frame is handed to hyper as soon as it is received.
    async fn flush(&mut self) -> Result<(), TransportError> {
        if self.tx.is_closed() {
            return Err(TransportError("response body closed".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_write_forwards_bytes() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx);
        sink.write("hello ").await.unwrap();
        sink.flush().await.unwrap();
        assert_eq!(rx.recv().await.unwrap(), Bytes::from_static(b"hello "));
    }

    #[tokio::test]
    async fn test_closed_body_fails_writes() {
        let (tx, rx) = mpsc::channel(4);
        let mut sink = ChannelSink::new(tx);
        drop(rx);
        assert!(sink.write("lost").await.is_err());
        assert!(sink.flush().await.is_err());
    }
}
