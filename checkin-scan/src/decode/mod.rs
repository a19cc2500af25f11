//! Decode source adapters
//!
//! A decode source owns the camera and turns frames into decoded text. The
//! coordinator starts it with a fresh [`DecodeSink`] each time scanning
//! resumes; every sink is stamped with a scanner epoch so that events which
//! arrive after `stop()` (camera teardown is not instantaneous) can be told
//! apart from live ones and dropped.

pub mod channel;
pub mod command;

use crate::error::DecoderError;
use tokio::sync::mpsc;

pub use channel::ChannelDecodeSource;
pub use command::CommandDecodeSource;

/// Event delivered from a decode source to the coordinator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeEvent {
    /// Text recognised in a frame (raw, untrimmed)
    Decoded { epoch: u64, text: String },
    /// Source stopped on its own (device lost, decoder exited)
    Failed { epoch: u64, message: String },
}

impl DecodeEvent {
    pub fn epoch(&self) -> u64 {
        match self {
            DecodeEvent::Decoded { epoch, .. } | DecodeEvent::Failed { epoch, .. } => *epoch,
        }
    }
}

/// Delivery handle handed to a decode source on start
#[derive(Debug, Clone)]
pub struct DecodeSink {
    tx: mpsc::Sender<DecodeEvent>,
    epoch: u64,
}

impl DecodeSink {
    pub fn new(tx: mpsc::Sender<DecodeEvent>, epoch: u64) -> Self {
        Self { tx, epoch }
    }

    /// Scanner run this sink belongs to
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Deliver decoded text; `false` once the coordinator has gone away
    pub async fn deliver(&self, text: impl Into<String>) -> bool {
        self.tx
            .send(DecodeEvent::Decoded {
                epoch: self.epoch,
                text: text.into(),
            })
            .await
            .is_ok()
    }

    /// Deliver without waiting; frames are dropped when the queue is full
    pub fn try_deliver(&self, text: impl Into<String>) -> bool {
        self.tx
            .try_send(DecodeEvent::Decoded {
                epoch: self.epoch,
                text: text.into(),
            })
            .is_ok()
    }

    /// Report that the source stopped on its own
    pub async fn fail(&self, message: impl Into<String>) {
        let _ = self
            .tx
            .send(DecodeEvent::Failed {
                epoch: self.epoch,
                message: message.into(),
            })
            .await;
    }
}

/// Camera + decoder capability
///
/// `start` must not block; production of events happens on background tasks.
/// After `stop` returns no new events may be produced for the stopped sink,
/// though events already queued may still arrive.
pub trait DecodeSource: Send {
    /// Acquire the camera and begin delivering decode events
    fn start(&mut self, sink: DecodeSink) -> Result<(), DecoderError>;

    /// Release the camera; idempotent
    fn stop(&mut self);

    /// True between a successful `start` and the next `stop`
    fn is_active(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_sink_stamps_epoch() {
        let (tx, mut rx) = mpsc::channel(4);
        let sink = DecodeSink::new(tx, 7);

        assert!(sink.deliver("abc123").await);
        sink.fail("camera lost").await;

        assert_eq!(
            rx.recv().await,
            Some(DecodeEvent::Decoded {
                epoch: 7,
                text: "abc123".to_string()
            })
        );
        let failed = rx.recv().await.unwrap();
        assert_eq!(failed.epoch(), 7);
    }

    #[tokio::test]
    async fn test_deliver_reports_closed_receiver() {
        let (tx, rx) = mpsc::channel(1);
        let sink = DecodeSink::new(tx, 1);
        drop(rx);
        assert!(!sink.deliver("abc").await);
        assert!(!sink.try_deliver("abc"));
    }

    #[test]
    fn test_try_deliver_drops_when_full() {
        let (tx, _rx) = mpsc::channel(1);
        let sink = DecodeSink::new(tx, 1);
        assert!(sink.try_deliver("first"));
        assert!(!sink.try_deliver("second"));
    }
}
