//! Decode source fed from an in-process text stream
//!
//! Used for keyboard-wedge scanners (decoded text typed on stdin) and for
//! tests. Text is forwarded only while the source is active; anything that
//! queued up while stopped is discarded on the next start.

use super::{DecodeSink, DecodeSource};
use crate::error::DecoderError;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::debug;

pub struct ChannelDecodeSource {
    feed: Arc<Mutex<mpsc::Receiver<String>>>,
    cancel: Option<CancellationToken>,
}

impl ChannelDecodeSource {
    pub fn new(feed: mpsc::Receiver<String>) -> Self {
        Self {
            feed: Arc::new(Mutex::new(feed)),
            cancel: None,
        }
    }

    /// Create a source together with the sender that feeds it
    pub fn channel(capacity: usize) -> (mpsc::Sender<String>, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (tx, Self::new(rx))
    }
}

impl DecodeSource for ChannelDecodeSource {
    fn start(&mut self, sink: DecodeSink) -> Result<(), DecoderError> {
        self.stop();

        let cancel = CancellationToken::new();
        self.cancel = Some(cancel.clone());
        let feed = Arc::clone(&self.feed);

        tokio::spawn(async move {
            let mut feed = feed.lock().await;

            // Discard text that arrived while stopped
            let mut discarded = 0usize;
            while feed.try_recv().is_ok() {
                discarded += 1;
            }
            if discarded > 0 {
                debug!(discarded, epoch = sink.epoch(), "Dropped text queued while stopped");
            }

            loop {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => break,
                    text = feed.recv() => match text {
                        Some(text) => {
                            if !sink.deliver(text).await {
                                break;
                            }
                        }
                        None => {
                            debug!(epoch = sink.epoch(), "Decode feed closed");
                            break;
                        }
                    },
                }
            }
        });

        Ok(())
    }

    fn stop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }

    fn is_active(&self) -> bool {
        self.cancel.is_some()
    }
}

impl Drop for ChannelDecodeSource {
    fn drop(&mut self) {
        self.stop();
    }
}
