//! Autosave scheduling
//!
//! [`Autosave`] runs a periodic timer for the currently open document and
//! emits an [`AutosaveTick`] on a channel each period. The owner of the
//! [`DocumentStore`](crate::DocumentStore) receives ticks and passes them to
//! [`DocumentStore::apply_autosave`](crate::DocumentStore::apply_autosave),
//! which ignores ticks for a document that is no longer open.
//!
//! ```ignore
//! let (mut autosave, mut ticks) = Autosave::new(config.autosave_interval());
//! autosave.track(store.current_document().map(|doc| doc.id.as_str()));
//!
//! while let Some(tick) = ticks.recv().await {
//!     store.apply_autosave(&tick)?;
//! }
//! ```

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::debug;

/// Request to save the document the timer was started for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutosaveTick {
    pub document_id: String,
}

/// Timer task for one document, aborted when dropped
struct TimerGuard {
    document_id: String,
    handle: JoinHandle<()>,
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Periodic autosave scheduler
pub struct Autosave {
    interval: Duration,
    sender: mpsc::UnboundedSender<AutosaveTick>,
    timer: Option<TimerGuard>,
}

impl Autosave {
    /// Create a scheduler and the receiver its ticks arrive on
    ///
    /// A zero interval disables autosave.
    pub fn new(interval: Duration) -> (Self, mpsc::UnboundedReceiver<AutosaveTick>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let autosave = Self {
            interval,
            sender,
            timer: None,
        };
        (autosave, receiver)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn is_enabled(&self) -> bool {
        !self.interval.is_zero()
    }

    /// Document currently being autosaved
    pub fn tracked_document(&self) -> Option<&str> {
        self.timer.as_ref().map(|timer| timer.document_id.as_str())
    }

    /// Follow the current document
    ///
    /// Tracking the same document again keeps the running timer. Any other
    /// id, or `None`, stops the previous timer first. Must be called from
    /// within a Tokio runtime.
    pub fn track(&mut self, document_id: Option<&str>) {
        if self.tracked_document() == document_id {
            return;
        }

        self.stop();

        let Some(document_id) = document_id else {
            return;
        };
        if !self.is_enabled() {
            return;
        }

        let period = self.interval;
        let sender = self.sender.clone();
        let tick = AutosaveTick {
            document_id: document_id.to_string(),
        };

        let handle = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if sender.send(tick.clone()).is_err() {
                    break;
                }
            }
        });

        debug!("Autosave every {:?} for {}", period, document_id);
        self.timer = Some(TimerGuard {
            document_id: document_id.to_string(),
            handle,
        });
    }

    /// Stop the running timer, if any
    pub fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            debug!("Stopped autosave for {}", timer.document_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;
    use crate::storage::{DocumentStorage, MemoryStore};
    use crate::store::DocumentStore;
    use tokio::sync::mpsc::error::TryRecvError;
    use tokio::time::{sleep, timeout};

    const PERIOD: Duration = Duration::from_millis(30);

    async fn next_tick(ticks: &mut mpsc::UnboundedReceiver<AutosaveTick>) -> AutosaveTick {
        timeout(Duration::from_secs(2), ticks.recv())
            .await
            .expect("timed out waiting for tick")
            .expect("channel closed")
    }

    #[tokio::test]
    async fn test_ticks_for_tracked_document() {
        let (mut autosave, mut ticks) = Autosave::new(PERIOD);
        autosave.track(Some("doc-a"));

        assert_eq!(autosave.tracked_document(), Some("doc-a"));
        assert_eq!(next_tick(&mut ticks).await.document_id, "doc-a");
        assert_eq!(next_tick(&mut ticks).await.document_id, "doc-a");
    }

    #[tokio::test]
    async fn test_switching_documents_releases_old_timer() {
        let (mut autosave, mut ticks) = Autosave::new(PERIOD);
        autosave.track(Some("doc-a"));
        autosave.track(Some("doc-b"));

        for _ in 0..3 {
            assert_eq!(next_tick(&mut ticks).await.document_id, "doc-b");
        }
    }

    #[tokio::test]
    async fn test_tracking_none_stops_timer() {
        let (mut autosave, mut ticks) = Autosave::new(PERIOD);
        autosave.track(Some("doc-a"));
        autosave.track(None);

        assert_eq!(autosave.tracked_document(), None);
        sleep(PERIOD * 4).await;
        assert!(matches!(ticks.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_dropping_scheduler_stops_timer() {
        let (mut autosave, mut ticks) = Autosave::new(PERIOD);
        autosave.track(Some("doc-a"));
        drop(autosave);

        // Sender and timer are gone, so the channel closes without ticks
        let closed = timeout(Duration::from_secs(2), ticks.recv()).await.unwrap();
        assert!(closed.is_none());
    }

    #[tokio::test]
    async fn test_zero_interval_disables() {
        let (mut autosave, mut ticks) = Autosave::new(Duration::ZERO);
        assert!(!autosave.is_enabled());

        autosave.track(Some("doc-a"));
        assert_eq!(autosave.tracked_document(), None);
        sleep(Duration::from_millis(50)).await;
        assert!(matches!(ticks.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn test_autosave_saves_current_document() {
        let mut store = DocumentStore::new(DocumentStorage::new(MemoryStore::new()));
        let doc = store.create_new_document().unwrap();
        store.add_block(Block::paragraph("autosaved text")).unwrap();

        let (mut autosave, mut ticks) = Autosave::new(PERIOD);
        autosave.track(store.current_document().map(|doc| doc.id.as_str()));

        let tick = next_tick(&mut ticks).await;
        assert!(store.apply_autosave(&tick).unwrap());

        let stored = store.storage().get_document(&doc.id).unwrap();
        assert_eq!(stored.blocks.len(), 2);

        // A tick that arrives after the document was closed is discarded
        store.close_current_document().unwrap();
        autosave.track(store.current_document().map(|doc| doc.id.as_str()));
        assert!(!store.apply_autosave(&tick).unwrap());
    }
}
