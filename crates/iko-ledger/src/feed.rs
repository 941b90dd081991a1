//! Bounded push feed of admitted transactions.
//!
//! Every subscriber gets its own view of a `tokio::sync::broadcast` ring.
//! Publishing never blocks the writer. A subscriber that falls more than
//! `capacity` transactions behind loses the oldest undelivered ones
//! (drop-oldest); the loss is counted on the [`Subscription`] and logged.
//! `broadcast` rounds the capacity up to a power of two.

use tokio::sync::broadcast::{self, error::RecvError, error::TryRecvError};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::{Stream, StreamExt};
use tracing::warn;

use crate::transaction::Transaction;

/// Default per-subscriber buffer.
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

/// Publisher side of the feed, owned by a chain log.
#[derive(Debug)]
pub struct TxFeed {
    sender: Option<broadcast::Sender<Transaction>>,
    capacity: usize,
}

impl TxFeed {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender: Some(sender),
            capacity,
        }
    }

    /// Deliver `tx` to every live subscriber. Never blocks.
    pub fn publish(&self, tx: &Transaction) {
        if let Some(sender) = &self.sender {
            // No receivers is not an error: nobody is listening yet.
            let _ = sender.send(tx.clone());
        }
    }

    pub fn subscribe(&self) -> Subscription {
        match &self.sender {
            Some(sender) => Subscription::new(sender.subscribe()),
            None => {
                let (sender, receiver) = broadcast::channel(1);
                drop(sender);
                Subscription::new(receiver)
            }
        }
    }

    /// End every subscription once its buffered transactions are drained.
    pub fn close(&mut self) {
        self.sender = None;
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_none()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender
            .as_ref()
            .map(broadcast::Sender::receiver_count)
            .unwrap_or(0)
    }
}

impl Default for TxFeed {
    fn default() -> Self {
        Self::new(DEFAULT_FEED_CAPACITY)
    }
}

/// One subscriber's view of the feed.
///
/// Yields transactions in admission order and ends (`None`) after the log
/// is closed and the buffer is drained.
#[derive(Debug)]
pub struct Subscription {
    receiver: broadcast::Receiver<Transaction>,
    dropped: u64,
}

impl Subscription {
    fn new(receiver: broadcast::Receiver<Transaction>) -> Self {
        Self {
            receiver,
            dropped: 0,
        }
    }

    /// Wait for the next transaction.
    pub async fn next(&mut self) -> Option<Transaction> {
        loop {
            match self.receiver.recv().await {
                Ok(tx) => return Some(tx),
                Err(RecvError::Lagged(n)) => self.record_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Next buffered transaction without waiting.
    pub fn try_next(&mut self) -> Option<Transaction> {
        loop {
            match self.receiver.try_recv() {
                Ok(tx) => return Some(tx),
                Err(TryRecvError::Lagged(n)) => self.record_lag(n),
                Err(TryRecvError::Empty | TryRecvError::Closed) => return None,
            }
        }
    }

    /// Block the current thread until the next transaction.
    ///
    /// Panics if called from within an async runtime; use [`Self::next`].
    pub fn blocking_next(&mut self) -> Option<Transaction> {
        loop {
            match self.receiver.blocking_recv() {
                Ok(tx) => return Some(tx),
                Err(RecvError::Lagged(n)) => self.record_lag(n),
                Err(RecvError::Closed) => return None,
            }
        }
    }

    /// Transactions lost because this subscriber fell behind.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Adapt into a `Stream`. Losses are logged but no longer counted.
    pub fn into_stream(self) -> impl Stream<Item = Transaction> + Send + Unpin {
        BroadcastStream::new(self.receiver).filter_map(|item| match item {
            Ok(tx) => Some(tx),
            Err(BroadcastStreamRecvError::Lagged(n)) => {
                warn!(dropped = n, "tx subscription lagged; oldest transactions dropped");
                None
            }
        })
    }

    fn record_lag(&mut self, n: u64) {
        self.dropped += n;
        warn!(
            dropped = n,
            total_dropped = self.dropped,
            "tx subscription lagged; oldest transactions dropped"
        );
    }
}
